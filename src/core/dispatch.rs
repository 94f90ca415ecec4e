//! # Procedure Dispatch Module / 过程分发模块
//!
//! This module late-binds a dataset row to a named test procedure. The
//! embedding application registers its procedures in a [`ProcedureRegistry`]
//! at startup, keyed by name and parameter count; the execution engine
//! resolves the matching entry once per dataset and then invokes it once per
//! row, classifying every invocation failure into a [`RowOutcome`] instead of
//! letting it escape.
//!
//! 此模块将数据集行延迟绑定到命名的测试过程。
//! 嵌入方应用在启动时将其过程注册到 [`ProcedureRegistry`] 中，
//! 以名称和参数个数为键；执行引擎为每个数据集解析一次匹配的条目，
//! 然后逐行调用它，将每个调用失败归类为 [`RowOutcome`] 而不任其逃逸。

use crate::core::models::RowOutcome;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};

/// The target context a procedure runs against.
///
/// The trait's single method models the optional diagnostic-capture
/// capability: it is invoked exactly once per row whose procedure signalled a
/// failure, fire-and-forget, so an implementation can grab a screenshot or
/// dump session state at the moment of the failure. The default body does
/// nothing, which is the correct behavior for fixtures without diagnostics.
///
/// 过程运行所针对的目标上下文。
///
/// 该 trait 的唯一方法建模了可选的诊断捕获能力：对于过程发出失败信号的
/// 每一行，它恰好被调用一次，即发即弃，因此实现可以在失败发生的瞬间
/// 抓取屏幕截图或转储会话状态。默认实现什么都不做，
/// 这对没有诊断能力的固件是正确的行为。
pub trait Fixture {
    /// Captures failure diagnostics. Called once per failed row.
    /// 捕获失败诊断。每个失败的行调用一次。
    fn capture_diagnostics(&mut self) {}
}

/// A registered procedure: binds the fixture and one row of string cells.
/// 已注册的过程：绑定固件和一行字符串单元格。
pub type ProcedureFn<F> =
    Arc<dyn Fn(&mut F, &[String]) -> Result<(), InvokeError> + Send + Sync>;

/// What a registered procedure can signal besides running to completion.
///
/// `Failed` is the common case: the procedure's own assertion or business
/// check did not hold. The other two variants let an adapter refuse an
/// invocation before doing any work.
///
/// 已注册过程除正常完成外可以发出的信号。
///
/// `Failed` 是常见情况：过程自身的断言或业务检查不成立。
/// 另外两个变体允许适配器在做任何工作之前拒绝一次调用。
#[derive(Debug, Error)]
pub enum InvokeError {
    /// A cell could not be bound to the parameter it targets.
    /// 某个单元格无法绑定到其目标参数。
    #[error("{0}")]
    BadArgument(String),
    /// The fixture refused access for this invocation.
    /// 固件拒绝了这次调用的访问。
    #[error("{0}")]
    AccessDenied(String),
    /// The procedure itself failed; the original cause is kept.
    /// 过程自身失败；保留原始原因。
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl InvokeError {
    /// Shorthand for [`InvokeError::BadArgument`].
    pub fn bad_argument(detail: impl Into<String>) -> Self {
        InvokeError::BadArgument(detail.into())
    }

    /// Shorthand for [`InvokeError::AccessDenied`].
    pub fn access_denied(detail: impl Into<String>) -> Self {
        InvokeError::AccessDenied(detail.into())
    }
}

/// Why a `(name, arity)` pair could not be resolved to a procedure.
/// Both variants are terminal for the whole run: they indicate a structural
/// mismatch between the dataset width and the registered test surface, not a
/// per-row problem.
///
/// `(名称, 参数个数)` 对无法解析为过程的原因。
/// 两个变体对整个运行而言都是终止性的：它们表明数据集宽度与已注册的
/// 测试表面之间存在结构性不匹配，而不是某一行的问题。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// No entry matches the name and parameter count.
    /// 没有条目匹配该名称和参数个数。
    #[error("the procedure name ('{name}') or the number of parameters ({arity}) are wrong")]
    NotFound {
        /// The requested procedure name / 请求的过程名称
        name: String,
        /// The requested parameter count / 请求的参数个数
        arity: usize,
    },
    /// A matching entry exists but has been access-restricted.
    /// 存在匹配条目但其访问已被限制。
    #[error("access to the procedure '{name}' is restricted")]
    AccessDenied {
        /// The requested procedure name / 请求的过程名称
        name: String,
    },
}

struct Entry<F> {
    callable: ProcedureFn<F>,
    restricted: bool,
}

/// The registration table mapping `(name, arity)` to a callable procedure.
///
/// Built by the embedding application at startup and consulted by the
/// execution engine once per run. Every parameter of every procedure is a
/// string cell; a dataset with three columns resolves only against a
/// three-parameter entry of the requested name.
///
/// 将 `(名称, 参数个数)` 映射到可调用过程的注册表。
///
/// 由嵌入方应用在启动时构建，执行引擎每次运行查询一次。
/// 每个过程的每个参数都是一个字符串单元格；三列的数据集只会解析到
/// 所请求名称的三参数条目。
pub struct ProcedureRegistry<F> {
    procedures: HashMap<(String, usize), Entry<F>>,
}

impl<F> ProcedureRegistry<F> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            procedures: HashMap::new(),
        }
    }

    /// Installs a procedure under `name` with `arity` string parameters.
    /// Registering the same `(name, arity)` pair again replaces the previous
    /// entry and clears any access restriction on it.
    ///
    /// The error type only has to convert into [`InvokeError`], so a
    /// procedure body is free to use `anyhow::bail!` and `?` directly.
    ///
    /// 以 `name` 和 `arity` 个字符串参数安装一个过程。
    /// 再次注册相同的 `(名称, 参数个数)` 对会替换之前的条目，
    /// 并清除其上的任何访问限制。
    ///
    /// 错误类型只需能转换为 [`InvokeError`]，
    /// 因此过程体可以直接使用 `anyhow::bail!` 和 `?`。
    pub fn register<E>(
        &mut self,
        name: impl Into<String>,
        arity: usize,
        callable: impl Fn(&mut F, &[String]) -> Result<(), E> + Send + Sync + 'static,
    ) where
        E: Into<InvokeError>,
    {
        self.procedures.insert(
            (name.into(), arity),
            Entry {
                callable: Arc::new(move |fixture, cells| {
                    callable(fixture, cells).map_err(Into::into)
                }),
                restricted: false,
            },
        );
    }

    /// Marks an entry access-restricted without removing it, so a quarantined
    /// procedure stays visible in the registry but can no longer be resolved.
    /// Returns `false` when no such entry exists.
    ///
    /// 将条目标记为访问受限而不移除它，这样被隔离的过程在注册表中
    /// 仍然可见但不能再被解析。当条目不存在时返回 `false`。
    pub fn restrict(&mut self, name: &str, arity: usize) -> bool {
        match self.procedures.get_mut(&(name.to_owned(), arity)) {
            Some(entry) => {
                entry.restricted = true;
                true
            }
            None => false,
        }
    }

    /// Returns `true` when an entry exists for the pair, restricted or not.
    pub fn contains(&self, name: &str, arity: usize) -> bool {
        self.procedures.contains_key(&(name.to_owned(), arity))
    }

    /// The number of registered entries.
    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    /// Returns `true` when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }

    /// Resolves the procedure registered under exactly `(name, arity)`.
    ///
    /// The returned [`ProcedureRef`] holds its own handle to the callable, so
    /// it stays valid for the whole run and can be reused across all rows.
    ///
    /// 解析恰好注册在 `(名称, 参数个数)` 下的过程。
    ///
    /// 返回的 [`ProcedureRef`] 持有可调用对象的独立句柄，
    /// 因此在整个运行期间保持有效，并可在所有行之间复用。
    pub fn resolve(&self, name: &str, arity: usize) -> Result<ProcedureRef<F>, ResolutionError> {
        match self.procedures.get(&(name.to_owned(), arity)) {
            None => {
                error!(
                    procedure = name,
                    arity, "the procedure name or the number of parameters are wrong"
                );
                Err(ResolutionError::NotFound {
                    name: name.to_owned(),
                    arity,
                })
            }
            Some(entry) if entry.restricted => {
                error!(procedure = name, "access to the procedure is restricted");
                Err(ResolutionError::AccessDenied {
                    name: name.to_owned(),
                })
            }
            Some(entry) => Ok(ProcedureRef {
                name: name.to_owned(),
                arity,
                callable: Arc::clone(&entry.callable),
            }),
        }
    }
}

impl<F> Default for ProcedureRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> fmt::Debug for ProcedureRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcedureRegistry")
            .field("procedures", &self.procedures.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// A resolved procedure, ready to be invoked once per dataset row.
/// 已解析的过程，准备好按数据集行逐一调用。
pub struct ProcedureRef<F> {
    name: String,
    arity: usize,
    callable: ProcedureFn<F>,
}

impl<F> ProcedureRef<F> {
    /// The name the procedure was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parameter count the procedure was registered with.
    pub fn arity(&self) -> usize {
        self.arity
    }
}

impl<F: Fixture> ProcedureRef<F> {
    /// Invokes the procedure for one row, binding `cells` positionally.
    ///
    /// Every failure class is converted to a [`RowOutcome::Failure`] and
    /// never propagated as a fault:
    ///
    /// - an argument-binding mismatch names the procedure;
    /// - an access refusal names the procedure;
    /// - a failure signalled by the procedure itself (an `Err` or a caught
    ///   panic, e.g. a failed assertion) is wrapped as
    ///   `"Error in row {row_index} of {row_total}: …"`, and the fixture's
    ///   diagnostic-capture hook fires exactly once before returning.
    ///
    /// 为一行调用该过程，将 `cells` 按位置绑定。
    ///
    /// 每一类失败都会转换为 [`RowOutcome::Failure`]，绝不作为故障传播：
    ///
    /// - 参数绑定不匹配时，消息指明过程名称；
    /// - 访问被拒绝时，消息指明过程名称；
    /// - 过程自身发出的失败（`Err` 或被捕获的 panic，例如失败的断言）
    ///   被包装为 `"Error in row {row_index} of {row_total}: …"`，
    ///   并且固件的诊断捕获钩子在返回前恰好触发一次。
    pub fn invoke(
        &self,
        fixture: &mut F,
        cells: &[String],
        row_index: usize,
        row_total: usize,
    ) -> RowOutcome {
        if cells.len() != self.arity {
            warn!(
                procedure = %self.name,
                expected = self.arity,
                got = cells.len(),
                "illegal argument invoking the procedure"
            );
            return RowOutcome::failure(format!(
                "illegal argument invoking the procedure '{}': expected {} arguments, got {}",
                self.name,
                self.arity,
                cells.len()
            ));
        }

        let invocation =
            panic::catch_unwind(AssertUnwindSafe(|| (self.callable)(&mut *fixture, cells)));

        match invocation {
            Ok(Ok(())) => RowOutcome::Success,
            Ok(Err(InvokeError::BadArgument(detail))) => {
                warn!(procedure = %self.name, %detail, "illegal argument invoking the procedure");
                RowOutcome::failure(format!(
                    "illegal argument invoking the procedure '{}': {detail}",
                    self.name
                ))
            }
            Ok(Err(InvokeError::AccessDenied(detail))) => {
                warn!(procedure = %self.name, %detail, "illegal access invoking the procedure");
                RowOutcome::failure(format!(
                    "illegal access invoking the procedure '{}': {detail}",
                    self.name
                ))
            }
            Ok(Err(InvokeError::Failed(cause))) => {
                self.row_failure(fixture, row_index, row_total, cause.to_string())
            }
            Err(payload) => {
                self.row_failure(fixture, row_index, row_total, panic_text(payload))
            }
        }
    }

    /// Records an underlying-procedure failure: fires the diagnostic-capture
    /// hook once and wraps the original cause with the row position.
    fn row_failure(
        &self,
        fixture: &mut F,
        row_index: usize,
        row_total: usize,
        cause: String,
    ) -> RowOutcome {
        warn!(
            procedure = %self.name,
            row_index,
            row_total,
            %cause,
            "error executing the procedure for this row"
        );
        // Fire-and-forget: a faulty diagnostic hook must not disturb the
        // row's recorded outcome.
        let _ = panic::catch_unwind(AssertUnwindSafe(|| fixture.capture_diagnostics()));
        RowOutcome::failure(format!("Error in row {row_index} of {row_total}: {cause}"))
    }
}

impl<F> Clone for ProcedureRef<F> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            arity: self.arity,
            callable: Arc::clone(&self.callable),
        }
    }
}

impl<F> fmt::Debug for ProcedureRef<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcedureRef")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Renders a caught panic payload as text, favoring the common string forms.
fn panic_text(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "the procedure panicked".to_string()
    }
}
