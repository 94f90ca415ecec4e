//! # Data Models Module / 数据模型模块
//!
//! This module defines the core data structures used throughout the table
//! runner. It includes the tagged outcome of a single row invocation and the
//! aggregated report an execution run hands back to its caller.
//!
//! 此模块定义了整个表格运行器中使用的核心数据结构。
//! 它包括单行调用的标记结果，以及一次执行运行交还给调用方的聚合报告。

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};

/// The result of executing one dataset row.
/// Failures carry a human-readable message; for failures raised by the
/// invoked procedure itself the message is prefixed with the row's 1-based
/// index and the total row count.
///
/// 执行一个数据集行的结果。
/// 失败携带可读的消息；对于被调用过程自身引发的失败，
/// 消息以该行从 1 开始的索引和总行数为前缀。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RowOutcome {
    /// The procedure ran to completion for this row.
    /// 该行的过程运行完成。
    Success,
    /// The procedure could not be bound or signalled a failure for this row.
    /// 该行的过程无法绑定或发出了失败信号。
    Failure {
        /// Human-readable description of the failure / 失败的可读描述
        message: String,
    },
}

impl RowOutcome {
    /// Creates a failure outcome from any message.
    pub fn failure(message: impl Into<String>) -> Self {
        RowOutcome::Failure {
            message: message.into(),
        }
    }

    /// Returns `true` for a successful row.
    pub fn is_success(&self) -> bool {
        matches!(self, RowOutcome::Success)
    }

    /// Returns `true` for a failed row.
    pub fn is_failure(&self) -> bool {
        matches!(self, RowOutcome::Failure { .. })
    }

    /// The failure message, if any. Returns `None` for a successful row.
    /// 失败消息（如果有）。成功的行返回 `None`。
    pub fn message(&self) -> Option<&str> {
        match self {
            RowOutcome::Success => None,
            RowOutcome::Failure { message } => Some(message),
        }
    }
}

/// The aggregated result of one execution run.
///
/// The report is created empty when the run starts, appended to synchronously
/// while rows execute, and returned when the run ends. Successful rows
/// contribute nothing; the caller decides whether a non-empty report fails
/// the surrounding test.
///
/// 一次执行运行的聚合结果。
///
/// 报告在运行开始时创建为空，在行执行期间同步追加，
/// 并在运行结束时返回。成功的行不贡献任何内容；
/// 由调用方决定非空报告是否使外层测试失败。
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    /// Failure messages, in the order they were produced.
    /// 按产生顺序排列的失败消息。
    entries: Vec<String>,
    /// How many dataset rows were actually invoked.
    /// 实际调用了多少个数据集行。
    rows_executed: usize,
    /// When the run started, in UTC.
    /// 运行开始的时间（UTC）。
    started_at: DateTime<Utc>,
    /// Wall-clock duration of the whole run.
    /// 整个运行的真实耗时。
    duration: Duration,
    #[serde(skip)]
    clock: Instant,
}

impl ExecutionReport {
    /// Creates an empty report stamped with the current time.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            rows_executed: 0,
            started_at: Utc::now(),
            duration: Duration::ZERO,
            clock: Instant::now(),
        }
    }

    /// Records the outcome of one invoked row. Successes only bump the row
    /// counter; failures also append their message.
    ///
    /// 记录一个被调用行的结果。成功只增加行计数器；失败还会追加其消息。
    pub fn record(&mut self, outcome: RowOutcome) {
        self.rows_executed += 1;
        if let RowOutcome::Failure { message } = outcome {
            self.entries.push(message);
        }
    }

    /// Records a structural failure that ended the run before (or instead of)
    /// any row execution: an unreadable file, an empty dataset, or an
    /// unresolvable procedure.
    ///
    /// 记录在任何行执行之前（或代替行执行）结束运行的结构性失败：
    /// 无法读取的文件、空数据集或无法解析的过程。
    pub fn record_structural(&mut self, message: impl Into<String>) {
        self.entries.push(message.into());
    }

    /// Stamps the report with the elapsed wall-clock time.
    pub fn finish(&mut self) {
        self.duration = self.clock.elapsed();
    }

    /// The failure messages collected so far, in order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// The number of failure entries.
    pub fn failure_count(&self) -> usize {
        self.entries.len()
    }

    /// How many dataset rows were invoked. Zero after a structural failure.
    pub fn rows_executed(&self) -> usize {
        self.rows_executed
    }

    /// Returns `true` when the run produced no failures at all.
    pub fn is_success(&self) -> bool {
        self.entries.is_empty()
    }

    /// When the run started, in UTC.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Wall-clock duration of the run.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The standard caller-side failure policy: `None` for a clean run,
    /// otherwise one message carrying the failure count and every entry, for
    /// the embedding test framework to raise as a single aggregated failure.
    ///
    /// 标准的调用方失败策略：运行干净时为 `None`，
    /// 否则为一条携带失败数量和所有条目的消息，
    /// 供嵌入的测试框架作为单个聚合失败抛出。
    pub fn failure_summary(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let noun = if self.entries.len() == 1 {
            "error"
        } else {
            "errors"
        };
        Some(format!(
            "{} {}: [{}]",
            self.entries.len(),
            noun,
            self.entries.join(", ")
        ))
    }
}

impl Default for ExecutionReport {
    fn default() -> Self {
        Self::new()
    }
}
