//! # Row Execution Engine Module / 行执行引擎模块
//!
//! This module drives one full data-driven run: it loads the dataset,
//! resolves the target procedure once against the dataset width, invokes the
//! procedure for every row in order, and aggregates the failures into an
//! [`ExecutionReport`]. Structural failures (an unreadable file, an empty
//! dataset, an unresolvable procedure) abort the run with exactly one report
//! entry; per-row failures never abort and are all collected.
//!
//! 此模块驱动一次完整的数据驱动运行：加载数据集，
//! 针对数据集宽度解析一次目标过程，按顺序为每一行调用该过程，
//! 并将失败聚合到 [`ExecutionReport`] 中。结构性失败（无法读取的文件、
//! 空数据集、无法解析的过程）以恰好一条报告条目中止运行；
//! 行级失败绝不中止运行，且会被全部收集。

use std::path::Path;
use tracing::{debug, error, info};

use crate::{
    core::{
        dispatch::{Fixture, ProcedureRegistry},
        models::ExecutionReport,
    },
    infra::dataset::{self, ReadOptions},
};

/// Runs the named procedure once per row of the dataset at `path`.
///
/// The run is strictly sequential: the dataset is fully loaded before the
/// first row executes, rows are dispatched in order, and the next row is not
/// started until the previous row's outcome has been recorded. The returned
/// report is never an `Err` and the call never panics; an empty report means
/// the whole run succeeded.
///
/// 对 `path` 处数据集的每一行运行一次命名过程。
///
/// 运行严格串行：第一行执行前数据集已完整加载，行按顺序分发，
/// 上一行的结果被记录之前不会开始下一行。返回的报告绝不是 `Err`，
/// 调用也绝不 panic；空报告意味着整次运行成功。
///
/// # Arguments
/// * `registry` - The procedure registration table built by the embedder
/// * `fixture` - The target context the procedure runs against
/// * `path` - The dataset file (`.xls`, `.xlsx` or `.csv`)
/// * `procedure_name` - The registered name to resolve
/// * `options` - Format knobs forwarded to the dataset reader
///
/// # Returns
/// The aggregated `ExecutionReport` for the run
pub fn execute<F: Fixture>(
    registry: &ProcedureRegistry<F>,
    fixture: &mut F,
    path: impl AsRef<Path>,
    procedure_name: &str,
    options: &ReadOptions,
) -> ExecutionReport {
    let path = path.as_ref();
    let mut report = ExecutionReport::new();

    // 1. Load the dataset fully into memory before touching any procedure.
    let dataset = match dataset::read(path, options) {
        Ok(dataset) => dataset,
        Err(read_error) => {
            report.record_structural(read_error.to_string());
            report.finish();
            return report;
        }
    };

    // 2. A readable file with zero usable rows ends the run on its own entry.
    if dataset.is_empty() {
        let message = format!(
            "there are no data in sheet {} of the file '{}'",
            options.sheet_index,
            path.display()
        );
        error!("{message}");
        report.record_structural(message);
        report.finish();
        return report;
    }

    info!(
        rows = dataset.row_count(),
        width = dataset.width(),
        path = %path.display(),
        "dataset loaded"
    );

    // 3. Arity is fixed by the dataset width; resolve once for the whole run.
    let procedure = match registry.resolve(procedure_name, dataset.width()) {
        Ok(procedure) => procedure,
        Err(resolution_error) => {
            report.record_structural(resolution_error.to_string());
            report.finish();
            return report;
        }
    };

    // 4. Every row is always attempted; failures are recorded, never fatal.
    let row_total = dataset.row_count();
    for (position, cells) in dataset.rows().enumerate() {
        let row_index = position + 1;
        debug!(row_index, row_total, procedure = procedure.name(), "iteration");
        let outcome = procedure.invoke(fixture, cells, row_index, row_total);
        report.record(outcome);
    }

    report.finish();
    report
}
