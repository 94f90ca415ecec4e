//! # Console Reporting Module / 控制台报告模块
//!
//! This module handles the display of run reports in the console.
//! It provides functionality for printing colorful, formatted summaries with
//! internationalization support.
//!
//! 此模块处理运行报告在控制台中的显示。
//! 它提供打印彩色格式化摘要的功能，支持国际化。

use colored::*;

use crate::core::models::ExecutionReport;
use crate::infra::t;

/// Prints a formatted summary of an execution run to the console.
/// Shows the executed row count, the failure count, and the wall-clock
/// duration, using color coding to highlight the overall outcome.
///
/// 在控制台打印一次执行运行的格式化摘要。
/// 显示已执行的行数、失败数量和真实耗时，
/// 使用颜色编码突出整体结果。
///
/// # Arguments / 参数
/// * `report` - The run report to summarize
///              要总结的运行报告
///
/// # Output Format / 输出格式
/// ```text
/// --- Data-Driven Run Summary ---
///   All 10 rows passed. (1.23s)
/// ```
pub fn print_summary(report: &ExecutionReport) {
    println!("\n{}", t!("report.banner").bold());

    let duration_str = format!("{:.2?}", report.duration());
    if report.is_success() {
        println!(
            "  {} ({})",
            t!("report.all_rows_passed", rows = report.rows_executed()).green(),
            duration_str
        );
    } else {
        println!(
            "  {} ({})",
            t!(
                "report.rows_failed",
                failed = report.failure_count(),
                rows = report.rows_executed()
            )
            .red()
            .bold(),
            duration_str
        );
    }
}

/// Prints every failure entry of a report, one numbered line per entry,
/// separated from the surrounding output for visual clarity. Returns early
/// when the report is clean.
///
/// 打印报告的每个失败条目，每个条目一行并编号，
/// 与周围输出分隔以保持视觉清晰。报告干净时提前返回。
pub fn print_failure_details(report: &ExecutionReport) {
    if report.is_success() {
        return;
    }

    println!("\n{}", t!("report.failure_banner").red().bold());
    println!("{}", "-".repeat(80));

    for (index, entry) in report.entries().iter().enumerate() {
        println!(
            "[{}/{}] {}",
            index + 1,
            report.failure_count(),
            entry.red()
        );
    }

    println!("{}", "-".repeat(80));
}
