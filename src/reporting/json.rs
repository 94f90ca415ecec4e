//! # JSON Reporting Module / JSON 报告模块
//!
//! This module writes run reports to disk as JSON so downstream tooling
//! (dashboards, CI annotations) can consume them.
//!
//! 此模块将运行报告以 JSON 形式写入磁盘，
//! 供下游工具（仪表板、CI 注释）消费。

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::core::models::ExecutionReport;

/// Serializes a run report to a pretty-printed JSON file.
/// Parent directories are created as needed.
///
/// 将运行报告序列化为带缩进的 JSON 文件。
/// 按需创建父目录。
///
/// # Arguments / 参数
/// * `report` - The run report to serialize
///              要序列化的运行报告
/// * `output_path` - The file path where the JSON report will be saved
///                   保存 JSON 报告的文件路径
///
/// # Errors / 错误
/// This function will return an error if:
/// - The report cannot be serialized
/// - The output file cannot be written to the specified path
///
/// 此函数在以下情况下会返回错误：
/// - 报告无法序列化
/// - 无法将输出文件写入指定路径
pub fn generate_json_report(report: &ExecutionReport, output_path: &Path) -> Result<()> {
    let payload =
        serde_json::to_string_pretty(report).context("Failed to serialize the run report")?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create report directory: {}", parent.display())
            })?;
        }
    }

    fs::write(output_path, payload)
        .with_context(|| format!("Failed to write report file: {}", output_path.display()))?;

    Ok(())
}
