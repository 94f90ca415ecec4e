//! # Reporting Module / 报告模块
//!
//! This module handles the rendering and serialization of run reports.
//! It provides functionality for printing colorful, formatted summaries to
//! the console with internationalization support, and for writing reports
//! to disk as JSON for downstream tooling.
//!
//! 此模块处理运行报告的渲染和序列化。
//! 它提供在控制台打印彩色格式化摘要的功能（支持国际化），
//! 以及将报告以 JSON 形式写入磁盘供下游工具使用的功能。

pub mod console;
pub mod json;

// Re-export common reporting functions
pub use console::{print_failure_details, print_summary};
pub use json::generate_json_report;
