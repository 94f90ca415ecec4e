//! # Table Runner Library / Table Runner 库
//!
//! This library provides the core functionality for the Table Runner tool,
//! a data-driven test executor: it reads a tabular dataset (Excel sheet or
//! delimited text), resolves a registered test procedure whose arity matches
//! the dataset width, invokes it once per row, and collects every per-row
//! failure into a single report without aborting the run.
//!
//! 此库为 Table Runner 工具提供核心功能，
//! 这是一个数据驱动的测试执行器：它读取表格数据集（Excel 工作表或分隔文本），
//! 解析一个与数据集宽度匹配的已注册测试过程，逐行调用它，
//! 并将每一行的失败收集到单个报告中而不中止运行。
//!
//! ## Modules / 模块
//!
//! - `core` - Procedure dispatch, row execution engine, and result models
//! - `infra` - Infrastructure services, chiefly the tabular dataset reader
//! - `reporting` - Run report rendering and serialization
//!
//! - `core` - 过程分发、行执行引擎和结果模型
//! - `infra` - 基础设施服务，主要是表格数据集读取器
//! - `reporting` - 运行报告的渲染和序列化

pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use crate::core::dispatch::{Fixture, ProcedureRegistry};
pub use crate::core::execution::execute;
pub use crate::core::models::{ExecutionReport, RowOutcome};
pub use crate::infra::dataset::{ReadOptions, TabularDataset};

/// Initializes the application's internationalization (i18n) based on the system locale.
///
/// This function detects the user's system locale and sets the appropriate
/// language for the report output. It attempts to match the full locale
/// (e.g., "zh-CN"), then just the language code (e.g., "en"), and finally
/// falls back to the default language ("en").
pub fn init() {
    // Detect system locale and set it for i18n.
    // Fallback to "en" if detection fails.
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    let available_locales = rust_i18n::available_locales!();

    // Try to match the full locale first (e.g., "zh-CN")
    // Then try to match the language part only (e.g., "en" from "en-US")
    // Finally, fall back to "en"
    let lang = if available_locales.contains(&locale.as_str()) {
        &locale
    } else {
        locale
            .split('-')
            .next()
            .filter(|lang_code| available_locales.contains(lang_code))
            .unwrap_or("en")
    };

    rust_i18n::set_locale(lang);
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
