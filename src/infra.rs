//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for Table Runner,
//! chiefly the tabular dataset reader, plus i18n support.
//!
//! 此模块为 Table Runner 提供基础设施服务，
//! 主要是表格数据集读取器，以及国际化支持。

pub mod dataset;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
