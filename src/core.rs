//! # Core Module / 核心模块
//!
//! This module contains the core functionality of Table Runner,
//! including result models, procedure dispatch, and the row execution engine.
//!
//! 此模块包含 Table Runner 的核心功能，
//! 包括结果模型、过程分发和行执行引擎。

pub mod dispatch;
pub mod execution;
pub mod models;

// Re-exports
pub use dispatch::{Fixture, ProcedureRegistry};
pub use execution::execute;
pub use models::{ExecutionReport, RowOutcome};
