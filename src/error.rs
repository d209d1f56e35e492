//! # 统一错误处理模块
//!
//! 定义 latflow 的所有错误类型，使用 `thiserror` 派生。
//! 所有错误都在工作流构建阶段同步抛出，不会在提交之后出现。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// latflow 统一错误类型
#[derive(Error, Debug)]
pub enum FlowError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // 构建期错误
    // ─────────────────────────────────────────────────────────────
    /// 构建期不变量被破坏（空的扰动结构列表、无法满足的超胞约束、非法的图）
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// 运行配置中存在未知或相互冲突的键
    #[error("Invalid run configuration: {0}")]
    ConfigurationError(String),

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, FlowError>;
