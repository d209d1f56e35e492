//! # tag 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/tag.rs`

use clap::Args;
use std::path::PathBuf;

/// tag 子命令参数
#[derive(Args, Debug)]
pub struct TagArgs {
    /// Workflow JSON file
    pub workflow: PathBuf,

    /// Field to merge, repeatable; VALUE is parsed as JSON, else kept as a string
    #[arg(long = "field", value_name = "KEY=VALUE", required = true)]
    pub fields: Vec<String>,

    /// Substring matched against task type and task name
    #[arg(long, default_value = "VaspToDb")]
    pub filter: String,

    /// Output file (defaults to overwriting the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
