//! # inspect 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/inspect.rs`

use clap::Args;
use std::path::PathBuf;

/// inspect 子命令参数
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Workflow JSON file, or a workflow UUID when --launchpad is given
    pub workflow: PathBuf,

    /// Look the workflow up by UUID in this launchpad directory
    #[arg(long)]
    pub launchpad: Option<PathBuf>,

    /// Only print the summary, not the task table
    #[arg(long, default_value_t = false)]
    pub summary: bool,
}
