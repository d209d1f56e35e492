//! # single / double 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/vasp.rs`

use super::common::{OutputArgs, RunConfigArgs};

use clap::Args;
use std::path::PathBuf;

/// single / double 子命令参数
#[derive(Args, Debug)]
pub struct VaspArgs {
    /// Input structure (POSCAR/CONTCAR/*.vasp or Crystal JSON)
    #[arg(short, long)]
    pub structure: PathBuf,

    #[command(flatten)]
    pub run: RunConfigArgs,

    #[command(flatten)]
    pub out: OutputArgs,
}
