//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `csld`: 压缩感知晶格动力学工作流
//! - `single`: 单步结构优化工作流
//! - `double`: 结构优化 + 静态计算工作流
//! - `inspect`: 查看并校验已保存的工作流
//! - `tag`: 给已保存的工作流追加元数据
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: common, csld, vasp, inspect, tag

pub mod common;
pub mod csld;
pub mod inspect;
pub mod tag;
pub mod vasp;

use clap::{ArgAction, Parser, Subcommand};

/// latflow - 晶格动力学工作流构建工具
#[derive(Parser)]
#[command(name = "latflow")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(
    about = "Build lattice-dynamics DFT workflows for an external job manager",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Build a compressed sensing lattice dynamics workflow
    Csld(csld::CsldArgs),

    /// Build a single structure-optimization workflow
    Single(vasp::VaspArgs),

    /// Build a structure-optimization + static workflow
    Double(vasp::VaspArgs),

    /// Validate a stored workflow and print its tasks
    Inspect(inspect::InspectArgs),

    /// Merge metadata into the stored-output fields of matching tasks
    Tag(tag::TagArgs),
}
