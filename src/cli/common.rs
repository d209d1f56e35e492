//! # 公共 CLI 参数
//!
//! 多个子命令共用的运行配置与输出选项。
//!
//! ## 依赖关系
//! - 被 `cli/csld.rs`、`cli/vasp.rs` 使用
//! - 参数传递给 `commands/mod.rs`

use clap::Args;
use std::path::PathBuf;

/// 运行配置参数（覆盖配置文件）
#[derive(Args, Debug)]
pub struct RunConfigArgs {
    /// TOML run configuration (vasp_cmd, db_file, [user_incar_settings])
    #[arg(long, env = "LATFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// VASP command, resolved by the worker if left at the placeholder
    #[arg(long, env = "LATFLOW_VASP_CMD")]
    pub vasp_cmd: Option<String>,

    /// Database descriptor passed to the storing tasks
    #[arg(long, env = "LATFLOW_DB_FILE")]
    pub db_file: Option<String>,

    /// INCAR override, repeatable (e.g. --incar ENCUT=520 --incar PREC=Normal)
    #[arg(long = "incar", value_name = "KEY=VALUE")]
    pub incar: Vec<String>,
}

/// 工作流输出参数
#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Write the workflow JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Add the workflow to a directory launchpad
    #[arg(long, env = "LATFLOW_LAUNCHPAD")]
    pub launchpad: Option<PathBuf>,

    /// Tag attached to the workflow metadata, repeatable
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}
