//! # latflow - 晶格动力学工作流构建工具
//!
//! 把结构变换、第一性原理计算任务和入库步骤拼成有向任务图，
//! 交给外部作业管理服务执行。本程序只负责构建、校验、标注和交付任务图。
//!
//! ## 子命令
//! - `csld`    - 压缩感知晶格动力学 (扩胞 + 随机扰动 + 静态计算 + 力常数拟合)
//! - `single`  - 单步结构优化
//! - `double`  - 结构优化 + 静态计算
//! - `inspect` - 校验并查看已保存的工作流
//! - `tag`     - 给工作流中的入库任务追加元数据
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (结构读取)
//!   │     ├── workflow/  (任务图组装、标注、提交)
//!   │     │     ├── tasks/     (逐结构任务序列)
//!   │     │     └── transform/ (扩胞、扰动)
//!   │     ├── config/    (运行配置)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (输出与日志)
//!   └── error.rs    (错误处理)
//! ```

mod cli;
mod commands;
mod config;
mod error;
mod models;
mod parsers;
mod tasks;
mod transform;
mod utils;
mod workflow;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();
    utils::logging::init(cli.verbose);

    if let Err(e) = commands::run(cli.command) {
        tracing::debug!(error = ?e, "command failed");
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
