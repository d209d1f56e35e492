//! # single / double 命令实现
//!
//! ## 依赖关系
//! - 使用 `cli/vasp.rs` 定义的参数
//! - 使用 `parsers/`、`workflow/vasp.rs`、`utils/output.rs`

use crate::cli::vasp::VaspArgs;
use crate::error::Result;
use crate::parsers;
use crate::utils::output;
use crate::workflow::{double_vasp, single_vasp};

/// 工作流形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Single,
    Double,
}

/// 执行 single / double 命令
pub fn execute(args: VaspArgs, mode: Mode) -> Result<()> {
    output::print_header(match mode {
        Mode::Single => "Structure Optimization Workflow",
        Mode::Double => "Optimization + Static Workflow",
    });

    let config = super::resolve_run_config(&args.run)?;
    let structure = parsers::parse_structure_file(&args.structure)?;
    output::print_info(&format!(
        "Loaded '{}' ({}, {} sites)",
        structure.name,
        structure.formula(),
        structure.num_sites()
    ));

    let workflow = match mode {
        Mode::Single => single_vasp(&structure, &config)?,
        Mode::Double => double_vasp(&structure, &config)?,
    };

    output::print_separator();
    super::emit_workflow(workflow, &args.out)?;
    output::print_done("Workflow ready for submission");
    Ok(())
}
