//! # 基础 VASP 工作流
//!
//! - 单步：结构优化（写输入 -> VASP -> 入库）
//! - 两步：结构优化后接静态计算，静态计算从优化结果出发
//!
//! ## 依赖关系
//! - 被 `commands/vasp.rs` 使用
//! - 使用 `tasks/`、`workflow/builder.rs`

use crate::config::RunConfig;
use crate::error::Result;
use crate::models::{Crystal, Workflow};
use crate::tasks::TaskFactory;
use crate::workflow::WorkflowBuilder;

use tracing::info;

pub const SINGLE_WF_NAME: &str = "SingleVaspWF";
pub const DOUBLE_WF_NAME: &str = "DoubleVaspWF";

/// 单个结构优化
pub fn single_vasp(structure: &Crystal, config: &RunConfig) -> Result<Workflow> {
    config.validate()?;

    let factory = TaskFactory::new(config);
    let name = format!("{} - structure optimization", structure.reduced_formula());
    let mut builder = WorkflowBuilder::new(name, SINGLE_WF_NAME);
    builder.add_chain(factory.single_branch(structure, "structure optimization"), &[]);

    let workflow = builder.build()?;
    info!(tasks = workflow.len(), "assembled '{}'", workflow.name());
    Ok(workflow)
}

/// 结构优化 + 静态计算
pub fn double_vasp(structure: &Crystal, config: &RunConfig) -> Result<Workflow> {
    config.validate()?;

    let factory = TaskFactory::new(config);
    let name = format!("{} - optimization and static", structure.reduced_formula());
    let mut builder = WorkflowBuilder::new(name, DOUBLE_WF_NAME);

    let relaxed = builder.add_chain(factory.relax_branch(structure, "structure optimization"), &[]);
    let parents: Vec<_> = relaxed.into_iter().collect();
    builder.add_chain(factory.static_from_previous(structure, "static"), &parents);

    let workflow = builder.build()?;
    info!(tasks = workflow.len(), "assembled '{}'", workflow.name());
    Ok(workflow)
}
