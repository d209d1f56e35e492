//! # 数据模型模块
//!
//! 定义晶体结构、任务和工作流的数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`transform/`、`tasks/`、`workflow/`、`commands/` 使用
//! - 子模块: element, structure, task, workflow

pub mod element;
pub mod structure;
pub mod task;
pub mod workflow;

pub use structure::{Atom, Crystal, Lattice};
pub use task::{ForceSample, InputSet, Task, TaskAction, TaskDraft, TaskId};
pub use workflow::{Workflow, WorkflowMeta};
