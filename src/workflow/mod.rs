//! # 工作流模块
//!
//! 把逐结构的任务序列组装成依赖图，标注元数据，交给外部调度服务。
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/`、`tasks/`、`transform/`、`config/`
//! - 子模块: builder, csld, vasp, tagger, launchpad

pub mod builder;
pub mod csld;
pub mod launchpad;
pub mod tagger;
pub mod vasp;

pub use builder::WorkflowBuilder;
pub use csld::{CsldSettings, CsldWorkflow};
pub use launchpad::{FileLaunchPad, LaunchPad};
pub use tagger::{add_tags, MetadataTagger};
pub use vasp::{double_vasp, single_vasp};
