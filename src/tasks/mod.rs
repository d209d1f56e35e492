//! # 任务构建模块
//!
//! 把结构和运行配置变成有序的任务草稿。
//!
//! ## 依赖关系
//! - 被 `workflow/` 使用
//! - 子模块: factory

pub mod factory;

pub use factory::TaskFactory;
