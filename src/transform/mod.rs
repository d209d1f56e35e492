//! # 结构变换模块
//!
//! 从母结构生成计算所需的结构：先扩胞，再对超胞做随机扰动。
//! 变换只读输入、返回新结构。
//!
//! ## 依赖关系
//! - 被 `workflow/csld.rs` 使用
//! - 使用 `models/structure.rs`
//! - 子模块: supercell, perturb

pub mod perturb;
pub mod supercell;

pub use perturb::{DerivedStructure, PerturbSites};
pub use supercell::{CubicSupercell, SupercellInfo};
