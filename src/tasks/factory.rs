//! # 任务工厂
//!
//! 为单个结构生成按顺序执行的任务序列。
//! 工厂本身没有错误路径，任务运行失败由外部调度服务报告。
//!
//! ## 依赖关系
//! - 被 `workflow/csld.rs`、`workflow/vasp.rs` 使用
//! - 使用 `config/`、`models/`、`transform/perturb.rs`

use crate::config::{IncarOverrides, RunConfig};
use crate::models::{Crystal, InputSet, TaskAction, TaskDraft};
use crate::transform::DerivedStructure;

use std::collections::BTreeMap;

/// 任务工厂
pub struct TaskFactory<'a> {
    config: &'a RunConfig,
}

impl<'a> TaskFactory<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self { config }
    }

    /// 扰动超胞的静态计算分支：写输入 -> 运行 VASP -> 解析入库
    pub fn static_branch(&self, derived: &DerivedStructure) -> Vec<TaskDraft> {
        let prefix = format!(
            "perturbed supercell, idx: {}, disp_val: {:.3}, static",
            derived.index, derived.displacement
        );
        let incar = IncarOverrides::from(&self.config.incar_settings());

        vec![
            TaskDraft::new(
                format!("{} - write inputs", prefix),
                self.write_inputs(&derived.structure, InputSet::MpStatic, incar),
            ),
            TaskDraft::new(format!("{} - run vasp", prefix), self.run_vasp()),
            TaskDraft::new(format!("{} - vasp to db", prefix), self.vasp_to_db()),
        ]
    }

    /// 结构优化分支：写输入 -> 运行 VASP -> 登记目录 -> 解析入库
    pub fn relax_branch(&self, structure: &Crystal, name: &str) -> Vec<TaskDraft> {
        let incar = self.config.user_incar_settings.clone();
        vec![
            TaskDraft::new(
                format!("{} - write inputs", name),
                self.write_inputs(structure, InputSet::MpRelax, incar),
            ),
            TaskDraft::new(format!("{} - run vasp", name), self.run_vasp()),
            TaskDraft::new(
                format!("{} - pass locs", name),
                TaskAction::PassVaspLocs {
                    name: name.to_string(),
                },
            ),
            TaskDraft::new(format!("{} - vasp to db", name), self.vasp_to_db()),
        ]
    }

    /// 在父计算的输出上接着做静态计算
    ///
    /// 写输入任务携带的结构只作占位，实际几何取自复制过来的 CONTCAR。
    pub fn static_from_previous(&self, structure: &Crystal, name: &str) -> Vec<TaskDraft> {
        let incar = self.config.user_incar_settings.clone();
        vec![
            TaskDraft::new(
                format!("{} - copy outputs", name),
                TaskAction::CopyVaspOutputs {
                    contcar_to_poscar: true,
                },
            ),
            TaskDraft::new(
                format!("{} - write inputs", name),
                self.write_inputs(structure, InputSet::MpStatic, incar),
            ),
            TaskDraft::new(format!("{} - run vasp", name), self.run_vasp()),
            TaskDraft::new(format!("{} - vasp to db", name), self.vasp_to_db()),
        ]
    }

    /// 单个结构的写输入 -> 运行 -> 入库
    pub fn single_branch(&self, structure: &Crystal, name: &str) -> Vec<TaskDraft> {
        let incar = self.config.user_incar_settings.clone();
        vec![
            TaskDraft::new(
                format!("{} - write inputs", name),
                self.write_inputs(structure, InputSet::MpRelax, incar),
            ),
            TaskDraft::new(format!("{} - run vasp", name), self.run_vasp()),
            TaskDraft::new(format!("{} - vasp to db", name), self.vasp_to_db()),
        ]
    }

    fn write_inputs(
        &self,
        structure: &Crystal,
        input_set: InputSet,
        user_incar_settings: IncarOverrides,
    ) -> TaskAction {
        TaskAction::WriteVaspInputs {
            structure: structure.clone(),
            input_set,
            user_incar_settings,
        }
    }

    fn run_vasp(&self) -> TaskAction {
        TaskAction::RunVasp {
            vasp_cmd: self.config.vasp_cmd.clone(),
        }
    }

    fn vasp_to_db(&self) -> TaskAction {
        TaskAction::VaspToDb {
            db_file: self.config.db_file.clone(),
            additional_fields: BTreeMap::new(),
        }
    }
}
