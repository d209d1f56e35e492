//! # 任务数据模型
//!
//! 工作流中的单个任务：名称、类型化参数、父任务列表。
//! 任务本身不会被执行，只是交给外部调度服务的描述。
//!
//! ## 依赖关系
//! - 被 `tasks/factory.rs`、`workflow/` 使用
//! - 使用 `models/structure.rs`、`config/`

use crate::config::IncarOverrides;
use crate::models::Crystal;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// 任务在工作流中的编号（即其位置）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub usize);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// VASP 输入集
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSet {
    #[serde(rename = "MPRelaxSet")]
    MpRelax,
    #[serde(rename = "MPStaticSet")]
    MpStatic,
}

impl std::fmt::Display for InputSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputSet::MpRelax => write!(f, "MPRelaxSet"),
            InputSet::MpStatic => write!(f, "MPStaticSet"),
        }
    }
}

/// 聚合任务消费的一条受力样本：哪个分支、多大位移
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceSample {
    pub index: usize,
    pub displacement: f64,
    /// 该分支的末端（入库）任务
    pub task: TaskId,
}

/// 任务参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum TaskAction {
    /// 写出 VASP 输入文件
    WriteVaspInputs {
        structure: Crystal,
        input_set: InputSet,
        #[serde(default)]
        user_incar_settings: IncarOverrides,
    },

    /// 运行 VASP
    RunVasp { vasp_cmd: String },

    /// 把计算目录登记给后续任务
    PassVaspLocs { name: String },

    /// 从父任务的计算目录复制输出作为新计算的起点
    CopyVaspOutputs { contcar_to_poscar: bool },

    /// 解析 VASP 输出并写入数据库
    VaspToDb {
        db_file: String,
        #[serde(default)]
        additional_fields: BTreeMap<String, Value>,
    },

    /// 汇总所有扰动超胞的受力，拟合力常数并入库
    CsldForceConstantsToDb {
        db_file: String,
        wf_uuid: String,
        parent_structure: Crystal,
        supercell_structure: Crystal,
        trans_mat: [[i32; 3]; 3],
        samples: Vec<ForceSample>,
        seed: Option<u64>,
        #[serde(default)]
        additional_fields: BTreeMap<String, Value>,
    },
}

impl TaskAction {
    /// 任务类型名，用于按名称筛选任务
    pub fn label(&self) -> &'static str {
        match self {
            TaskAction::WriteVaspInputs { .. } => "WriteVaspInputs",
            TaskAction::RunVasp { .. } => "RunVasp",
            TaskAction::PassVaspLocs { .. } => "PassVaspLocs",
            TaskAction::CopyVaspOutputs { .. } => "CopyVaspOutputs",
            TaskAction::VaspToDb { .. } => "VaspToDb",
            TaskAction::CsldForceConstantsToDb { .. } => "CsldForceConstantsToDb",
        }
    }

    /// 随输出一同入库的附加字段，只有入库类任务才有
    pub fn output_fields(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            TaskAction::VaspToDb {
                additional_fields, ..
            }
            | TaskAction::CsldForceConstantsToDb {
                additional_fields, ..
            } => Some(additional_fields),
            _ => None,
        }
    }

    pub fn output_fields_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            TaskAction::VaspToDb {
                additional_fields, ..
            }
            | TaskAction::CsldForceConstantsToDb {
                additional_fields, ..
            } => Some(additional_fields),
            _ => None,
        }
    }

    /// 聚合任务中按分支顺序排列的位移列表
    pub fn displacements(&self) -> Option<Vec<f64>> {
        match self {
            TaskAction::CsldForceConstantsToDb { samples, .. } => {
                Some(samples.iter().map(|s| s.displacement).collect())
            }
            _ => None,
        }
    }
}

/// 尚未加入工作流的任务（没有编号和父任务）
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub name: String,
    pub action: TaskAction,
}

impl TaskDraft {
    pub fn new(name: impl Into<String>, action: TaskAction) -> Self {
        TaskDraft {
            name: name.into(),
            action,
        }
    }
}

/// 工作流中的任务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub action: TaskAction,
    /// 父任务，全部成功完成后本任务才可运行
    #[serde(default)]
    pub parents: Vec<TaskId>,
}

impl Task {
    /// 名称或类型名包含 `filter` 时视为匹配
    pub fn matches(&self, filter: &str) -> bool {
        self.action.label().contains(filter) || self.name.contains(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_fields_only_on_storing_actions() {
        let run = TaskAction::RunVasp {
            vasp_cmd: "vasp_std".to_string(),
        };
        assert!(run.output_fields().is_none());

        let mut store = TaskAction::VaspToDb {
            db_file: "db.json".to_string(),
            additional_fields: BTreeMap::new(),
        };
        store
            .output_fields_mut()
            .unwrap()
            .insert("tag".to_string(), Value::from("x"));
        assert_eq!(store.output_fields().unwrap().len(), 1);
    }

    #[test]
    fn test_action_serializes_with_tag() {
        let action = TaskAction::RunVasp {
            vasp_cmd: "vasp_std".to_string(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "RunVasp");
        assert_eq!(json["vasp_cmd"], "vasp_std");
    }

    #[test]
    fn test_task_matches_label_or_name() {
        let task = Task {
            id: TaskId(0),
            name: "perturbed supercell, idx: 0, disp_val: 0.010, static - vasp to db".to_string(),
            action: TaskAction::VaspToDb {
                db_file: "db.json".to_string(),
                additional_fields: BTreeMap::new(),
            },
            parents: vec![],
        };
        assert!(task.matches("VaspToDb"));
        assert!(task.matches("idx: 0"));
        assert!(!task.matches("RunVasp"));
    }
}
