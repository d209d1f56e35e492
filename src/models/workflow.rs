//! # 工作流数据模型
//!
//! 一组带依赖边的任务，加上名称和共享元数据。
//!
//! 任务编号即其在 `tasks` 中的位置，且父任务编号总是小于子任务，
//! 所以任务列表本身就是一个拓扑序，图中不可能出现环。
//!
//! ## 依赖关系
//! - 被 `workflow/`、`commands/` 使用
//! - 使用 `models/task.rs`

use crate::error::{FlowError, Result};
use crate::models::{Task, TaskId};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 工作流共享元数据，便于之后在数据库中跨运行查询
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMeta {
    /// 本次运行的唯一标识
    pub wf_uuid: String,
    /// 工作流类型名
    pub wf_name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// 任务依赖图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    name: String,
    metadata: WorkflowMeta,
    tasks: Vec<Task>,
}

impl Workflow {
    /// 组装并校验工作流
    pub fn new(name: impl Into<String>, metadata: WorkflowMeta, tasks: Vec<Task>) -> Result<Self> {
        let workflow = Workflow {
            name: name.into(),
            metadata,
            tasks,
        };
        workflow.validate()?;
        Ok(workflow)
    }

    /// 从 JSON 文本加载并校验
    pub fn from_json(content: &str) -> Result<Self> {
        let workflow: Workflow = serde_json::from_str(content)?;
        workflow.validate()?;
        Ok(workflow)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata(&self) -> &WorkflowMeta {
        &self.metadata
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id.0)
    }

    /// 没有父任务、可立即运行的任务
    pub fn roots(&self) -> Vec<TaskId> {
        self.tasks
            .iter()
            .filter(|t| t.parents.is_empty())
            .map(|t| t.id)
            .collect()
    }

    /// 没有子任务的末端任务
    pub fn leaves(&self) -> Vec<TaskId> {
        let mut has_child = vec![false; self.tasks.len()];
        for task in &self.tasks {
            for parent in &task.parents {
                has_child[parent.0] = true;
            }
        }
        self.tasks
            .iter()
            .filter(|t| !has_child[t.id.0])
            .map(|t| t.id)
            .collect()
    }

    /// 直接依赖 `id` 的任务
    pub fn children(&self, id: TaskId) -> Vec<TaskId> {
        self.tasks
            .iter()
            .filter(|t| t.parents.contains(&id))
            .map(|t| t.id)
            .collect()
    }

    /// 拓扑序：父任务总在子任务之前
    pub fn topological_order(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|t| t.id).collect()
    }

    /// 校验编号连续、父任务存在且先于子任务、父任务无重复
    pub fn validate(&self) -> Result<()> {
        for (position, task) in self.tasks.iter().enumerate() {
            if task.id.0 != position {
                return Err(FlowError::ValidationError(format!(
                    "task '{}' has id {} but sits at position {}",
                    task.name, task.id, position
                )));
            }

            let mut seen = HashSet::new();
            for parent in &task.parents {
                if parent.0 >= position {
                    return Err(FlowError::ValidationError(format!(
                        "task {} '{}' depends on {}, which does not precede it",
                        task.id, task.name, parent
                    )));
                }
                if !seen.insert(*parent) {
                    return Err(FlowError::ValidationError(format!(
                        "task {} '{}' lists parent {} twice",
                        task.id, task.name, parent
                    )));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn tasks_mut(&mut self) -> &mut [Task] {
        &mut self.tasks
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut WorkflowMeta {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskAction;

    fn meta() -> WorkflowMeta {
        WorkflowMeta {
            wf_uuid: "0000".to_string(),
            wf_name: "Test".to_string(),
            tags: vec![],
        }
    }

    fn run_task(id: usize, parents: Vec<usize>) -> Task {
        Task {
            id: TaskId(id),
            name: format!("task {}", id),
            action: TaskAction::RunVasp {
                vasp_cmd: "vasp".to_string(),
            },
            parents: parents.into_iter().map(TaskId).collect(),
        }
    }

    #[test]
    fn test_roots_leaves_children() {
        // 0 -> 1 -> 3, 0 -> 2 -> 3
        let wf = Workflow::new(
            "diamond",
            meta(),
            vec![
                run_task(0, vec![]),
                run_task(1, vec![0]),
                run_task(2, vec![0]),
                run_task(3, vec![1, 2]),
            ],
        )
        .unwrap();

        assert_eq!(wf.roots(), vec![TaskId(0)]);
        assert_eq!(wf.leaves(), vec![TaskId(3)]);
        assert_eq!(wf.children(TaskId(0)), vec![TaskId(1), TaskId(2)]);
        assert_eq!(wf.topological_order().len(), 4);
    }

    #[test]
    fn test_forward_reference_rejected() {
        let err = Workflow::new("bad", meta(), vec![run_task(0, vec![1]), run_task(1, vec![])])
            .unwrap_err();
        assert!(matches!(err, FlowError::ValidationError(_)));

        let err = Workflow::new("self", meta(), vec![run_task(0, vec![0])]).unwrap_err();
        assert!(matches!(err, FlowError::ValidationError(_)));
    }

    #[test]
    fn test_duplicate_parent_and_bad_id_rejected() {
        let err = Workflow::new("dup", meta(), vec![run_task(0, vec![]), run_task(1, vec![0, 0])])
            .unwrap_err();
        assert!(matches!(err, FlowError::ValidationError(_)));

        let err = Workflow::new("gap", meta(), vec![run_task(1, vec![])]).unwrap_err();
        assert!(matches!(err, FlowError::ValidationError(_)));
    }

    #[test]
    fn test_json_reload_is_validated() {
        let wf = Workflow::new("pair", meta(), vec![run_task(0, vec![]), run_task(1, vec![0])])
            .unwrap();
        let json = wf.to_json().unwrap();
        assert_eq!(Workflow::from_json(&json).unwrap(), wf);

        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["tasks"][1]["parents"] = serde_json::json!([5]);
        assert!(Workflow::from_json(&value.to_string()).is_err());
    }
}
