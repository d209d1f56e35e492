//! # 工作流构建器
//!
//! 逐个追加任务并连接依赖边。新任务的编号就是它追加时的位置，
//! 父任务只能引用已经存在的任务，所以构建出的图天然无环。
//!
//! ## 依赖关系
//! - 被 `workflow/csld.rs`、`workflow/vasp.rs` 使用
//! - 使用 `models/`

use crate::error::Result;
use crate::models::{Task, TaskDraft, TaskId, Workflow, WorkflowMeta};

use tracing::trace;
use uuid::Uuid;

/// 工作流构建器
pub struct WorkflowBuilder {
    name: String,
    metadata: WorkflowMeta,
    tasks: Vec<Task>,
}

impl WorkflowBuilder {
    /// `wf_name` 为工作流类型名，同时生成新的运行 UUID
    pub fn new(name: impl Into<String>, wf_name: impl Into<String>) -> Self {
        Self::with_uuid(name, wf_name, Uuid::new_v4().to_string())
    }

    pub fn with_uuid(
        name: impl Into<String>,
        wf_name: impl Into<String>,
        wf_uuid: impl Into<String>,
    ) -> Self {
        WorkflowBuilder {
            name: name.into(),
            metadata: WorkflowMeta {
                wf_uuid: wf_uuid.into(),
                wf_name: wf_name.into(),
                tags: Vec::new(),
            },
            tasks: Vec::new(),
        }
    }

    /// 追加单个任务
    pub fn add_task(&mut self, draft: TaskDraft, parents: &[TaskId]) -> TaskId {
        let id = TaskId(self.tasks.len());
        trace!(%id, parents = ?parents, "adding task '{}'", draft.name);
        self.tasks.push(Task {
            id,
            name: draft.name,
            action: draft.action,
            parents: parents.to_vec(),
        });
        id
    }

    /// 把任务串成一条链：第一个任务依赖 `parents`，之后每个依赖前一个。
    /// 返回链末端任务；空链返回 `None`。
    pub fn add_chain(&mut self, drafts: Vec<TaskDraft>, parents: &[TaskId]) -> Option<TaskId> {
        let mut last: Option<TaskId> = None;
        for draft in drafts {
            let id = match last {
                Some(prev) => self.add_task(draft, &[prev]),
                None => self.add_task(draft, parents),
            };
            last = Some(id);
        }
        last
    }

    /// 完成构建并校验
    pub fn build(self) -> Result<Workflow> {
        Workflow::new(self.name, self.metadata, self.tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskAction;

    fn draft(name: &str) -> TaskDraft {
        TaskDraft::new(
            name,
            TaskAction::RunVasp {
                vasp_cmd: "vasp".to_string(),
            },
        )
    }

    #[test]
    fn test_chain_links_sequentially() {
        let mut builder = WorkflowBuilder::with_uuid("chain", "Test", "abc");
        let root = builder.add_task(draft("root"), &[]);
        let end = builder
            .add_chain(vec![draft("a"), draft("b"), draft("c")], &[root])
            .unwrap();

        let wf = builder.build().unwrap();
        assert_eq!(end, TaskId(3));
        assert_eq!(wf.task(TaskId(1)).unwrap().parents, vec![root]);
        assert_eq!(wf.task(TaskId(2)).unwrap().parents, vec![TaskId(1)]);
        assert_eq!(wf.task(TaskId(3)).unwrap().parents, vec![TaskId(2)]);
        assert_eq!(wf.metadata().wf_uuid, "abc");
    }

    #[test]
    fn test_empty_chain() {
        let mut builder = WorkflowBuilder::new("empty", "Test");
        assert!(builder.add_chain(vec![], &[]).is_none());
        assert!(builder.build().unwrap().is_empty());
    }

    #[test]
    fn test_new_generates_distinct_uuids() {
        let a = WorkflowBuilder::new("a", "Test").build().unwrap();
        let b = WorkflowBuilder::new("b", "Test").build().unwrap();
        assert_ne!(a.metadata().wf_uuid, b.metadata().wf_uuid);
    }
}
