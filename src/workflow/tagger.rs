//! # 元数据标注
//!
//! 把共享元数据合并进匹配任务的附加入库字段，便于之后从数据库里
//! 按运行查询所有相关文档。合并是追加式的：已有字段只会被同名键覆盖，
//! 不会被删除；不匹配的任务保持原样。
//!
//! ## 依赖关系
//! - 被 `workflow/csld.rs`、`commands/tag.rs` 使用
//! - 使用 `models/`

use crate::models::Workflow;

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// 元数据标注器
#[derive(Debug, Clone)]
pub struct MetadataTagger {
    fields: BTreeMap<String, Value>,
    filter: String,
}

impl MetadataTagger {
    /// `filter` 与任务类型名或任务名做子串匹配
    pub fn new(fields: BTreeMap<String, Value>, filter: impl Into<String>) -> Self {
        MetadataTagger {
            fields,
            filter: filter.into(),
        }
    }

    /// 对工作流做标注，返回标注后的工作流
    pub fn tag(&self, mut workflow: Workflow) -> Workflow {
        let mut tagged = 0usize;
        for task in workflow.tasks_mut() {
            if !task.matches(&self.filter) {
                continue;
            }
            match task.action.output_fields_mut() {
                Some(existing) => {
                    for (key, value) in &self.fields {
                        existing.insert(key.clone(), value.clone());
                    }
                    tagged += 1;
                }
                None => debug!(
                    "task {} '{}' matches '{}' but stores no output",
                    task.id, task.name, self.filter
                ),
            }
        }

        if tagged == 0 {
            warn!("no storing task matched '{}', nothing tagged", self.filter);
        } else {
            debug!(tagged, filter = %self.filter, "merged {} field(s)", self.fields.len());
        }
        workflow
    }
}

/// 在工作流元数据上追加标签（去重、保持首次出现的顺序）
pub fn add_tags(mut workflow: Workflow, tags: &[String]) -> Workflow {
    let existing = &mut workflow.metadata_mut().tags;
    for tag in tags {
        if !existing.contains(tag) {
            existing.push(tag.clone());
        }
    }
    workflow
}
