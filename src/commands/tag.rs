//! # tag 命令实现
//!
//! 对已保存的工作流做元数据标注并写回。
//!
//! ## 依赖关系
//! - 使用 `cli/tag.rs` 定义的参数
//! - 使用 `workflow/tagger.rs`、`utils/output.rs`

use crate::cli::tag::TagArgs;
use crate::error::{FlowError, Result};
use crate::utils::output;
use crate::workflow::MetadataTagger;

use serde_json::Value;
use std::collections::BTreeMap;

/// 执行 tag 命令
pub fn execute(args: TagArgs) -> Result<()> {
    output::print_header("Workflow Tagging");

    let fields = parse_fields(&args.fields)?;
    let workflow = super::read_workflow(&args.workflow)?;

    let matched = workflow
        .tasks()
        .iter()
        .filter(|t| t.matches(&args.filter) && t.action.output_fields().is_some())
        .count();
    if matched == 0 {
        output::print_warning(&format!(
            "No storing task matches '{}', workflow left unchanged",
            args.filter
        ));
    }

    let workflow = MetadataTagger::new(fields, &args.filter).tag(workflow);

    let target = args.output.as_ref().unwrap_or(&args.workflow);
    super::write_workflow(&workflow, target)?;
    output::print_done(&format!(
        "Tagged {} task(s), written to '{}'",
        matched,
        target.display()
    ));
    Ok(())
}

/// 解析 `KEY=VALUE`：VALUE 能按 JSON 解析则用 JSON，否则当作字符串
fn parse_fields(assignments: &[String]) -> Result<BTreeMap<String, Value>> {
    let mut fields = BTreeMap::new();
    for assignment in assignments {
        let (key, raw) = assignment.split_once('=').ok_or_else(|| {
            FlowError::InvalidArgument(format!("Expected KEY=VALUE, got '{}'", assignment))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(FlowError::InvalidArgument(format!(
                "Empty key in '{}'",
                assignment
            )));
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        fields.insert(key.to_string(), value);
    }
    Ok(fields)
}
