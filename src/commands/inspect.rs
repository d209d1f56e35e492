//! # inspect 命令实现
//!
//! 加载工作流 JSON（加载即校验依赖图），打印摘要和按拓扑序排列的任务表。
//! 工作流既可以是单个文件，也可以是 LaunchPad 目录中的某个 UUID。
//!
//! ## 依赖关系
//! - 使用 `cli/inspect.rs` 定义的参数
//! - 使用 `models/workflow.rs`、`workflow/launchpad.rs`、`utils/output.rs`

use crate::cli::inspect::InspectArgs;
use crate::error::Result;
use crate::models::{Task, TaskAction, TaskId, Workflow};
use crate::utils::output;
use crate::workflow::FileLaunchPad;

use tabled::{Table, Tabled};

/// 任务表行
#[derive(Debug, Clone, Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: usize,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Parents")]
    parents: String,
    #[tabled(rename = "Children")]
    children: String,
}

impl TaskRow {
    fn new(task: &Task, children: &[TaskId]) -> Self {
        TaskRow {
            id: task.id.0,
            kind: match &task.action {
                TaskAction::WriteVaspInputs { input_set, .. } => {
                    format!("{} ({})", task.action.label(), input_set)
                }
                other => other.label().to_string(),
            },
            name: task.name.clone(),
            parents: join_ids(&task.parents),
            children: join_ids(children),
        }
    }
}

fn join_ids(ids: &[TaskId]) -> String {
    if ids.is_empty() {
        return "-".to_string();
    }
    ids.iter()
        .map(|id| id.0.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// 按拓扑序生成任务表
fn task_rows(workflow: &Workflow) -> Vec<TaskRow> {
    workflow
        .topological_order()
        .into_iter()
        .filter_map(|id| workflow.task(id))
        .map(|task| TaskRow::new(task, &workflow.children(task.id)))
        .collect()
}

/// 执行 inspect 命令
pub fn execute(args: InspectArgs) -> Result<()> {
    output::print_header("Workflow Inspection");

    let workflow = match &args.launchpad {
        Some(dir) => FileLaunchPad::open(dir)?.get_wf(&args.workflow.to_string_lossy())?,
        None => super::read_workflow(&args.workflow)?,
    };
    output::print_success(&format!(
        "'{}' is a valid task graph",
        args.workflow.display()
    ));
    super::print_summary(&workflow);

    if let Some(disps) = aggregated_displacements(&workflow) {
        output::print_field(
            "Displacements",
            &disps
                .iter()
                .map(|d| format!("{:.3}", d))
                .collect::<Vec<_>>()
                .join(" "),
        );
    }

    if !args.summary {
        println!();
        println!("{}", Table::new(task_rows(&workflow)));
    }
    Ok(())
}

/// 聚合任务中按分支顺序排列的位移
fn aggregated_displacements(workflow: &Workflow) -> Option<Vec<f64>> {
    workflow
        .tasks()
        .iter()
        .find_map(|t| t.action.displacements())
}
