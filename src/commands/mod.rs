//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑，以及构建类命令共用的配置解析和输出。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `config/`, `workflow/`, `utils/`
//! - 子模块: csld, vasp, inspect, tag

pub mod csld;
pub mod inspect;
pub mod tag;
pub mod vasp;

use crate::cli::common::{OutputArgs, RunConfigArgs};
use crate::cli::Commands;
use crate::config::{IncarOverrides, RunConfig};
use crate::error::{FlowError, Result};
use crate::models::Workflow;
use crate::utils::output;
use crate::workflow::{add_tags, FileLaunchPad, LaunchPad};

use std::fs;
use std::path::Path;
use tracing::debug;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Csld(args) => csld::execute(args),
        Commands::Single(args) => vasp::execute(args, vasp::Mode::Single),
        Commands::Double(args) => vasp::execute(args, vasp::Mode::Double),
        Commands::Inspect(args) => inspect::execute(args),
        Commands::Tag(args) => tag::execute(args),
    }
}

/// 按 默认值 < 配置文件 < 命令行 的顺序得到运行配置
pub(crate) fn resolve_run_config(args: &RunConfigArgs) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };

    if let Some(cmd) = &args.vasp_cmd {
        config.vasp_cmd = cmd.clone();
    }
    if let Some(db) = &args.db_file {
        config.db_file = db.clone();
    }

    let mut cli_incar = IncarOverrides::default();
    for assignment in &args.incar {
        cli_incar.parse_assignment(assignment)?;
    }
    config.user_incar_settings = config.user_incar_settings.layered(&cli_incar);
    if !config.user_incar_settings.is_empty() {
        output::print_info(&format!(
            "INCAR overrides: {}",
            serde_json::to_string(&config.user_incar_settings)?
        ));
    }

    config.validate()?;

    let incar = config.incar_settings();
    debug!(
        vasp_cmd = %config.vasp_cmd,
        db_file = %config.db_file,
        encut = incar.encut,
        ediff = incar.ediff,
        prec = %incar.prec,
        "resolved run configuration"
    );
    Ok(config)
}

/// 打标签、保存/提交工作流，并打印摘要
pub(crate) fn emit_workflow(workflow: Workflow, out: &OutputArgs) -> Result<()> {
    let workflow = add_tags(workflow, &out.tags);
    print_summary(&workflow);

    if let Some(path) = &out.output {
        write_workflow(&workflow, path)?;
        output::print_success(&format!("Workflow written to '{}'", path.display()));
    }

    if let Some(dir) = &out.launchpad {
        let mut lpad = FileLaunchPad::open(dir)?;
        let id = lpad.add_wf(&workflow)?;
        output::print_success(&format!(
            "Added to launchpad '{}' as {}",
            lpad.root().display(),
            id
        ));
    }

    if out.output.is_none() && out.launchpad.is_none() {
        output::print_warning("No --output or --launchpad given, printing workflow JSON");
        println!("{}", workflow.to_json()?);
    }
    Ok(())
}

/// 打印工作流摘要
pub(crate) fn print_summary(workflow: &Workflow) {
    let meta = workflow.metadata();
    output::print_field("Name", workflow.name());
    output::print_field("Type", &meta.wf_name);
    output::print_field("UUID", &meta.wf_uuid);
    if workflow.is_empty() {
        output::print_warning("Workflow contains no tasks");
        return;
    }
    output::print_field("Tasks", &workflow.len().to_string());
    output::print_field("Entry tasks", &workflow.roots().len().to_string());
    output::print_field("Final tasks", &workflow.leaves().len().to_string());
    if !meta.tags.is_empty() {
        output::print_field("Tags", &meta.tags.join(", "));
    }
}

pub(crate) fn read_workflow(path: &Path) -> Result<Workflow> {
    if !path.exists() {
        return Err(FlowError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = fs::read_to_string(path).map_err(|e| FlowError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    Workflow::from_json(&content)
}

pub(crate) fn write_workflow(workflow: &Workflow, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| FlowError::FileWriteError {
            path: parent.display().to_string(),
            source: e,
        })?;
    }
    fs::write(path, workflow.to_json()?).map_err(|e| FlowError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Precision;

    fn run_args(config: Option<&Path>, incar: &[&str]) -> RunConfigArgs {
        RunConfigArgs {
            config: config.map(Path::to_path_buf),
            vasp_cmd: None,
            db_file: Some("cli-db.json".to_string()),
            incar: incar.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_cli_layers_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(
            &path,
            "vasp_cmd = \"srun vasp_std\"\ndb_file = \"file-db.json\"\n\n[user_incar_settings]\nENCUT = 600\nPREC = \"Normal\"\n",
        )
        .unwrap();

        let config = resolve_run_config(&run_args(Some(&path), &["ENCUT=800"])).unwrap();
        assert_eq!(config.vasp_cmd, "srun vasp_std");
        assert_eq!(config.db_file, "cli-db.json");

        let incar = config.incar_settings();
        assert_eq!(incar.encut, 800.0);
        assert_eq!(incar.prec, Precision::Normal);
    }

    #[test]
    fn test_unknown_cli_incar_key() {
        let err = resolve_run_config(&run_args(None, &["NSW=0"])).unwrap_err();
        assert!(matches!(err, FlowError::ConfigurationError(_)));
    }

    #[test]
    fn test_workflow_file_round_trip() {
        use crate::models::{Atom, Crystal, Lattice};

        let dir = tempfile::tempdir().unwrap();
        let lattice = Lattice::from_parameters(4.0, 4.0, 4.0, 90.0, 90.0, 90.0);
        let crystal = Crystal::new("Cu", lattice, vec![Atom::new("Cu", [0.0, 0.0, 0.0])]);
        let wf = crate::workflow::single_vasp(&crystal, &RunConfig::default()).unwrap();

        let path = dir.path().join("nested").join("wf.json");
        write_workflow(&wf, &path).unwrap();
        assert_eq!(read_workflow(&path).unwrap(), wf);
        assert!(read_workflow(&dir.path().join("absent.json")).is_err());
    }
}
