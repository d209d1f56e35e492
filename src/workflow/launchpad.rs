//! # 工作流提交
//!
//! 构建好的工作流通过 `LaunchPad` 交给外部调度服务。
//! 自带的 `FileLaunchPad` 把每个工作流存为目录下的 `<wf_uuid>.json`，
//! 由下游提交程序读取。文档先写入同目录下的临时文件，写完后再以硬链接
//! 放到正式路径，因此正式路径上只会出现完整的文档。
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/workflow.rs`

use crate::error::{FlowError, Result};
use crate::models::Workflow;

use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// 外部调度服务的提交入口
pub trait LaunchPad {
    /// 提交工作流，返回其在调度端的标识
    fn add_wf(&mut self, workflow: &Workflow) -> Result<String>;
}

/// 基于目录的 LaunchPad
pub struct FileLaunchPad {
    root: PathBuf,
}

impl FileLaunchPad {
    /// 目录不存在时创建
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| FlowError::FileWriteError {
            path: root.display().to_string(),
            source: e,
        })?;
        Ok(FileLaunchPad { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, wf_uuid: &str) -> PathBuf {
        self.root.join(format!("{}.json", wf_uuid))
    }

    fn staging_path(&self, wf_uuid: &str) -> PathBuf {
        self.root.join(format!(".{}.json.partial", wf_uuid))
    }

    /// 按 UUID 读回已提交的工作流
    pub fn get_wf(&self, wf_uuid: &str) -> Result<Workflow> {
        let path = self.document_path(wf_uuid);
        if !path.exists() {
            return Err(FlowError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = fs::read_to_string(&path).map_err(|e| FlowError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        Workflow::from_json(&content)
    }
}

impl LaunchPad for FileLaunchPad {
    fn add_wf(&mut self, workflow: &Workflow) -> Result<String> {
        let wf_uuid = workflow.metadata().wf_uuid.clone();
        let path = self.document_path(&wf_uuid);
        let staging = self.staging_path(&wf_uuid);
        let json = workflow.to_json()?;

        let written = fs::write(&staging, json).map_err(|e| FlowError::FileWriteError {
            path: staging.display().to_string(),
            source: e,
        });
        // 硬链接在目标已存在时失败，同一 UUID 不允许重复提交
        let published = written.and_then(|()| {
            fs::hard_link(&staging, &path).map_err(|e| FlowError::FileWriteError {
                path: path.display().to_string(),
                source: e,
            })
        });
        let _ = fs::remove_file(&staging);
        published?;

        info!(wf_uuid = %wf_uuid, path = %path.display(), "workflow added to launchpad");
        Ok(wf_uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::models::{Atom, Crystal, Lattice};
    use crate::workflow::single_vasp;

    fn workflow() -> Workflow {
        let lattice = Lattice::from_parameters(4.0, 4.0, 4.0, 90.0, 90.0, 90.0);
        let crystal = Crystal::new("Cu", lattice, vec![Atom::new("Cu", [0.0, 0.0, 0.0])]);
        single_vasp(&crystal, &RunConfig::default()).unwrap()
    }

    #[test]
    fn test_add_and_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut lpad = FileLaunchPad::open(dir.path().join("lpad")).unwrap();

        let wf = workflow();
        let id = lpad.add_wf(&wf).unwrap();
        assert_eq!(id, wf.metadata().wf_uuid);
        assert_eq!(lpad.get_wf(&id).unwrap(), wf);
    }

    #[test]
    fn test_duplicate_submission_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut lpad = FileLaunchPad::open(dir.path()).unwrap();

        let wf = workflow();
        lpad.add_wf(&wf).unwrap();
        assert!(matches!(
            lpad.add_wf(&wf),
            Err(FlowError::FileWriteError { .. })
        ));
    }

    #[test]
    fn test_stale_staging_file_does_not_block_submission() {
        let dir = tempfile::tempdir().unwrap();
        let mut lpad = FileLaunchPad::open(dir.path()).unwrap();

        let wf = workflow();
        let id = wf.metadata().wf_uuid.clone();
        fs::write(lpad.staging_path(&id), "{\"truncated").unwrap();

        assert_eq!(lpad.add_wf(&wf).unwrap(), id);
        assert_eq!(lpad.get_wf(&id).unwrap(), wf);

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec![format!("{}.json", id)]);
    }

    #[test]
    fn test_missing_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let lpad = FileLaunchPad::open(dir.path()).unwrap();
        assert!(matches!(
            lpad.get_wf("nope"),
            Err(FlowError::FileNotFound { .. })
        ));
    }
}
