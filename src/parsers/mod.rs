//! # 结构读取模块
//!
//! 按文件名推断格式读取母结构。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: poscar

pub mod poscar;

use crate::error::{FlowError, Result};
use crate::models::Crystal;

use std::fs;
use std::path::Path;

/// 从文件路径推断格式并解析
///
/// - `*.json`：序列化的 `Crystal`
/// - `POSCAR*` / `CONTCAR*` / `*.vasp`：VASP 结构文件
pub fn parse_structure_file(path: &Path) -> Result<Crystal> {
    if !path.exists() {
        return Err(FlowError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

    match ext.as_str() {
        "json" => {
            let content = fs::read_to_string(path).map_err(|e| FlowError::FileReadError {
                path: path.display().to_string(),
                source: e,
            })?;
            serde_json::from_str(&content).map_err(|e| FlowError::ParseError {
                format: "json".to_string(),
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        }
        "vasp" | "poscar" => poscar::parse_poscar_file(path),
        _ if file_name.starts_with("POSCAR") || file_name.starts_with("CONTCAR") => {
            poscar::parse_poscar_file(path)
        }
        _ => Err(FlowError::UnsupportedFormat(format!(
            "Cannot determine format for: {}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Lattice};

    #[test]
    fn test_dispatch_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let lattice = Lattice::from_parameters(4.0, 4.0, 4.0, 90.0, 90.0, 90.0);
        let crystal = Crystal::new("Cu", lattice, vec![Atom::new("Cu", [0.0, 0.0, 0.0])]);

        let json_path = dir.path().join("cu.json");
        fs::write(&json_path, serde_json::to_string(&crystal).unwrap()).unwrap();
        assert_eq!(parse_structure_file(&json_path).unwrap(), crystal);

        let poscar_path = dir.path().join("CONTCAR_relaxed");
        poscar::write_poscar_file(&crystal, &poscar_path).unwrap();
        assert_eq!(parse_structure_file(&poscar_path).unwrap().formula(), "Cu");

        let other = dir.path().join("cu.xyz");
        fs::write(&other, "1\n").unwrap();
        assert!(matches!(
            parse_structure_file(&other),
            Err(FlowError::UnsupportedFormat(_))
        ));

        assert!(matches!(
            parse_structure_file(&dir.path().join("missing.vasp")),
            Err(FlowError::FileNotFound { .. })
        ));
    }
}
