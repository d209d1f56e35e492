//! # 运行配置
//!
//! 每个分支共用的运行配置：VASP 命令、数据库描述符、INCAR 覆盖。
//! 配置以显式参数传入构建器，不存在进程级的全局默认值。
//!
//! 优先级：内置默认值 < TOML 文件 < 命令行参数。
//!
//! ```toml
//! vasp_cmd = "mpirun -np 32 vasp_std"
//! db_file = "/home/user/db.json"
//!
//! [user_incar_settings]
//! ENCUT = 520
//! PREC = "Normal"
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/`、`tasks/factory.rs`、`workflow/` 使用
//! - 子模块: incar

mod incar;

pub use incar::{IncarOverrides, IncarSettings, Precision};

use crate::error::{FlowError, Result};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 由执行端 worker 在运行时解析的 VASP 命令占位符
pub const DEFAULT_VASP_CMD: &str = ">>vasp_cmd<<";

/// 由执行端 worker 在运行时解析的数据库描述符占位符
pub const DEFAULT_DB_FILE: &str = ">>db_file<<";

/// 运行配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// VASP 调用命令
    pub vasp_cmd: String,

    /// 数据库连接描述符，原样传递给入库任务
    pub db_file: String,

    /// 对静态计算 INCAR 默认值的覆盖
    pub user_incar_settings: IncarOverrides,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            vasp_cmd: DEFAULT_VASP_CMD.to_string(),
            db_file: DEFAULT_DB_FILE.to_string(),
            user_incar_settings: IncarOverrides::default(),
        }
    }
}

impl RunConfig {
    /// 从 TOML 文本解析，未知键报 `ConfigurationError`
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| FlowError::ConfigurationError(e.to_string()))
    }

    /// 从 TOML 文件读取
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| FlowError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            FlowError::ConfigurationError(reason) => {
                FlowError::ConfigurationError(format!("{}: {}", path.display(), reason))
            }
            other => other,
        })
    }

    /// 力常数静态计算的最终 INCAR 设置
    pub fn incar_settings(&self) -> IncarSettings {
        IncarSettings::default().with_overrides(&self.user_incar_settings)
    }

    /// 检查相互冲突或无意义的取值
    pub fn validate(&self) -> Result<()> {
        if self.vasp_cmd.trim().is_empty() {
            return Err(FlowError::ConfigurationError(
                "vasp_cmd must not be empty".to_string(),
            ));
        }
        if self.db_file.trim().is_empty() {
            return Err(FlowError::ConfigurationError(
                "db_file must not be empty".to_string(),
            ));
        }

        let incar = self.incar_settings();
        if !(incar.encut > 0.0) {
            return Err(FlowError::ConfigurationError(format!(
                "ENCUT must be positive, got {}",
                incar.encut
            )));
        }
        if !(incar.ediff > 0.0) {
            return Err(FlowError::ConfigurationError(format!(
                "EDIFF must be positive, got {}",
                incar.ediff
            )));
        }
        Ok(())
    }
}
