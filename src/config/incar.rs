//! # INCAR 设置
//!
//! 静态计算使用的 INCAR 参数。`IncarSettings` 是完整的取值，
//! `IncarOverrides` 是只包含用户显式给出的键的部分覆盖。
//!
//! ## 依赖关系
//! - 被 `config/mod.rs` 和 `tasks/factory.rs` 使用

use crate::error::{FlowError, Result};

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// PREC 精度等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    Low,
    Medium,
    High,
    Normal,
    Single,
    Accurate,
}

impl FromStr for Precision {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Precision::Low),
            "medium" => Ok(Precision::Medium),
            "high" => Ok(Precision::High),
            "normal" => Ok(Precision::Normal),
            "single" => Ok(Precision::Single),
            "accurate" => Ok(Precision::Accurate),
            other => Err(FlowError::ConfigurationError(format!(
                "Unknown PREC value '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Precision::Low => "Low",
            Precision::Medium => "Medium",
            Precision::High => "High",
            Precision::Normal => "Normal",
            Precision::Single => "Single",
            Precision::Accurate => "Accurate",
        };
        write!(f, "{}", s)
    }
}

/// 力常数拟合所需的静态计算 INCAR 设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncarSettings {
    /// 额外的 FFT 精细网格
    #[serde(rename = "ADDGRID")]
    pub add_grid: bool,

    /// 是否输出 CHGCAR
    #[serde(rename = "LCHARG")]
    pub lcharg: bool,

    /// 平面波截断能 (eV)
    #[serde(rename = "ENCUT")]
    pub encut: f64,

    /// 电子步收敛判据 (eV)
    #[serde(rename = "EDIFF")]
    pub ediff: f64,

    #[serde(rename = "PREC")]
    pub prec: Precision,

    /// 是否输出全电子电荷密度 (AECCAR*)
    #[serde(rename = "LAECHG")]
    pub laechg: bool,

    /// 实空间投影
    #[serde(rename = "LREAL")]
    pub lreal: bool,

    /// PAW 球外梯度修正
    #[serde(rename = "LASPH")]
    pub lasph: bool,
}

impl Default for IncarSettings {
    fn default() -> Self {
        IncarSettings {
            add_grid: true,
            lcharg: false,
            encut: 700.0,
            ediff: 1e-7,
            prec: Precision::Accurate,
            laechg: false,
            lreal: false,
            lasph: true,
        }
    }
}

impl IncarSettings {
    /// 应用覆盖：显式给出的键优先，其余保持当前值
    pub fn with_overrides(&self, overrides: &IncarOverrides) -> IncarSettings {
        IncarSettings {
            add_grid: overrides.add_grid.unwrap_or(self.add_grid),
            lcharg: overrides.lcharg.unwrap_or(self.lcharg),
            encut: overrides.encut.unwrap_or(self.encut),
            ediff: overrides.ediff.unwrap_or(self.ediff),
            prec: overrides.prec.unwrap_or(self.prec),
            laechg: overrides.laechg.unwrap_or(self.laechg),
            lreal: overrides.lreal.unwrap_or(self.lreal),
            lasph: overrides.lasph.unwrap_or(self.lasph),
        }
    }
}

/// 用户给出的部分 INCAR 覆盖
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncarOverrides {
    #[serde(rename = "ADDGRID", default, skip_serializing_if = "Option::is_none")]
    pub add_grid: Option<bool>,

    #[serde(rename = "LCHARG", default, skip_serializing_if = "Option::is_none")]
    pub lcharg: Option<bool>,

    #[serde(rename = "ENCUT", default, skip_serializing_if = "Option::is_none")]
    pub encut: Option<f64>,

    #[serde(rename = "EDIFF", default, skip_serializing_if = "Option::is_none")]
    pub ediff: Option<f64>,

    #[serde(rename = "PREC", default, skip_serializing_if = "Option::is_none")]
    pub prec: Option<Precision>,

    #[serde(rename = "LAECHG", default, skip_serializing_if = "Option::is_none")]
    pub laechg: Option<bool>,

    #[serde(rename = "LREAL", default, skip_serializing_if = "Option::is_none")]
    pub lreal: Option<bool>,

    #[serde(rename = "LASPH", default, skip_serializing_if = "Option::is_none")]
    pub lasph: Option<bool>,
}

impl IncarOverrides {
    pub fn is_empty(&self) -> bool {
        *self == IncarOverrides::default()
    }

    /// 叠加另一层覆盖，`upper` 中给出的键优先
    pub fn layered(&self, upper: &IncarOverrides) -> IncarOverrides {
        IncarOverrides {
            add_grid: upper.add_grid.or(self.add_grid),
            lcharg: upper.lcharg.or(self.lcharg),
            encut: upper.encut.or(self.encut),
            ediff: upper.ediff.or(self.ediff),
            prec: upper.prec.or(self.prec),
            laechg: upper.laechg.or(self.laechg),
            lreal: upper.lreal.or(self.lreal),
            lasph: upper.lasph.or(self.lasph),
        }
    }

    /// 按 `KEY=VALUE` 形式设置一个键（键名不区分大小写）
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key.trim().to_uppercase().as_str() {
            "ADDGRID" => self.add_grid = Some(parse_bool(key, value)?),
            "LCHARG" => self.lcharg = Some(parse_bool(key, value)?),
            "ENCUT" => self.encut = Some(parse_float(key, value)?),
            "EDIFF" => self.ediff = Some(parse_float(key, value)?),
            "PREC" => self.prec = Some(value.parse()?),
            "LAECHG" => self.laechg = Some(parse_bool(key, value)?),
            "LREAL" => self.lreal = Some(parse_bool(key, value)?),
            "LASPH" => self.lasph = Some(parse_bool(key, value)?),
            other => {
                return Err(FlowError::ConfigurationError(format!(
                    "Unrecognized INCAR key '{}'",
                    other
                )))
            }
        }
        Ok(())
    }

    /// 解析 `KEY=VALUE` 赋值
    pub fn parse_assignment(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            FlowError::ConfigurationError(format!(
                "Expected KEY=VALUE, got '{}'",
                assignment
            ))
        })?;
        self.set(key, value)
    }
}

impl From<&IncarSettings> for IncarOverrides {
    fn from(s: &IncarSettings) -> Self {
        IncarOverrides {
            add_grid: Some(s.add_grid),
            lcharg: Some(s.lcharg),
            encut: Some(s.encut),
            ediff: Some(s.ediff),
            prec: Some(s.prec),
            laechg: Some(s.laechg),
            lreal: Some(s.lreal),
            lasph: Some(s.lasph),
        }
    }
}

/// VASP 风格的布尔值：`true`/`.TRUE.`/`T`
fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim_matches('.').to_lowercase().as_str() {
        "true" | "t" => Ok(true),
        "false" | "f" => Ok(false),
        _ => Err(FlowError::ConfigurationError(format!(
            "{} expects a boolean, got '{}'",
            key, value
        ))),
    }
}

fn parse_float(key: &str, value: &str) -> Result<f64> {
    value.parse().map_err(|_| {
        FlowError::ConfigurationError(format!("{} expects a number, got '{}'", key, value))
    })
}
