// crates/ms_config/src/precision.rs

//! 运行时精度选择
//!
//! 应用层通过 `Precision` 枚举选择 f32/f64，配置层不引入泛型参数。

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 运行时精度枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// 单精度，适合大批量重复实现（bootstrap、模拟）
    F32,
    /// 双精度（默认），与参考结果逐位对比时使用
    #[default]
    F64,
}

impl Precision {
    /// 精度名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 精度解析错误
#[derive(Debug, Clone, thiserror::Error)]
#[error("无效的精度值: '{0}', 期望 'f32' 或 'f64'")]
pub struct PrecisionParseError(String);

impl FromStr for Precision {
    type Err = PrecisionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "f32" | "single" | "float" => Ok(Self::F32),
            "f64" | "double" => Ok(Self::F64),
            _ => Err(PrecisionParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_parse() {
        assert_eq!("F32".parse::<Precision>().unwrap(), Precision::F32);
        assert_eq!("double".parse::<Precision>().unwrap(), Precision::F64);
        assert!("half".parse::<Precision>().is_err());
        assert_eq!(Precision::default(), Precision::F64);
    }
}
