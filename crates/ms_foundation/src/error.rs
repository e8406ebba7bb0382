// crates/ms_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `MsError` 枚举和 `MsResult` 类型别名，用于整个项目的错误处理。
//!
//! # 错误分类
//!
//! 每个错误变体都归属于一个 [`ErrorKind`]：
//!
//! 1. **Configuration**: 用户配置错误（未知标签、表格尺寸不符、参数越界），
//!    在 validate/build 阶段检出，运行不会开始
//! 2. **Internal**: 引擎内部不变量被破坏（按未知名称查找类别、生命周期误用），
//!    属于引擎缺陷而非用户错误
//! 3. **Runtime**: 运行期业务规则违反（死亡过程后出现负丰度等）
//!
//! # 示例
//!
//! ```
//! use ms_foundation::error::{ErrorKind, MsError, MsResult};
//!
//! fn read_r0(value: f64) -> MsResult<f64> {
//!     MsError::check_range("r0", value, 0.0, f64::MAX)?;
//!     Ok(value)
//! }
//!
//! let err = read_r0(-1.0).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Configuration);
//! ```

use thiserror::Error;

/// 统一结果类型
pub type MsResult<T> = Result<T, MsError>;

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 配置/验证错误（用户可修正）
    Configuration,
    /// 内部不变量违反（引擎缺陷）
    Internal,
    /// 运行期业务规则违反
    Runtime,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::Internal => "internal",
            Self::Runtime => "runtime",
        };
        write!(f, "{name}")
    }
}

/// MariStock 错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MsError {
    // ========================================================================
    // 配置错误
    // ========================================================================
    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 配置值无效
    #[error("配置值无效: {key}={value}, 原因: {reason}")]
    InvalidConfig {
        /// 配置键名
        key: String,
        /// 配置值
        value: String,
        /// 无效原因说明
        reason: String,
    },

    /// 标签无法解析
    #[error("未找到{kind}: '{label}'")]
    UnknownLabel {
        /// 对象类别（category、process、selectivity ...）
        kind: &'static str,
        /// 查找的标签
        label: String,
    },

    /// 标签重复
    #[error("{kind} '{label}' 重复定义")]
    Duplicate {
        /// 对象类别
        kind: &'static str,
        /// 重复的标签
        label: String,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: String,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 数据超出范围
    #[error("数据超出范围: {field}={value}, 期望范围=[{min}, {max}]")]
    OutOfRange {
        /// 字段名
        field: String,
        /// 实际值
        value: f64,
        /// 最小允许值
        min: f64,
        /// 最大允许值
        max: f64,
    },

    // ========================================================================
    // 内部错误
    // ========================================================================
    /// 按未知名称访问类别
    #[error("内部错误: 分区中不存在类别 '{0}'")]
    UnknownCategory(String),

    /// 生命周期误用
    #[error("内部错误: '{label}' 处于 {actual} 状态, 期望 {expected}")]
    Lifecycle {
        /// 对象标签
        label: String,
        /// 期望状态
        expected: &'static str,
        /// 实际状态
        actual: &'static str,
    },

    /// 内部错误
    #[error("内部错误: {message}")]
    Internal {
        /// 内部错误描述
        message: String,
    },

    // ========================================================================
    // 运行期错误
    // ========================================================================
    /// 过程执行后分区出现负值
    #[error("过程 '{process}' 执行后类别 '{category}' 年龄 {age} 出现负丰度 {value}")]
    NegativePartition {
        /// 过程标签
        process: String,
        /// 类别名称
        category: String,
        /// 年龄
        age: u32,
        /// 计算得到的值
        value: f64,
    },

    /// 运行时错误
    #[error("运行时错误: {0}")]
    Runtime(String),
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl MsError {
    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 配置值无效
    pub fn invalid_config(
        key: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// 标签无法解析
    pub fn unknown_label(kind: &'static str, label: impl Into<String>) -> Self {
        Self::UnknownLabel {
            kind,
            label: label.into(),
        }
    }

    /// 标签重复
    pub fn duplicate(kind: &'static str, label: impl Into<String>) -> Self {
        Self::Duplicate {
            kind,
            label: label.into(),
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name: name.into(),
            expected,
            actual,
        }
    }

    /// 数据超出范围
    pub fn out_of_range(field: impl Into<String>, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            field: field.into(),
            value,
            min,
            max,
        }
    }

    /// 生命周期误用
    pub fn lifecycle(label: impl Into<String>, expected: &'static str, actual: &'static str) -> Self {
        Self::Lifecycle {
            label: label.into(),
            expected,
            actual,
        }
    }

    /// 内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// 运行时错误
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }

    /// 错误所属类别
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. }
            | Self::InvalidConfig { .. }
            | Self::UnknownLabel { .. }
            | Self::Duplicate { .. }
            | Self::SizeMismatch { .. }
            | Self::OutOfRange { .. } => ErrorKind::Configuration,
            Self::UnknownCategory(_) | Self::Lifecycle { .. } | Self::Internal { .. } => {
                ErrorKind::Internal
            }
            Self::NegativePartition { .. } | Self::Runtime(_) => ErrorKind::Runtime,
        }
    }

    /// 是否为用户配置错误
    #[inline]
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl MsError {
    /// 检查数组大小是否匹配
    #[inline]
    pub fn check_size(name: &str, expected: usize, actual: usize) -> MsResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }

    /// 检查值是否在闭区间内
    #[inline]
    pub fn check_range(field: &str, value: f64, min: f64, max: f64) -> MsResult<()> {
        if value.is_nan() || value < min || value > max {
            Err(Self::out_of_range(field, value, min, max))
        } else {
            Ok(())
        }
    }
}

/// 条件不满足时返回错误
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return Err($err.into());
        }
    };
}

// ========================================================================
// 测试
// ========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MsError::config("测试配置错误");
        assert!(err.to_string().contains("配置错误"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            MsError::unknown_label("selectivity", "fishing_sel").kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            MsError::UnknownCategory("male".into()).kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            MsError::lifecycle("recruitment", "built", "validated").kind(),
            ErrorKind::Internal
        );
        assert_eq!(MsError::runtime("bad").kind(), ErrorKind::Runtime);
    }

    #[test]
    fn test_check_size() {
        assert!(MsError::check_size("proportions", 2, 2).is_ok());
        assert!(MsError::check_size("proportions", 2, 3).is_err());
    }

    #[test]
    fn test_check_range() {
        assert!(MsError::check_range("m", 0.065, 0.0, 1.0).is_ok());
        assert!(MsError::check_range("m", -0.1, 0.0, 1.0).is_err());
        assert!(MsError::check_range("m", f64::NAN, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_ensure_macro() {
        fn check(value: i32) -> MsResult<()> {
            ensure!(value > 0, MsError::config("value must be positive"));
            Ok(())
        }

        assert!(check(1).is_ok());
        assert!(check(-1).is_err());
    }
}
