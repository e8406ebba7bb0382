// crates/ms_foundation/src/lib.rs

//! MariStock Foundation Layer (Layer 1)
//!
//! 基础层，提供整个项目共享的错误类型与验证宏。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型 `MsError`、错误类别 `ErrorKind`
//!
//! # 设计原则
//!
//! 1. **最小依赖**: 仅依赖 thiserror
//! 2. **可分类**: 每个错误都可区分为配置错误、内部错误或运行期错误

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

/// 层级标识
pub const LAYER: u8 = 1;

pub use error::{ErrorKind, MsError, MsResult};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{ErrorKind, MsError, MsResult};
    pub use crate::ensure;
}
