// crates/ms_runtime/src/lib.rs

//! MariStock Runtime Layer (Layer 2)
//!
//! 运行时抽象层，提供标量类型抽象与数值工具。
//!
//! # 模块概览
//!
//! - [`scalar`]: RuntimeScalar trait（f32/f64 已实现，可扩展自动微分类型）
//! - [`numerics`]: ZeroFun 近零替换、年龄向量补偿累加
//!
//! # 层级架构
//!
//! ```text
//! Layer 5: ms_cli        ─> 命令行
//! Layer 4: ms_config     ─> Precision, ModelConfig, DynModel
//! Layer 3: ms_population ─> Model<S: RuntimeScalar>
//! Layer 2: ms_runtime    ─> RuntimeScalar, numerics (本层)
//! Layer 1: ms_foundation ─> MsError
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod numerics;
pub mod scalar;

/// 层级标识
pub const LAYER: u8 = 2;

pub use numerics::{zero_fun, AgeTotal};
pub use scalar::RuntimeScalar;

/// Prelude 模块
pub mod prelude {
    //! 常用类型预导入
    pub use crate::numerics::{zero_fun, zero_fun_with, AgeTotal};
    pub use crate::RuntimeScalar;
}
