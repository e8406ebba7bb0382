// crates/ms_config/src/lib.rs

//! MariStock Config Layer (Layer 4)
//!
//! 配置层，提供精度选择、模型配置和运行时多态接口。
//! 本层完全无泛型，使用 `Precision` 枚举进行运行时精度分发。
//!
//! # 模块概览
//!
//! - [`precision`]: Precision 枚举（F32/F64）
//! - [`model_config`]: ModelConfig 模型配置根节点（全 f64）
//! - [`process_config`]: 过程配置
//! - [`phase_config`]: 初始化阶段配置
//! - [`collaborator_config`]: 选择性、生长模型、派生量、惩罚项配置
//! - [`dyn_model`]: DynModel trait 运行时多态接口
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! Layer 5: ms_cli        ─> uses ModelConfig, DynModel
//! Layer 4: ms_config     ─> Precision, ModelConfig, DynModel (本层)
//! Layer 3: ms_population ─> impl DynModel for Model<S>
//! Layer 2: ms_runtime    ─> RuntimeScalar
//! Layer 1: ms_foundation ─> MsError
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collaborator_config;
pub mod dyn_model;
pub mod error;
pub mod model_config;
pub mod phase_config;
pub mod precision;
pub mod process_config;

/// 层级标识
pub const LAYER: u8 = 4;

pub use collaborator_config::{
    AgeLengthConfig, DerivedQuantityConfig, DerivedQuantitySettings, PenaltyConfig,
    ProportionMethod, SelectivityConfig,
};
pub use dyn_model::{DerivedQuantitySeries, DynModel, ModelRunError, RunSummary};
pub use error::ConfigError;
pub use model_config::{CategoriesConfig, ModelConfig, ModelSection, TimeStepConfig};
pub use phase_config::{
    CinitialPhaseConfig, DerivedPhaseConfig, InitialisationPhaseConfig, IterativePhaseConfig,
    StateInjectionPhaseConfig, TableRow,
};
pub use precision::Precision;
pub use process_config::{
    AgeingConfig, FisheryConfig, MaturationConfig, MortalityConstantRateConfig,
    MortalityEventBiomassConfig, MortalityInstantaneousConfig, NopConfig, ProcessConfig,
    RecruitmentBevertonHoltConfig, RecruitmentConstantConfig, StateInjectionConfig,
    TransitionCategoryConfig,
};
