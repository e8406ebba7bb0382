// crates/ms_population/src/lib.rs

//! MariStock Population Layer (Layer 3)
//!
//! 年龄结构种群动态引擎：分区、过程、时间步、初始化阶段与派生量。
//!
//! # 模块概览
//!
//! - [`category`] / [`partition`]: 类别定义与按 (类别, 年龄) 保存数量的分区
//! - [`processes`]: 补充、老化、死亡、类别转移等过程
//! - [`time_step`]: 时间步内的过程顺序与死亡块订阅
//! - [`initialisation`]: 主循环之前的初始化阶段
//! - [`derived_quantity`]: 生物量/丰度等派生量及死亡块插值
//! - [`model`]: 模型驱动与 `DynModel` 实现
//!
//! # 运行流程
//!
//! ```text
//! Model::from_config ─> build ─> iterate
//!                                 ├─ 初始化阶段（每阶段若干次年循环）
//!                                 └─ start_year..=final_year
//!                                      └─ 每个时间步: 过程 + 订阅者
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod age_length;
pub mod category;
pub mod derived_quantity;
pub mod executor;
pub mod initialisation;
pub mod model;
pub mod partition;
pub mod penalty;
pub mod processes;
pub mod selectivity;
pub mod time_step;

#[cfg(test)]
mod test_support;

/// 层级标识
pub const LAYER: u8 = 3;

pub use derived_quantity::{DerivedQuantity, DerivedQuantityId, DerivedQuantityKind, DerivedQuantityRegistry};
pub use executor::{Executor, ExecutorContext, ExecutorHandle, ExecutorId, Hook};
pub use model::{build_dyn_model, Model, ModelCore, ModelInfo, ModelState};
pub use partition::{CategoryId, Partition};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::category::CategoryDefinitions;
    pub use crate::derived_quantity::{DerivedQuantity, DerivedQuantityKind};
    pub use crate::executor::{Executor, ExecutorContext, ExecutorHandle, Hook};
    pub use crate::model::{build_dyn_model, Model, ModelInfo, ModelState};
    pub use crate::partition::{
        AllCategories, CachedCategories, CategoriesAccessor, CombinedCategoriesAccessor, Partition, PartitionCache,
    };
    pub use crate::processes::{Process, ProcessType};
}
