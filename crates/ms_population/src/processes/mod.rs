// crates/ms_population/src/processes/mod.rs

//! 过程族
//!
//! 每个过程实现 [`Process`]，由 [`ProcessRegistry`] 持有并按时间步执行。
//!
//! | 类型 | 说明 |
//! |------|------|
//! | `ageing` | 年龄平移 |
//! | `recruitment_constant` | 恒定补充 |
//! | `recruitment_beverton_holt` | 亲体-补充关系与年级强度 |
//! | `mortality_constant_rate` | 恒定自然死亡 |
//! | `mortality_event_biomass` | 按生物量捕捞 |
//! | `mortality_instantaneous` | 自然死亡 + 多渔业 |
//! | `transition_category` | 类别转移 |
//! | `maturation` | 性成熟 |
//! | `state_injection` | 状态覆盖 |
//! | `nop` | 空过程 |

pub mod ageing;
pub mod common;
pub mod factory;
pub mod maturation;
pub mod mortality_constant_rate;
pub mod mortality_event_biomass;
pub mod mortality_instantaneous;
pub mod nop;
pub mod recruitment_beverton_holt;
pub mod recruitment_constant;
pub mod registry;
pub mod state_injection;
pub mod traits;
pub mod transition_category;

pub use ageing::Ageing;
pub use factory::create_process;
pub use maturation::Maturation;
pub use mortality_constant_rate::MortalityConstantRate;
pub use mortality_event_biomass::MortalityEventBiomass;
pub use mortality_instantaneous::MortalityInstantaneous;
pub use nop::Nop;
pub use recruitment_beverton_holt::RecruitmentBevertonHolt;
pub use recruitment_constant::RecruitmentConstant;
pub use registry::{Lifecycle, ProcessId, ProcessRegistry};
pub use state_injection::StateInjection;
pub use traits::{BuildContext, Process, ProcessContext, ProcessOrderEntry, ProcessType};
pub use transition_category::TransitionCategory;
