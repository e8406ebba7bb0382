// crates/ms_population/src/model/mod.rs

//! 模型：信息、核心状态、驱动与动态接口

pub mod core;
pub mod driver;
pub mod dyn_impl;
pub mod info;

pub use self::core::ModelCore;
pub use driver::Model;
pub use dyn_impl::build_dyn_model;
pub use info::{ModelInfo, ModelState};
