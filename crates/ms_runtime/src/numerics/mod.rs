// crates/ms_runtime/src/numerics/mod.rs

//! 数值算法库（泛型实现）

pub mod age_total;
pub mod zero_fun;

pub use age_total::AgeTotal;
pub use zero_fun::{zero_fun, zero_fun_with, ZERO_FUN_DELTA};
