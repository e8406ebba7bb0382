// crates/ms_population/src/time_step/mod.rs

//! 时间步
//!
//! 一年由若干时间步组成，每个时间步按顺序执行过程。连续的死亡过程组成
//! 死亡块，派生量与观测者订阅块的前后两个时刻。

pub mod manager;
pub mod schedule;

pub use manager::TimeStepManager;
pub use schedule::{MortalityBlock, ProcessSchedule, TimeStep};
