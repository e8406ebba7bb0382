// crates/ms_population/src/category/mod.rs

//! 类别：分区的基本单元与类别定义

pub mod definitions;
pub mod record;

pub use definitions::{CategoryDefinition, CategoryDefinitions};
pub use record::Category;
