// crates/ms_population/src/partition/mod.rs

//! 分区与访问器

pub mod accessors;
pub mod cached;
pub mod store;

pub use accessors::{AllCategories, CategoriesAccessor, CombinedCategoriesAccessor};
pub use cached::{CachedCategories, CachedCombinedCategories, CategorySnapshot, PartitionCache};
pub use store::{CategoryId, Partition};
