// crates/ms_population/src/partition/cached.rs

//! 分区快照
//!
//! 派生量在死亡块之前缓存一次类别状态，块结束后与当前状态插值；
//! 初始化阶段用 [`PartitionCache`] 保存和恢复整个分区。

use ms_runtime::{AgeTotal, RuntimeScalar};

use super::accessors::{CategoriesAccessor, CombinedCategoriesAccessor};
use super::store::Partition;
use crate::category::Category;

/// 单个类别的深拷贝
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySnapshot<S: RuntimeScalar> {
    /// 名称
    pub name: String,
    /// 最小年龄
    pub min_age: u32,
    /// 最大年龄
    pub max_age: u32,
    /// 数量；缓存年份中无效的类别为空
    pub data: Vec<S>,
}

impl<S: RuntimeScalar> CategorySnapshot<S> {
    fn capture(category: &Category<S>, year: u32) -> Self {
        let data = if category.is_valid_in(year) {
            category.data().to_vec()
        } else {
            Vec::new()
        };
        Self {
            name: category.name().to_string(),
            min_age: category.min_age(),
            max_age: category.max_age(),
            data,
        }
    }

    /// 总数量
    pub fn total(&self) -> S {
        AgeTotal::of(&self.data)
    }
}

/// 一组类别的快照
#[derive(Debug, Clone)]
pub struct CachedCategories<S: RuntimeScalar> {
    accessor: CategoriesAccessor,
    snapshots: Vec<CategorySnapshot<S>>,
    year: Option<u32>,
}

impl<S: RuntimeScalar> CachedCategories<S> {
    /// 基于访问器创建（尚未缓存）
    pub fn new(accessor: CategoriesAccessor) -> Self {
        Self {
            accessor,
            snapshots: Vec::new(),
            year: None,
        }
    }

    /// 深拷贝当前状态
    pub fn build_cache(&mut self, partition: &Partition<S>, year: u32) {
        self.snapshots = self
            .accessor
            .ids()
            .iter()
            .map(|&id| CategorySnapshot::capture(partition.get(id), year))
            .collect();
        self.year = Some(year);
    }

    /// 快照，与访问器位置一一对应
    pub fn snapshots(&self) -> &[CategorySnapshot<S>] {
        &self.snapshots
    }

    /// 某位置的快照
    pub fn get(&self, position: usize) -> Option<&CategorySnapshot<S>> {
        self.snapshots.get(position)
    }

    /// 缓存年份
    pub fn year(&self) -> Option<u32> {
        self.year
    }
}

/// 按组的快照
#[derive(Debug, Clone)]
pub struct CachedCombinedCategories<S: RuntimeScalar> {
    accessor: CombinedCategoriesAccessor,
    groups: Vec<Vec<CategorySnapshot<S>>>,
}

impl<S: RuntimeScalar> CachedCombinedCategories<S> {
    /// 基于组访问器创建
    pub fn new(accessor: CombinedCategoriesAccessor) -> Self {
        Self {
            accessor,
            groups: Vec::new(),
        }
    }

    /// 深拷贝当前状态
    pub fn build_cache(&mut self, partition: &Partition<S>, year: u32) {
        self.groups = (0..self.accessor.group_count())
            .map(|g| {
                self.accessor
                    .group_ids(g)
                    .iter()
                    .map(|&id| CategorySnapshot::capture(partition.get(id), year))
                    .collect()
            })
            .collect();
    }

    /// 某组的快照
    pub fn group(&self, group: usize) -> &[CategorySnapshot<S>] {
        self.groups.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 组数
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

/// 整个分区的数据副本
#[derive(Debug, Clone, Default)]
pub struct PartitionCache<S: RuntimeScalar> {
    data: Vec<Vec<S>>,
}

impl<S: RuntimeScalar> PartitionCache<S> {
    /// 拷贝当前分区
    pub fn capture(partition: &Partition<S>) -> Self {
        Self {
            data: partition.iter().map(|c| c.data().to_vec()).collect(),
        }
    }

    /// 写回分区
    pub fn restore(&self, partition: &mut Partition<S>) {
        for (category, data) in partition.iter_mut().zip(&self.data) {
            category.data_mut().copy_from_slice(data);
        }
    }

    /// 各类别的数据
    pub fn data(&self) -> &[Vec<S>] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_partition;

    #[test]
    fn test_snapshot_is_deep_copy() {
        let mut p = test_partition();
        p.category_mut("immature.male").unwrap().data_mut()[0] = 100.0;
        let accessor = CategoriesAccessor::new(&p, &["immature.male".to_string()]).unwrap();
        let mut cached = CachedCategories::new(accessor);
        cached.build_cache(&p, 1990);
        p.category_mut("immature.male").unwrap().data_mut()[0] = 1.0;
        assert_eq!(cached.get(0).unwrap().data[0], 100.0);
        assert_eq!(cached.year(), Some(1990));
    }

    #[test]
    fn test_invalid_year_gives_empty_slot() {
        let p = test_partition();
        let accessor = CategoriesAccessor::new(&p, &["immature.male".to_string()]).unwrap();
        let mut cached = CachedCategories::new(accessor);
        cached.build_cache(&p, 2050);
        assert!(cached.get(0).unwrap().data.is_empty());
    }

    #[test]
    fn test_partition_cache_restore() {
        let mut p = test_partition();
        p.category_mut("immature.female").unwrap().data_mut()[2] = 7.0;
        let cache = PartitionCache::capture(&p);
        p.reset();
        cache.restore(&mut p);
        assert_eq!(p.category("immature.female").unwrap().data()[2], 7.0);
    }

    #[test]
    fn test_combined_cache_groups() {
        let mut p = test_partition();
        p.category_mut("immature.male").unwrap().data_mut()[0] = 3.0;
        p.category_mut("immature.female").unwrap().data_mut()[0] = 4.0;
        let accessor =
            CombinedCategoriesAccessor::new(&p, &["immature.male+immature.female".to_string()]).unwrap();
        let mut cached = CachedCombinedCategories::new(accessor);
        cached.build_cache(&p, 1991);
        assert_eq!(cached.group_count(), 1);
        let total: f64 = cached.group(0).iter().map(CategorySnapshot::total).sum();
        assert_eq!(total, 7.0);
    }
}
