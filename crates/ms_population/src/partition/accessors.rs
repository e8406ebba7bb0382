// crates/ms_population/src/partition/accessors.rs

//! 分区访问器
//!
//! 过程与派生量不直接持有类别，而是在 build 阶段把类别标签解析为
//! 访问器，执行期按当前年份过滤无效类别。

use ms_foundation::MsResult;
use ms_runtime::{AgeTotal, RuntimeScalar};

use super::store::{CategoryId, Partition};
use crate::category::Category;

// =============================================================================
// CategoriesAccessor
// =============================================================================

/// 按名称访问一组类别
#[derive(Debug, Clone, Default)]
pub struct CategoriesAccessor {
    ids: Vec<CategoryId>,
    names: Vec<String>,
}

impl CategoriesAccessor {
    /// 解析类别名称
    pub fn new<S: RuntimeScalar>(partition: &Partition<S>, names: &[String]) -> MsResult<Self> {
        let ids = names
            .iter()
            .map(|n| partition.resolve(n))
            .collect::<MsResult<Vec<_>>>()?;
        Ok(Self {
            ids,
            names: names.to_vec(),
        })
    }

    /// 类别 id（含当年无效的类别）
    pub fn ids(&self) -> &[CategoryId] {
        &self.ids
    }

    /// 类别名称
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// 类别数量
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// 遍历当年有效的类别，返回 (在访问器中的位置, 类别)
    pub fn iter<'a, S: RuntimeScalar>(
        &'a self,
        partition: &'a Partition<S>,
        year: u32,
    ) -> impl Iterator<Item = (usize, &'a Category<S>)> + 'a {
        self.ids
            .iter()
            .enumerate()
            .map(move |(i, &id)| (i, partition.get(id)))
            .filter(move |(_, c)| c.is_valid_in(year))
    }

    /// 对当年有效的类别逐个执行可变操作
    pub fn for_each_mut<S, F>(&self, partition: &mut Partition<S>, year: u32, mut f: F) -> MsResult<()>
    where
        S: RuntimeScalar,
        F: FnMut(usize, &mut Category<S>) -> MsResult<()>,
    {
        for (i, &id) in self.ids.iter().enumerate() {
            let category = partition.get_mut(id);
            if category.is_valid_in(year) {
                f(i, category)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// CombinedCategoriesAccessor
// =============================================================================

/// 按组访问类别，组标签用 `+` 连接多个类别
#[derive(Debug, Clone, Default)]
pub struct CombinedCategoriesAccessor {
    groups: Vec<Vec<CategoryId>>,
    labels: Vec<String>,
}

impl CombinedCategoriesAccessor {
    /// 解析组标签
    pub fn new<S: RuntimeScalar>(partition: &Partition<S>, labels: &[String]) -> MsResult<Self> {
        let mut groups = Vec::with_capacity(labels.len());
        for label in labels {
            let ids = label
                .split('+')
                .map(|n| partition.resolve(n.trim()))
                .collect::<MsResult<Vec<_>>>()?;
            groups.push(ids);
        }
        Ok(Self {
            groups,
            labels: labels.to_vec(),
        })
    }

    /// 组数
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// 组标签
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// 组内的全部类别 id
    pub fn group_ids(&self, group: usize) -> &[CategoryId] {
        self.groups.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 组内当年有效的类别，无效类别被省略
    pub fn group<'a, S: RuntimeScalar>(
        &'a self,
        partition: &'a Partition<S>,
        year: u32,
        group: usize,
    ) -> Vec<&'a Category<S>> {
        self.group_ids(group)
            .iter()
            .map(|&id| partition.get(id))
            .filter(|c| c.is_valid_in(year))
            .collect()
    }

    /// 全部组
    pub fn groups<'a, S: RuntimeScalar>(
        &'a self,
        partition: &'a Partition<S>,
        year: u32,
    ) -> Vec<Vec<&'a Category<S>>> {
        (0..self.groups.len())
            .map(|g| self.group(partition, year, g))
            .collect()
    }

    /// 组内当年有效类别的数量之和
    pub fn group_total<S: RuntimeScalar>(&self, partition: &Partition<S>, year: u32, group: usize) -> S {
        self.group(partition, year, group)
            .into_iter()
            .map(Category::total)
            .collect::<AgeTotal<S>>()
            .total()
    }
}

// =============================================================================
// AllCategories
// =============================================================================

/// 不按年份过滤的全分区视图
#[derive(Debug, Clone, Default)]
pub struct AllCategories {
    ids: Vec<CategoryId>,
}

impl AllCategories {
    /// 覆盖分区中的全部类别
    pub fn new<S: RuntimeScalar>(partition: &Partition<S>) -> Self {
        Self {
            ids: (0..partition.len()).map(CategoryId).collect(),
        }
    }

    /// 遍历
    pub fn iter<'a, S: RuntimeScalar>(
        &'a self,
        partition: &'a Partition<S>,
    ) -> impl Iterator<Item = &'a Category<S>> + 'a {
        self.ids.iter().map(move |&id| partition.get(id))
    }

    /// 类别数量
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
