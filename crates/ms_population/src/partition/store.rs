// crates/ms_population/src/partition/store.rs

//! Partition - 全部类别的拥有者
//!
//! 类别以 arena 形式存放，名称到 [`CategoryId`] 的映射在 build 后不再变化。
//! 过程在 build 阶段把类别名解析为 id，执行期按 id 直接索引。

use std::collections::HashMap;

use ms_foundation::{MsError, MsResult};
use ms_runtime::{AgeTotal, RuntimeScalar};
use tracing::debug;

use crate::age_length::AgeLengthRegistry;
use crate::category::{Category, CategoryDefinitions};
use crate::model::ModelInfo;

/// 类别索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryId(pub usize);

impl From<usize> for CategoryId {
    fn from(idx: usize) -> Self {
        Self(idx)
    }
}

impl From<CategoryId> for usize {
    fn from(id: CategoryId) -> Self {
        id.0
    }
}

/// 种群分区
#[derive(Debug, Clone)]
pub struct Partition<S: RuntimeScalar> {
    categories: Vec<Category<S>>,
    index: HashMap<String, CategoryId>,
}

impl<S: RuntimeScalar> Partition<S> {
    /// 按类别定义构建分区，所有数量为零
    pub fn build(definitions: &CategoryDefinitions) -> MsResult<Self> {
        let mut categories = Vec::with_capacity(definitions.len());
        let mut index = HashMap::with_capacity(definitions.len());
        for def in definitions.definitions() {
            if def.name.is_empty() {
                return Err(MsError::config("类别名称不能为空"));
            }
            if def.min_age > def.max_age {
                return Err(MsError::invalid_config(
                    format!("{}.max_age", def.name),
                    def.max_age,
                    format!("不能小于 min_age ({})", def.min_age),
                ));
            }
            let id = CategoryId(categories.len());
            if index.insert(def.name.clone(), id).is_some() {
                return Err(MsError::duplicate("category", def.name.clone()));
            }
            categories.push(Category::new(
                def.name.clone(),
                def.min_age,
                def.max_age,
                def.years.clone(),
                def.age_length.clone(),
            ));
        }
        debug!("分区构建完成: {} 个类别", categories.len());
        Ok(Self { categories, index })
    }

    /// 全部数量清零
    pub fn reset(&mut self) {
        self.categories.iter_mut().for_each(Category::reset);
    }

    /// 按年龄-体长模型重建所有类别的体长/体重缓存
    pub fn rebuild_caches(&mut self, info: &ModelInfo, age_lengths: &AgeLengthRegistry<S>) -> MsResult<()> {
        for category in &mut self.categories {
            let model = match category.age_length() {
                Some(label) => Some(age_lengths.resolve(label)?),
                None => None,
            };
            category.rebuild_cache(info, model);
        }
        Ok(())
    }

    /// 类别数量
    #[inline]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// 构建期解析：未知名称为配置错误
    pub fn resolve(&self, name: &str) -> MsResult<CategoryId> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| MsError::unknown_label("category", name))
    }

    /// 运行期按名称访问：未知名称为内部错误
    pub fn category(&self, name: &str) -> MsResult<&Category<S>> {
        let id = self
            .index
            .get(name)
            .ok_or_else(|| MsError::UnknownCategory(name.to_string()))?;
        Ok(&self.categories[id.0])
    }

    /// 运行期按名称可变访问
    pub fn category_mut(&mut self, name: &str) -> MsResult<&mut Category<S>> {
        let id = *self
            .index
            .get(name)
            .ok_or_else(|| MsError::UnknownCategory(name.to_string()))?;
        Ok(&mut self.categories[id.0])
    }

    /// 按 id 访问
    #[inline]
    pub fn get(&self, id: CategoryId) -> &Category<S> {
        &self.categories[id.0]
    }

    /// 按 id 可变访问
    #[inline]
    pub fn get_mut(&mut self, id: CategoryId) -> &mut Category<S> {
        &mut self.categories[id.0]
    }

    /// 同时可变访问两个不同类别
    pub fn pair_mut(&mut self, a: CategoryId, b: CategoryId) -> MsResult<(&mut Category<S>, &mut Category<S>)> {
        if a == b {
            return Err(MsError::internal(format!(
                "类别 '{}' 不能同时作为来源和目标",
                self.categories[a.0].name()
            )));
        }
        if a.0 < b.0 {
            let (left, right) = self.categories.split_at_mut(b.0);
            Ok((&mut left[a.0], &mut right[0]))
        } else {
            let (left, right) = self.categories.split_at_mut(a.0);
            Ok((&mut right[0], &mut left[b.0]))
        }
    }

    /// 遍历全部类别
    pub fn iter(&self) -> impl Iterator<Item = &Category<S>> {
        self.categories.iter()
    }

    /// 遍历全部类别（可变）
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Category<S>> {
        self.categories.iter_mut()
    }

    /// 类别名称（按构建顺序）
    pub fn names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name()).collect()
    }

    /// 全部类别数量之和
    pub fn total(&self) -> S {
        self.categories.iter().map(Category::total).collect::<AgeTotal<S>>().total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_partition as partition;
    use ms_foundation::ErrorKind;

    #[test]
    fn test_build_zeroed() {
        let p = partition();
        assert_eq!(p.len(), 2);
        assert!(p.iter().all(|c| c.data().len() == 10 && c.total() == 0.0));
    }

    #[test]
    fn test_lookup_error_kinds() {
        let p = partition();
        assert_eq!(p.resolve("ghost").unwrap_err().kind(), ErrorKind::Configuration);
        assert_eq!(p.category("ghost").unwrap_err().kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_pair_mut() {
        let mut p = partition();
        let a = p.resolve("immature.male").unwrap();
        let b = p.resolve("immature.female").unwrap();
        {
            let (from, to) = p.pair_mut(b, a).unwrap();
            from.data_mut()[0] = 4.0;
            to.data_mut()[0] = 6.0;
        }
        assert_eq!(p.get(b).data()[0], 4.0);
        assert_eq!(p.get(a).data()[0], 6.0);
        assert!(p.pair_mut(a, a).is_err());
    }

    #[test]
    fn test_reset() {
        let mut p = partition();
        p.category_mut("immature.male").unwrap().data_mut()[3] = 10.0;
        assert_eq!(p.total(), 10.0);
        p.reset();
        assert_eq!(p.total(), 0.0);
    }
}
