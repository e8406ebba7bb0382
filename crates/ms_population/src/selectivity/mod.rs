// crates/ms_population/src/selectivity/mod.rs

//! 选择性
//!
//! 选择性是按年龄的纯函数，在 build 阶段对模型年龄范围预计算，
//! 执行期只做查表。

mod kinds;

use std::collections::HashMap;

use ms_config::SelectivityConfig;
use ms_foundation::{MsError, MsResult};
use ms_runtime::RuntimeScalar;
use tracing::debug;

use crate::model::ModelInfo;

pub use kinds::{create_selectivity, AgeTableSelectivity};

/// 选择性接口
pub trait Selectivity<S: RuntimeScalar>: Send + Sync {
    /// 标签
    fn label(&self) -> &str;

    /// 类型名
    fn type_name(&self) -> &'static str;

    /// 某年龄的选择性
    fn value(&self, age: u32) -> S;
}

/// 选择性索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectivityId(pub usize);

/// 选择性注册表
pub struct SelectivityRegistry<S: RuntimeScalar> {
    items: Vec<Box<dyn Selectivity<S>>>,
    index: HashMap<String, SelectivityId>,
}

impl<S: RuntimeScalar> Default for SelectivityRegistry<S> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<S: RuntimeScalar> SelectivityRegistry<S> {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 按配置构建全部选择性
    pub fn from_configs(configs: &[SelectivityConfig], info: &ModelInfo) -> MsResult<Self> {
        let mut registry = Self::new();
        for config in configs {
            registry.register(create_selectivity(config, info)?)?;
        }
        debug!("选择性注册完成: {} 个", registry.len());
        Ok(registry)
    }

    /// 注册
    pub fn register(&mut self, selectivity: Box<dyn Selectivity<S>>) -> MsResult<SelectivityId> {
        let label = selectivity.label().to_string();
        if self.index.contains_key(&label) {
            return Err(MsError::duplicate("selectivity", label));
        }
        let id = SelectivityId(self.items.len());
        self.items.push(selectivity);
        self.index.insert(label, id);
        Ok(id)
    }

    /// 标签解析
    pub fn resolve(&self, label: &str) -> MsResult<SelectivityId> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| MsError::unknown_label("selectivity", label))
    }

    /// 解析一组标签，单个标签广播到 `count` 个位置
    pub fn resolve_broadcast(&self, labels: &[String], count: usize, name: &str) -> MsResult<Vec<SelectivityId>> {
        let ids = labels
            .iter()
            .map(|l| self.resolve(l))
            .collect::<MsResult<Vec<_>>>()?;
        crate::processes::common::broadcast(ids, count, name)
    }

    /// 按 id 访问
    #[inline]
    pub fn get(&self, id: SelectivityId) -> &dyn Selectivity<S> {
        self.items[id.0].as_ref()
    }

    /// 某 id、某年龄的值
    #[inline]
    pub fn value(&self, id: SelectivityId, age: u32) -> S {
        self.items[id.0].value(age)
    }

    /// 数量
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
