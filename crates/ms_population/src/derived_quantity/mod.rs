// crates/ms_population/src/derived_quantity/mod.rs

//! 派生量
//!
//! 派生量订阅所在时间步的死亡块：块开始前记录一次总量，块结束后再计算
//! 一次，并按时间步比例在两者之间插值：
//!
//! ```text
//! p == 0            → cache
//! p == 1            → value
//! weighted_sum      → cache + (value - cache) · p
//! weighted_product  → cache^(1-p) · value^p
//! ```
//!
//! 初始化期间的结果按阶段追加到列表，主年循环中按年份保存。

use std::collections::{BTreeMap, HashMap};

use ms_config::{DerivedQuantityConfig, DerivedQuantitySettings, ProportionMethod};
use ms_foundation::{MsError, MsResult};
use ms_runtime::{AgeTotal, RuntimeScalar};
use tracing::debug;

use crate::category::CategoryDefinitions;
use crate::executor::{Executor, ExecutorContext};
use crate::model::ModelInfo;
use crate::partition::{CategoriesAccessor, Partition};
use crate::selectivity::{SelectivityId, SelectivityRegistry};

/// 派生量种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedQuantityKind {
    /// Σ data · sel · mean_weight
    Biomass,
    /// Σ data · sel
    Abundance,
}

impl DerivedQuantityKind {
    /// 名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Biomass => "biomass",
            Self::Abundance => "abundance",
        }
    }
}

/// 派生量索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DerivedQuantityId(pub usize);

/// 在块前后两个值之间插值
#[inline]
pub fn interpolate<S: RuntimeScalar>(cache: S, value: S, proportion: S, method: ProportionMethod) -> S {
    if proportion == S::ZERO {
        return cache;
    }
    if proportion == S::ONE {
        return value;
    }
    match method {
        ProportionMethod::WeightedSum => cache + (value - cache) * proportion,
        ProportionMethod::WeightedProduct => cache.powf(S::ONE - proportion) * value.powf(proportion),
    }
}

/// 派生量
pub struct DerivedQuantity<S: RuntimeScalar> {
    label: String,
    kind: DerivedQuantityKind,
    settings: DerivedQuantitySettings,
    category_labels: Vec<String>,
    time_step: usize,
    start_year: u32,
    proportion: S,
    method: ProportionMethod,
    accessor: CategoriesAccessor,
    selectivities: Vec<SelectivityId>,
    cache_value: S,
    values: BTreeMap<u32, S>,
    initialisation_values: Vec<Vec<S>>,
}

impl<S: RuntimeScalar> DerivedQuantity<S> {
    /// 从配置创建并验证参数
    pub fn new(config: &DerivedQuantityConfig, definitions: &CategoryDefinitions, info: &ModelInfo) -> MsResult<Self> {
        let kind = match config {
            DerivedQuantityConfig::Biomass(_) => DerivedQuantityKind::Biomass,
            DerivedQuantityConfig::Abundance(_) => DerivedQuantityKind::Abundance,
        };
        let settings = config.settings();
        let label = settings.label.clone();
        let time_step = info
            .time_step_index(&settings.time_step)
            .ok_or_else(|| MsError::unknown_label("time_step", settings.time_step.clone()))?;
        MsError::check_range(
            &format!("{label}.time_step_proportion"),
            settings.time_step_proportion,
            0.0,
            1.0,
        )?;
        let category_labels = definitions.expand_labels(&settings.categories)?;
        if category_labels.is_empty() {
            return Err(MsError::invalid_config(format!("{label}.categories"), "[]", "至少需要一个类别"));
        }
        Ok(Self {
            label,
            kind,
            settings: settings.clone(),
            category_labels,
            time_step,
            start_year: info.start_year,
            proportion: S::from_config(settings.time_step_proportion),
            method: settings.time_step_proportion_method,
            accessor: CategoriesAccessor::default(),
            selectivities: Vec::new(),
            cache_value: S::ZERO,
            values: BTreeMap::new(),
            initialisation_values: vec![Vec::new(); info.initialisation_phase_labels.len()],
        })
    }

    /// 解析类别与选择性
    pub fn build(&mut self, partition: &Partition<S>, selectivities: &SelectivityRegistry<S>) -> MsResult<()> {
        self.accessor = CategoriesAccessor::new(partition, &self.category_labels)?;
        self.selectivities = selectivities.resolve_broadcast(
            &self.settings.selectivities,
            self.category_labels.len(),
            &format!("{}.selectivities", self.label),
        )?;
        Ok(())
    }

    /// 标签
    pub fn label(&self) -> &str {
        &self.label
    }

    /// 种类
    pub fn kind(&self) -> DerivedQuantityKind {
        self.kind
    }

    /// 所在时间步索引
    pub fn time_step(&self) -> usize {
        self.time_step
    }

    /// 块开始前记录的值
    pub fn cache_value(&self) -> S {
        self.cache_value
    }

    /// 逐年值
    pub fn values(&self) -> &BTreeMap<u32, S> {
        &self.values
    }

    /// 某年的值；早于起始年份时取最后一个初始化阶段的最后一个值
    pub fn value(&self, year: u32) -> Option<S> {
        if let Some(&value) = self.values.get(&year) {
            return Some(value);
        }
        if year < self.start_year {
            return self.last_value_up_to_phase(self.initialisation_values.len().checked_sub(1)?);
        }
        None
    }

    /// 某阶段记录的最后一个值
    pub fn last_value_from_initialisation(&self, phase: usize) -> Option<S> {
        self.initialisation_values.get(phase)?.last().copied()
    }

    /// 从 `phase` 向前查找第一个有记录的阶段，返回其最后一个值
    pub fn last_value_up_to_phase(&self, phase: usize) -> Option<S> {
        let end = phase.min(self.initialisation_values.len().checked_sub(1)?);
        (0..=end)
            .rev()
            .find_map(|p| self.initialisation_values[p].last().copied())
    }

    /// 某阶段第 `index` 个值
    pub fn initialisation_value(&self, phase: usize, index: usize) -> Option<S> {
        self.initialisation_values.get(phase)?.get(index).copied()
    }

    /// 某阶段的全部值
    pub fn initialisation_values(&self, phase: usize) -> &[S] {
        self.initialisation_values
            .get(phase)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 清除全部记录
    pub fn reset(&mut self) {
        self.cache_value = S::ZERO;
        self.values.clear();
        self.initialisation_values.iter_mut().for_each(Vec::clear);
    }

    fn compute(&self, ctx: &ExecutorContext<'_, S>) -> S {
        let year = ctx.info.current_year;
        let time_step = ctx.info.current_time_step;
        let mut total = AgeTotal::new();
        for (i, category) in self.accessor.iter(ctx.partition, year) {
            let selectivity = self.selectivities[i];
            for (offset, &value) in category.data().iter().enumerate() {
                let sel = ctx.selectivities.value(selectivity, category.min_age() + offset as u32);
                let weight = match self.kind {
                    DerivedQuantityKind::Biomass => sel * category.mean_weight(year, time_step, offset),
                    DerivedQuantityKind::Abundance => sel,
                };
                total.add_weighted(value, weight);
            }
        }
        total.total()
    }
}

impl<S: RuntimeScalar> Executor<S> for DerivedQuantity<S> {
    fn label(&self) -> &str {
        &self.label
    }

    fn pre_execute(&mut self, ctx: &ExecutorContext<'_, S>) -> MsResult<()> {
        self.cache_value = self.compute(ctx);
        Ok(())
    }

    fn execute(&mut self, ctx: &ExecutorContext<'_, S>) -> MsResult<()> {
        let value = interpolate(self.cache_value, self.compute(ctx), self.proportion, self.method);
        if ctx.info.is_initialising() {
            let phase = ctx.info.current_initialisation_phase;
            if self.initialisation_values.len() <= phase {
                self.initialisation_values.resize(phase + 1, Vec::new());
            }
            self.initialisation_values[phase].push(value);
        } else {
            self.values.insert(ctx.info.current_year, value);
        }
        Ok(())
    }

    fn reset(&mut self) {
        DerivedQuantity::reset(self);
    }
}

// =============================================================================
// DerivedQuantityRegistry
// =============================================================================

/// 派生量注册表
pub struct DerivedQuantityRegistry<S: RuntimeScalar> {
    items: Vec<DerivedQuantity<S>>,
    index: HashMap<String, DerivedQuantityId>,
}

impl<S: RuntimeScalar> Default for DerivedQuantityRegistry<S> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<S: RuntimeScalar> DerivedQuantityRegistry<S> {
    /// 按配置创建全部派生量
    pub fn from_configs(
        configs: &[DerivedQuantityConfig],
        definitions: &CategoryDefinitions,
        info: &ModelInfo,
    ) -> MsResult<Self> {
        let mut registry = Self::default();
        for config in configs {
            registry.register(DerivedQuantity::new(config, definitions, info)?)?;
        }
        Ok(registry)
    }

    /// 注册
    pub fn register(&mut self, dq: DerivedQuantity<S>) -> MsResult<DerivedQuantityId> {
        if self.index.contains_key(dq.label()) {
            return Err(MsError::duplicate("derived_quantity", dq.label()));
        }
        let id = DerivedQuantityId(self.items.len());
        self.index.insert(dq.label().to_string(), id);
        self.items.push(dq);
        Ok(id)
    }

    /// 构建全部派生量
    pub fn build_all(&mut self, partition: &Partition<S>, selectivities: &SelectivityRegistry<S>) -> MsResult<()> {
        for dq in &mut self.items {
            dq.build(partition, selectivities)?;
            debug!("派生量 '{}' ({}) 构建完成", dq.label(), dq.kind().name());
        }
        Ok(())
    }

    /// 标签解析
    pub fn resolve(&self, label: &str) -> MsResult<DerivedQuantityId> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| MsError::unknown_label("derived_quantity", label))
    }

    /// 按标签查找
    pub fn find(&self, label: &str) -> Option<&DerivedQuantity<S>> {
        self.index.get(label).map(|id| &self.items[id.0])
    }

    /// 按 id 访问
    #[inline]
    pub fn get(&self, id: DerivedQuantityId) -> &DerivedQuantity<S> {
        &self.items[id.0]
    }

    /// 按 id 可变访问
    #[inline]
    pub fn get_mut(&mut self, id: DerivedQuantityId) -> &mut DerivedQuantity<S> {
        &mut self.items[id.0]
    }

    /// 遍历 (id, 派生量)
    pub fn iter(&self) -> impl Iterator<Item = (DerivedQuantityId, &DerivedQuantity<S>)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, dq)| (DerivedQuantityId(i), dq))
    }

    /// 标签（注册顺序）
    pub fn labels(&self) -> Vec<&str> {
        self.items.iter().map(|dq| dq.label()).collect()
    }

    /// 数量
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 清除全部记录
    pub fn reset_all(&mut self) {
        self.items.iter_mut().for_each(DerivedQuantity::reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_boundaries_exact() {
        let cache = 0.1f64 + 0.2;
        let value = 7.0f64 / 3.0;
        for method in [ProportionMethod::WeightedSum, ProportionMethod::WeightedProduct] {
            assert_eq!(interpolate(cache, value, 0.0, method).to_bits(), cache.to_bits());
            assert_eq!(interpolate(cache, value, 1.0, method).to_bits(), value.to_bits());
        }
    }

    #[test]
    fn test_interpolate_single_branch() {
        let sum = interpolate(4.0f64, 16.0, 0.5, ProportionMethod::WeightedSum);
        let product = interpolate(4.0f64, 16.0, 0.5, ProportionMethod::WeightedProduct);
        assert!((sum - 10.0).abs() < 1e-12);
        assert!((product - 8.0).abs() < 1e-12);
    }

    fn settings(proportion: f64) -> DerivedQuantitySettings {
        DerivedQuantitySettings {
            label: "abundance".into(),
            time_step: "step_one".into(),
            categories: vec!["*".into()],
            selectivities: vec!["one".into()],
            time_step_proportion: proportion,
            time_step_proportion_method: ProportionMethod::WeightedSum,
        }
    }

    #[test]
    fn test_new_rejects_bad_proportion() {
        let info = crate::test_support::test_info(1990, 1992, 1, 10);
        let definitions = crate::test_support::test_definitions();
        let config = DerivedQuantityConfig::Abundance(settings(1.5));
        let err = DerivedQuantity::<f64>::new(&config, &definitions, &info).err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_new_rejects_unknown_time_step() {
        let info = crate::test_support::test_info(1990, 1992, 1, 10);
        let definitions = crate::test_support::test_definitions();
        let mut s = settings(0.5);
        s.time_step = "step_two".into();
        let config = DerivedQuantityConfig::Biomass(s);
        assert!(DerivedQuantity::<f64>::new(&config, &definitions, &info).is_err());
    }

    #[test]
    fn test_value_falls_back_to_initialisation() {
        let mut info = crate::test_support::test_info(1990, 1992, 1, 10);
        info.initialisation_phase_labels = vec!["phase_one".into(), "phase_two".into()];
        let definitions = crate::test_support::test_definitions();
        let config = DerivedQuantityConfig::Abundance(settings(0.5));
        let mut dq = DerivedQuantity::<f64>::new(&config, &definitions, &info).unwrap();
        dq.initialisation_values[0].extend([1.0, 2.0]);

        assert_eq!(dq.last_value_from_initialisation(0), Some(2.0));
        assert_eq!(dq.last_value_from_initialisation(1), None);
        assert_eq!(dq.last_value_up_to_phase(1), Some(2.0));
        assert_eq!(dq.value(1989), Some(2.0));
        assert_eq!(dq.initialisation_value(0, 0), Some(1.0));

        assert_eq!(dq.value(1990), None);
        dq.values.insert(1990, 5.0);
        assert_eq!(dq.value(1990), Some(5.0));
        assert_eq!(dq.value(1991), None);

        dq.reset();
        assert!(dq.values().is_empty());
        assert!(dq.initialisation_values(0).is_empty());
    }
}
