// crates/ms_population/src/processes/mortality_constant_rate.rs

//! 恒定自然死亡率

use std::any::Any;
use std::collections::{BTreeMap, HashMap};

use ms_config::MortalityConstantRateConfig;
use ms_foundation::{MsError, MsResult};
use ms_runtime::RuntimeScalar;

use super::common::{broadcast, check_all_in_range, ensure_non_negative};
use super::traits::{BuildContext, Process, ProcessContext, ProcessType};
use crate::model::ModelInfo;
use crate::partition::CategoriesAccessor;
use crate::selectivity::SelectivityId;

/// 每个年龄移除 `1 - exp(-sel(age) · M · ratio)` 的比例
pub struct MortalityConstantRate<S: RuntimeScalar> {
    label: String,
    category_labels: Vec<String>,
    selectivity_labels: Vec<String>,
    raw_m: Vec<f64>,
    raw_ratios: Option<Vec<f64>>,
    m: Vec<S>,
    selectivities: Vec<SelectivityId>,
    /// 时间步索引 -> 比例
    ratios: HashMap<usize, S>,
    accessor: CategoriesAccessor,
    removals: BTreeMap<u32, S>,
}

impl<S: RuntimeScalar> MortalityConstantRate<S> {
    /// 从配置创建，类别标签已展开
    pub fn new(config: &MortalityConstantRateConfig, categories: Vec<String>) -> Self {
        Self {
            label: config.label.clone(),
            category_labels: categories,
            selectivity_labels: config.selectivities.clone(),
            raw_m: config.m.clone(),
            raw_ratios: config.time_step_ratio.clone(),
            m: Vec::new(),
            selectivities: Vec::new(),
            ratios: HashMap::new(),
            accessor: CategoriesAccessor::default(),
            removals: BTreeMap::new(),
        }
    }

    /// 逐年移除总量
    pub fn removals(&self) -> &BTreeMap<u32, S> {
        &self.removals
    }
}

/// 解析时间步比例：每个使用该过程的时间步一个值，省略时为 1
pub(crate) fn resolve_time_step_ratios<S: RuntimeScalar>(
    label: &str,
    raw: Option<&[f64]>,
    time_steps: &[usize],
) -> MsResult<HashMap<usize, S>> {
    let values = match raw {
        Some(values) => {
            MsError::check_size(&format!("{label}.time_step_ratio"), time_steps.len(), values.len())?;
            check_all_in_range(&format!("{label}.time_step_ratio"), values, 0.0, 1.0)?;
            values.to_vec()
        }
        None => vec![1.0; time_steps.len()],
    };
    Ok(time_steps
        .iter()
        .copied()
        .zip(values.into_iter().map(S::from_config))
        .collect())
}

impl<S: RuntimeScalar> Process<S> for MortalityConstantRate<S> {
    fn label(&self) -> &str {
        &self.label
    }

    fn type_name(&self) -> &'static str {
        "mortality_constant_rate"
    }

    fn process_type(&self) -> ProcessType {
        ProcessType::Mortality
    }

    fn validate(&mut self, _info: &ModelInfo) -> MsResult<()> {
        let count = self.category_labels.len();
        if count == 0 {
            return Err(MsError::invalid_config(
                format!("{}.categories", self.label),
                "[]",
                "至少需要一个类别",
            ));
        }
        let m = broadcast(self.raw_m.clone(), count, &format!("{}.m", self.label))?;
        check_all_in_range(&format!("{}.m", self.label), &m, 0.0, 1.0)?;
        self.m = m.into_iter().map(S::from_config).collect();
        Ok(())
    }

    fn build(&mut self, ctx: &BuildContext<'_, S>) -> MsResult<()> {
        let count = self.category_labels.len();
        self.accessor = CategoriesAccessor::new(ctx.partition, &self.category_labels)?;
        self.selectivities = ctx.selectivities.resolve_broadcast(
            &self.selectivity_labels,
            count,
            &format!("{}.selectivities", self.label),
        )?;
        let steps = ctx.time_steps_of(&self.label);
        self.ratios = resolve_time_step_ratios(&self.label, self.raw_ratios.as_deref(), &steps)?;
        Ok(())
    }

    fn reset(&mut self) {
        self.removals.clear();
    }

    fn execute(&mut self, ctx: &mut ProcessContext<'_, S>) -> MsResult<()> {
        let year = ctx.year();
        let ratio = self.ratios.get(&ctx.time_step()).copied().unwrap_or(S::ONE);
        let selectivities = ctx.selectivities;
        let (label, m, sel_ids) = (&self.label, &self.m, &self.selectivities);
        let mut removed = S::ZERO;
        self.accessor.for_each_mut(ctx.partition, year, |i, category| {
            let min_age = category.min_age();
            for (offset, value) in category.data_mut().iter_mut().enumerate() {
                let sel = selectivities.value(sel_ids[i], min_age + offset as u32);
                let amount = *value * (S::ONE - (-(sel * m[i] * ratio)).exp());
                *value -= amount;
                removed += amount;
            }
            ensure_non_negative(label, category)
        })?;
        *self.removals.entry(year).or_insert(S::ZERO) += removed;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
