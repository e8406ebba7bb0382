// crates/ms_population/src/processes/transition_category.rs

//! 类别转移：按比例与选择性把个体从源类别移到目标类别

use std::any::Any;

use ms_config::TransitionCategoryConfig;
use ms_foundation::{MsError, MsResult};
use ms_runtime::RuntimeScalar;

use super::common::{broadcast, check_all_in_range, ensure_non_negative};
use super::traits::{BuildContext, Process, ProcessContext, ProcessType};
use crate::model::ModelInfo;
use crate::partition::{CategoryId, Partition};
use crate::selectivity::{SelectivityId, SelectivityRegistry};

/// 一对源/目标类别
#[derive(Debug, Clone, Copy)]
pub(crate) struct TransitionPair {
    pub from: CategoryId,
    pub to: CategoryId,
    pub selectivity: SelectivityId,
}

/// 解析源/目标类别对并检查年龄范围一致
pub(crate) fn resolve_pairs<S: RuntimeScalar>(
    label: &str,
    from: &[String],
    to: &[String],
    selectivity_labels: &[String],
    ctx: &BuildContext<'_, S>,
) -> MsResult<Vec<TransitionPair>> {
    let selectivities =
        ctx.selectivities
            .resolve_broadcast(selectivity_labels, from.len(), &format!("{label}.selectivities"))?;
    let mut pairs = Vec::with_capacity(from.len());
    for ((source, target), selectivity) in from.iter().zip(to).zip(selectivities) {
        let from_id = ctx.partition.resolve(source)?;
        let to_id = ctx.partition.resolve(target)?;
        if from_id == to_id {
            return Err(MsError::invalid_config(
                format!("{label}.to"),
                target,
                "源类别与目标类别相同",
            ));
        }
        let (a, b) = (ctx.partition.get(from_id), ctx.partition.get(to_id));
        if a.min_age() != b.min_age() || a.max_age() != b.max_age() {
            return Err(MsError::invalid_config(
                format!("{label}.to"),
                target,
                format!("年龄范围与 '{source}' 不一致"),
            ));
        }
        pairs.push(TransitionPair {
            from: from_id,
            to: to_id,
            selectivity,
        });
    }
    Ok(pairs)
}

/// 按比例转移一对类别；任一类别当年无效时跳过
pub(crate) fn transfer<S: RuntimeScalar>(
    label: &str,
    partition: &mut Partition<S>,
    selectivities: &SelectivityRegistry<S>,
    pair: TransitionPair,
    proportion: S,
    year: u32,
) -> MsResult<S> {
    let (source, target) = partition.pair_mut(pair.from, pair.to)?;
    if !source.is_valid_in(year) || !target.is_valid_in(year) {
        return Ok(S::ZERO);
    }
    let min_age = source.min_age();
    let mut moved = S::ZERO;
    for (offset, (from, to)) in source
        .data_mut()
        .iter_mut()
        .zip(target.data_mut().iter_mut())
        .enumerate()
    {
        let amount = *from * proportion * selectivities.value(pair.selectivity, min_age + offset as u32);
        *from -= amount;
        *to += amount;
        moved += amount;
    }
    ensure_non_negative(label, source)?;
    ensure_non_negative(label, target)?;
    Ok(moved)
}

/// 类别转移
pub struct TransitionCategory<S: RuntimeScalar> {
    label: String,
    config: TransitionCategoryConfig,
    from: Vec<String>,
    to: Vec<String>,
    proportions: Vec<S>,
    pairs: Vec<TransitionPair>,
}

impl<S: RuntimeScalar> TransitionCategory<S> {
    /// 从配置创建，源/目标标签已展开
    pub fn new(config: &TransitionCategoryConfig, from: Vec<String>, to: Vec<String>) -> Self {
        Self {
            label: config.label.clone(),
            config: config.clone(),
            from,
            to,
            proportions: Vec::new(),
            pairs: Vec::new(),
        }
    }
}

impl<S: RuntimeScalar> Process<S> for TransitionCategory<S> {
    fn label(&self) -> &str {
        &self.label
    }

    fn type_name(&self) -> &'static str {
        "transition_category"
    }

    fn process_type(&self) -> ProcessType {
        ProcessType::Transition
    }

    fn validate(&mut self, _info: &ModelInfo) -> MsResult<()> {
        if self.from.is_empty() {
            return Err(MsError::invalid_config(format!("{}.from", self.label), "[]", "至少需要一个类别"));
        }
        MsError::check_size(&format!("{}.to", self.label), self.from.len(), self.to.len())?;
        let name = format!("{}.proportions", self.label);
        let proportions = broadcast(self.config.proportions.clone(), self.from.len(), &name)?;
        check_all_in_range(&name, &proportions, 0.0, 1.0)?;
        self.proportions = proportions.into_iter().map(S::from_config).collect();
        Ok(())
    }

    fn build(&mut self, ctx: &BuildContext<'_, S>) -> MsResult<()> {
        self.pairs = resolve_pairs(&self.label, &self.from, &self.to, &self.config.selectivities, ctx)?;
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ProcessContext<'_, S>) -> MsResult<()> {
        let year = ctx.year();
        for (&pair, &proportion) in self.pairs.iter().zip(&self.proportions) {
            transfer(&self.label, ctx.partition, ctx.selectivities, pair, proportion, year)?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
