// crates/ms_population/src/processes/mortality_event_biomass.rs

//! 按生物量的捕捞事件

use std::any::Any;
use std::collections::BTreeMap;

use ms_config::MortalityEventBiomassConfig;
use ms_foundation::{MsError, MsResult};
use ms_runtime::{zero_fun, AgeTotal, RuntimeScalar};
use tracing::warn;

use super::common::{ensure_non_negative, year_table};
use super::traits::{BuildContext, Process, ProcessContext, ProcessType};
use crate::model::ModelInfo;
use crate::partition::CategoriesAccessor;
use crate::selectivity::SelectivityId;

/// 捕捞事件：在给定年份按生物量移除渔获量
///
/// ```text
/// vulnerable = Σ data · sel · mean_weight
/// U          = min(catch / zero_fun(vulnerable), u_max)
/// data      -= data · sel · U
/// ```
pub struct MortalityEventBiomass<S: RuntimeScalar> {
    label: String,
    config: MortalityEventBiomassConfig,
    category_labels: Vec<String>,
    catches: BTreeMap<u32, S>,
    u_max: S,
    selectivities: Vec<SelectivityId>,
    accessor: CategoriesAccessor,
    exploitation: BTreeMap<u32, S>,
    actual_catch: BTreeMap<u32, S>,
}

impl<S: RuntimeScalar> MortalityEventBiomass<S> {
    /// 从配置创建，类别标签已展开
    pub fn new(config: &MortalityEventBiomassConfig, categories: Vec<String>) -> Self {
        Self {
            label: config.label.clone(),
            config: config.clone(),
            category_labels: categories,
            catches: BTreeMap::new(),
            u_max: S::from_config(config.u_max),
            selectivities: Vec::new(),
            accessor: CategoriesAccessor::default(),
            exploitation: BTreeMap::new(),
            actual_catch: BTreeMap::new(),
        }
    }

    /// 逐年实际开发率
    pub fn exploitation(&self) -> &BTreeMap<u32, S> {
        &self.exploitation
    }

    /// 逐年实际渔获量
    pub fn actual_catch(&self) -> &BTreeMap<u32, S> {
        &self.actual_catch
    }
}

impl<S: RuntimeScalar> Process<S> for MortalityEventBiomass<S> {
    fn label(&self) -> &str {
        &self.label
    }

    fn type_name(&self) -> &'static str {
        "mortality_event_biomass"
    }

    fn process_type(&self) -> ProcessType {
        ProcessType::Mortality
    }

    fn validate(&mut self, info: &ModelInfo) -> MsResult<()> {
        let label = &self.label;
        if self.category_labels.is_empty() {
            return Err(MsError::invalid_config(format!("{label}.categories"), "[]", "至少需要一个类别"));
        }
        let u_max = self.config.u_max;
        if !(u_max > 0.0 && u_max < 1.0) {
            return Err(MsError::out_of_range(format!("{label}.u_max"), u_max, 0.0, 1.0));
        }
        let table = year_table(label, &self.config.years, &self.config.catches)?;
        let mut catches = BTreeMap::new();
        for (year, catch) in table {
            if !info.is_model_year(year) {
                return Err(MsError::out_of_range(
                    format!("{label}.years"),
                    f64::from(year),
                    f64::from(info.start_year),
                    f64::from(info.final_year),
                ));
            }
            MsError::check_range(&format!("{label}.catches"), catch, 0.0, f64::MAX)?;
            catches.insert(year, S::from_config(catch));
        }
        self.catches = catches;
        Ok(())
    }

    fn build(&mut self, ctx: &BuildContext<'_, S>) -> MsResult<()> {
        self.accessor = CategoriesAccessor::new(ctx.partition, &self.category_labels)?;
        self.selectivities = ctx.selectivities.resolve_broadcast(
            &self.config.selectivities,
            self.category_labels.len(),
            &format!("{}.selectivities", self.label),
        )?;
        if let Some(penalty) = &self.config.penalty {
            ctx.penalties.check_label(penalty)?;
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.exploitation.clear();
        self.actual_catch.clear();
    }

    fn execute(&mut self, ctx: &mut ProcessContext<'_, S>) -> MsResult<()> {
        if self.config.initialisation_only != ctx.info.is_initialising() {
            return Ok(());
        }
        let year = ctx.year();
        let Some(&catch) = self.catches.get(&year) else {
            return Ok(());
        };
        let time_step = ctx.time_step();
        let selectivities = ctx.selectivities;

        let mut vulnerable = AgeTotal::new();
        for (i, category) in self.accessor.iter(ctx.partition, year) {
            for (offset, &value) in category.data().iter().enumerate() {
                let sel = selectivities.value(self.selectivities[i], category.min_age() + offset as u32);
                vulnerable.add_weighted(value, sel * category.mean_weight(year, time_step, offset));
            }
        }
        let vulnerable = vulnerable.total();

        let mut exploitation = catch / zero_fun(vulnerable);
        if exploitation > self.u_max {
            exploitation = self.u_max;
            warn!(
                "过程 '{}' {} 年开发率超过上限 {:.3}，已截断",
                self.label,
                year,
                self.u_max.to_report()
            );
            if let Some(penalty) = &self.config.penalty {
                ctx.penalties.trigger(penalty, catch, vulnerable * self.u_max, year)?;
            }
        } else if exploitation < S::ZERO {
            exploitation = S::ZERO;
        }

        let (label, sel_ids) = (&self.label, &self.selectivities);
        let mut removed = S::ZERO;
        self.accessor.for_each_mut(ctx.partition, year, |i, category| {
            let min_age = category.min_age();
            let weights: Vec<S> = (0..category.age_spread())
                .map(|offset| category.mean_weight(year, time_step, offset))
                .collect();
            for (offset, value) in category.data_mut().iter_mut().enumerate() {
                let sel = selectivities.value(sel_ids[i], min_age + offset as u32);
                let amount = *value * sel * exploitation;
                *value -= amount;
                removed += amount * weights[offset];
            }
            ensure_non_negative(label, category)
        })?;
        self.exploitation.insert(year, exploitation);
        self.actual_catch.insert(year, removed);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
