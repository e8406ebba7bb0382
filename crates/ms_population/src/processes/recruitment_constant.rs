// crates/ms_population/src/processes/recruitment_constant.rs

//! 恒定补充

use std::any::Any;

use ms_config::RecruitmentConstantConfig;
use ms_foundation::{MsError, MsResult};
use ms_runtime::RuntimeScalar;

use super::common::normalise_proportions;
use super::traits::{BuildContext, Process, ProcessContext, ProcessType};
use crate::model::ModelInfo;
use crate::partition::CategoriesAccessor;

/// 恒定补充：每次执行把 `r0` 按比例加到补充年龄
pub struct RecruitmentConstant<S: RuntimeScalar> {
    label: String,
    category_labels: Vec<String>,
    raw_proportions: Option<Vec<f64>>,
    proportions: Vec<S>,
    age: u32,
    age_index: usize,
    r0: S,
    accessor: CategoriesAccessor,
}

impl<S: RuntimeScalar> RecruitmentConstant<S> {
    /// 从配置创建，类别标签已展开
    pub fn new(config: &RecruitmentConstantConfig, categories: Vec<String>) -> Self {
        Self {
            label: config.label.clone(),
            category_labels: categories,
            raw_proportions: config.proportions.clone(),
            proportions: Vec::new(),
            age: config.age,
            age_index: 0,
            r0: S::from_config(config.r0),
            accessor: CategoriesAccessor::default(),
        }
    }

    /// 验证后的比例（和为 1）
    pub fn proportions(&self) -> &[S] {
        &self.proportions
    }
}

impl<S: RuntimeScalar> Process<S> for RecruitmentConstant<S> {
    fn label(&self) -> &str {
        &self.label
    }

    fn type_name(&self) -> &'static str {
        "recruitment_constant"
    }

    fn process_type(&self) -> ProcessType {
        ProcessType::Recruitment
    }

    fn validate(&mut self, info: &ModelInfo) -> MsResult<()> {
        if self.category_labels.is_empty() {
            return Err(MsError::invalid_config(
                format!("{}.categories", self.label),
                "[]",
                "至少需要一个类别",
            ));
        }
        MsError::check_range(
            &format!("{}.age", self.label),
            f64::from(self.age),
            f64::from(info.min_age),
            f64::from(info.max_age),
        )?;
        MsError::check_range(&format!("{}.r0", self.label), self.r0.to_report(), 0.0, f64::MAX)?;
        self.age_index = (self.age - info.min_age) as usize;
        self.proportions = normalise_proportions(
            &self.label,
            self.raw_proportions.as_deref(),
            self.category_labels.len(),
        )?
        .into_iter()
        .map(S::from_config)
        .collect();
        Ok(())
    }

    fn build(&mut self, ctx: &BuildContext<'_, S>) -> MsResult<()> {
        self.accessor = CategoriesAccessor::new(ctx.partition, &self.category_labels)?;
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ProcessContext<'_, S>) -> MsResult<()> {
        let year = ctx.year();
        let active_total: S = self
            .accessor
            .iter(ctx.partition, year)
            .map(|(i, _)| self.proportions[i])
            .sum();
        if active_total <= S::ZERO {
            return Ok(());
        }
        let (r0, age_index, proportions) = (self.r0, self.age_index, &self.proportions);
        self.accessor.for_each_mut(ctx.partition, year, |i, category| {
            category.data_mut()[age_index] += r0 * (proportions[i] / active_total);
            Ok(())
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
