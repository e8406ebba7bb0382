// crates/ms_population/src/processes/state_injection.rs

//! 状态注入：执行时用给定值覆盖一个类别从某年龄起的数量

use std::any::Any;

use ms_config::StateInjectionConfig;
use ms_foundation::{MsError, MsResult};
use ms_runtime::RuntimeScalar;

use super::common::check_all_in_range;
use super::traits::{BuildContext, Process, ProcessContext, ProcessType};
use crate::model::ModelInfo;
use crate::partition::CategoryId;

/// 状态注入
pub struct StateInjection<S: RuntimeScalar> {
    label: String,
    config: StateInjectionConfig,
    offset: usize,
    values: Vec<S>,
    category: Option<CategoryId>,
}

impl<S: RuntimeScalar> StateInjection<S> {
    /// 从配置创建
    pub fn new(config: &StateInjectionConfig) -> Self {
        Self {
            label: config.label.clone(),
            config: config.clone(),
            offset: 0,
            values: Vec::new(),
            category: None,
        }
    }
}

impl<S: RuntimeScalar> Process<S> for StateInjection<S> {
    fn label(&self) -> &str {
        &self.label
    }

    fn type_name(&self) -> &'static str {
        "state_injection"
    }

    fn process_type(&self) -> ProcessType {
        ProcessType::Nop
    }

    fn validate(&mut self, _info: &ModelInfo) -> MsResult<()> {
        if self.config.values.is_empty() {
            return Err(MsError::invalid_config(format!("{}.values", self.label), "[]", "至少需要一个值"));
        }
        check_all_in_range(&format!("{}.values", self.label), &self.config.values, 0.0, f64::MAX)?;
        self.values = self.config.values.iter().copied().map(S::from_config).collect();
        Ok(())
    }

    fn build(&mut self, ctx: &BuildContext<'_, S>) -> MsResult<()> {
        let id = ctx.partition.resolve(&self.config.category)?;
        let category = ctx.partition.get(id);
        let from_age = self.config.from_age.unwrap_or(category.min_age());
        let offset = category.age_index(from_age).ok_or_else(|| {
            MsError::out_of_range(
                format!("{}.from_age", self.label),
                f64::from(from_age),
                f64::from(category.min_age()),
                f64::from(category.max_age()),
            )
        })?;
        let available = category.age_spread() - offset;
        if self.values.len() > available {
            return Err(MsError::size_mismatch(format!("{}.values", self.label), available, self.values.len()));
        }
        self.offset = offset;
        self.category = Some(id);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ProcessContext<'_, S>) -> MsResult<()> {
        let id = self
            .category
            .ok_or_else(|| MsError::internal(format!("过程 '{}' 尚未构建", self.label)))?;
        let year = ctx.year();
        let category = ctx.partition.get_mut(id);
        if !category.is_valid_in(year) {
            return Ok(());
        }
        let end = self.offset + self.values.len();
        category.data_mut()[self.offset..end].copy_from_slice(&self.values);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
