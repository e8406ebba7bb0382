// crates/ms_population/src/processes/nop.rs

//! 空过程，占位于年循环中

use std::any::Any;
use std::marker::PhantomData;

use ms_config::NopConfig;
use ms_foundation::MsResult;
use ms_runtime::RuntimeScalar;

use super::traits::{BuildContext, Process, ProcessContext, ProcessType};
use crate::model::ModelInfo;

/// 什么也不做
pub struct Nop<S: RuntimeScalar> {
    label: String,
    _marker: PhantomData<S>,
}

impl<S: RuntimeScalar> Nop<S> {
    /// 从配置创建
    pub fn new(config: &NopConfig) -> Self {
        Self {
            label: config.label.clone(),
            _marker: PhantomData,
        }
    }
}

impl<S: RuntimeScalar> Process<S> for Nop<S> {
    fn label(&self) -> &str {
        &self.label
    }

    fn type_name(&self) -> &'static str {
        "nop"
    }

    fn process_type(&self) -> ProcessType {
        ProcessType::Nop
    }

    fn validate(&mut self, _info: &ModelInfo) -> MsResult<()> {
        Ok(())
    }

    fn build(&mut self, _ctx: &BuildContext<'_, S>) -> MsResult<()> {
        Ok(())
    }

    fn execute(&mut self, _ctx: &mut ProcessContext<'_, S>) -> MsResult<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
