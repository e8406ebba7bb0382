// crates/ms_population/src/initialisation/state_injection.rs

//! 状态注入初始化：直接用表覆盖类别，可选再运行若干年循环

use std::any::Any;
use std::collections::HashSet;

use ms_config::StateInjectionPhaseConfig;
use ms_foundation::{MsError, MsResult};
use ms_runtime::RuntimeScalar;

use super::{run_cycles, InitialisationPhase};
use crate::category::CategoryDefinitions;
use crate::model::{ModelCore, ModelInfo};
use crate::partition::CategoryId;
use crate::time_step::TimeStepManager;

/// 状态注入初始化
pub struct StateInjectionPhase<S: RuntimeScalar> {
    config: StateInjectionPhaseConfig,
    rows: Vec<(CategoryId, Vec<S>)>,
}

impl<S: RuntimeScalar> StateInjectionPhase<S> {
    /// 从配置创建
    pub fn new(config: &StateInjectionPhaseConfig) -> Self {
        Self {
            config: config.clone(),
            rows: Vec::new(),
        }
    }
}

impl<S: RuntimeScalar> InitialisationPhase<S> for StateInjectionPhase<S> {
    fn label(&self) -> &str {
        &self.config.label
    }

    fn type_name(&self) -> &'static str {
        "state_injection"
    }

    fn validate(&mut self, _info: &ModelInfo, definitions: &CategoryDefinitions) -> MsResult<()> {
        let label = &self.config.label;
        if self.config.table.is_empty() {
            return Err(MsError::invalid_config(format!("{label}.table"), "[]", "至少需要一行"));
        }
        let mut seen = HashSet::new();
        for row in &self.config.table {
            let definition = definitions
                .get(&row.category)
                .ok_or_else(|| MsError::unknown_label("category", row.category.clone()))?;
            if !seen.insert(row.category.as_str()) {
                return Err(MsError::duplicate("category", format!("{label}:{}", row.category)));
            }
            let spread = (definition.max_age - definition.min_age + 1) as usize;
            MsError::check_size(&format!("{label}.table.{}", row.category), spread, row.values.len())?;
            for &value in &row.values {
                MsError::check_range(&format!("{label}.table.{}", row.category), value, 0.0, f64::MAX)?;
            }
        }
        Ok(())
    }

    fn build(&mut self, _phase: usize, core: &ModelCore<S>, _time_steps: &mut TimeStepManager) -> MsResult<()> {
        self.rows = self
            .config
            .table
            .iter()
            .map(|row| {
                let id = core.partition.resolve(&row.category)?;
                Ok((id, row.values.iter().copied().map(S::from_config).collect()))
            })
            .collect::<MsResult<Vec<_>>>()?;
        Ok(())
    }

    fn execute(&mut self, core: &mut ModelCore<S>, time_steps: &TimeStepManager) -> MsResult<()> {
        for (id, values) in &self.rows {
            core.partition.get_mut(*id).data_mut().copy_from_slice(values);
        }
        run_cycles(core, time_steps, self.config.cycle_years)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
