// crates/ms_population/src/initialisation/iterative.rs

//! 迭代初始化：重复运行年循环直到给定年数或收敛

use std::any::Any;

use ms_config::IterativePhaseConfig;
use ms_foundation::{MsError, MsResult};
use ms_runtime::RuntimeScalar;
use tracing::info;

use super::{apply_overrides, install_overrides, relative_change, run_cycles, scale_b0_recruitment, InitialisationPhase};
use crate::category::CategoryDefinitions;
use crate::model::{ModelCore, ModelInfo};
use crate::partition::PartitionCache;
use crate::time_step::TimeStepManager;

/// 迭代初始化
pub struct Iterative {
    config: IterativePhaseConfig,
    convergence_years: Vec<u32>,
    lambda: f64,
    converged_at: Option<u32>,
}

impl Iterative {
    /// 从配置创建
    pub fn new(config: &IterativePhaseConfig) -> Self {
        Self {
            config: config.clone(),
            convergence_years: Vec::new(),
            lambda: config.lambda,
            converged_at: None,
        }
    }

    /// 上次执行收敛时已运行的年数
    pub fn converged_at(&self) -> Option<u32> {
        self.converged_at
    }

    /// 分段运行的终点：各收敛检查年，最后是总年数
    fn checkpoints(&self) -> Vec<u32> {
        let mut points = self.convergence_years.clone();
        if points.last() != Some(&self.config.years) {
            points.push(self.config.years);
        }
        points
    }
}

impl<S: RuntimeScalar> InitialisationPhase<S> for Iterative {
    fn label(&self) -> &str {
        &self.config.label
    }

    fn type_name(&self) -> &'static str {
        "iterative"
    }

    fn validate(&mut self, _info: &ModelInfo, _definitions: &CategoryDefinitions) -> MsResult<()> {
        let label = &self.config.label;
        if self.config.years == 0 {
            return Err(MsError::invalid_config(format!("{label}.years"), 0, "必须大于 0"));
        }
        if self.config.lambda.is_nan() || self.config.lambda <= 0.0 {
            return Err(MsError::invalid_config(format!("{label}.lambda"), self.config.lambda, "必须大于 0"));
        }
        let mut years = self.config.convergence_years.clone();
        years.sort_unstable();
        years.dedup();
        for &year in &years {
            MsError::check_range(
                &format!("{label}.convergence_years"),
                f64::from(year),
                1.0,
                f64::from(self.config.years),
            )?;
        }
        self.convergence_years = years;
        Ok(())
    }

    fn build(&mut self, phase: usize, core: &ModelCore<S>, time_steps: &mut TimeStepManager) -> MsResult<()> {
        let lists = apply_overrides(
            &self.config.label,
            time_steps,
            &self.config.insert_processes,
            &self.config.exclude_processes,
        )?;
        install_overrides(phase, lists, core, time_steps)
    }

    fn execute(&mut self, core: &mut ModelCore<S>, time_steps: &TimeStepManager) -> MsResult<()> {
        self.converged_at = None;
        let lambda = S::from_config(self.lambda);
        let mut done = 0;
        for target in self.checkpoints() {
            run_cycles(core, time_steps, target - done - 1)?;
            let cache = PartitionCache::capture(&core.partition);
            run_cycles(core, time_steps, 1)?;
            done = target;

            if self.convergence_years.contains(&target) {
                if let Some(change) = relative_change(&cache, &core.partition) {
                    if change < lambda {
                        info!(
                            "初始化阶段 '{}' 在第 {} 年收敛 (变化 {:.3e})",
                            self.config.label,
                            target,
                            change.to_report()
                        );
                        self.converged_at = Some(target);
                        break;
                    }
                }
            }
        }
        if scale_b0_recruitment(core)? {
            run_cycles(core, time_steps, 1)?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
