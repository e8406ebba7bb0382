// crates/ms_population/src/initialisation/derived.rs

//! 派生初始化
//!
//! 先运行年龄跨度年数让每个年龄都被填充，再把累积组按几何级数推到平衡：
//!
//! ```text
//! c      = clamp(plus_after / plus_before - 1, 0, 0.99)
//! plus  *= 1 / (1 - c)
//! ```
//!
//! 之后逐年运行，直到累积组的最大相对变化不超过 0.005。

use std::any::Any;

use ms_config::DerivedPhaseConfig;
use ms_foundation::MsResult;
use ms_runtime::RuntimeScalar;
use tracing::{info, warn};

use super::{apply_overrides, install_overrides, run_cycles, scale_b0_recruitment, InitialisationPhase};
use crate::category::CategoryDefinitions;
use crate::model::{ModelCore, ModelInfo};
use crate::partition::{Partition, PartitionCache};
use crate::processes::ProcessType;
use crate::time_step::TimeStepManager;

const MAX_PLUS_GROUP_C: f64 = 0.99;
const PLUS_GROUP_TOLERANCE: f64 = 0.005;
const MAX_EXTRA_YEARS: u32 = 1000;

/// 派生初始化
pub struct Derived {
    config: DerivedPhaseConfig,
    years: u32,
}

impl Derived {
    /// 从配置创建
    pub fn new(config: &DerivedPhaseConfig) -> Self {
        Self {
            config: config.clone(),
            years: 0,
        }
    }

    /// 第一段运行的年数
    pub fn years(&self) -> u32 {
        self.years
    }
}

fn plus_groups<S: RuntimeScalar>(partition: &Partition<S>) -> Vec<S> {
    partition
        .iter()
        .map(|c| c.data().last().copied().unwrap_or(S::ZERO))
        .collect()
}

impl<S: RuntimeScalar> InitialisationPhase<S> for Derived {
    fn label(&self) -> &str {
        &self.config.label
    }

    fn type_name(&self) -> &'static str {
        "derived"
    }

    fn validate(&mut self, _info: &ModelInfo, _definitions: &CategoryDefinitions) -> MsResult<()> {
        Ok(())
    }

    fn build(&mut self, phase: usize, core: &ModelCore<S>, time_steps: &mut TimeStepManager) -> MsResult<()> {
        let lists = apply_overrides(
            &self.config.label,
            time_steps,
            &self.config.insert_processes,
            &self.config.exclude_processes,
        )?;
        install_overrides(phase, lists, core, time_steps)?;

        // 补充在年龄增长之前时，第一年的补充已经被推进一岁
        let order: Vec<ProcessType> = time_steps
            .iter()
            .flat_map(|t| t.initialisation_schedule(phase).ids().to_vec())
            .map(|id| core.processes.get(id).process_type())
            .collect();
        let last_of = |kind: ProcessType| order.iter().rposition(|&t| t == kind);
        let spread = core.info.age_spread() as u32;
        self.years = match (last_of(ProcessType::Recruitment), last_of(ProcessType::Ageing)) {
            (Some(recruitment), Some(ageing)) if recruitment < ageing => spread.saturating_sub(1),
            _ => spread,
        };
        Ok(())
    }

    fn execute(&mut self, core: &mut ModelCore<S>, time_steps: &TimeStepManager) -> MsResult<()> {
        run_cycles(core, time_steps, self.years)?;

        if core.info.age_plus {
            let cache = PartitionCache::capture(&core.partition);
            let before = plus_groups(&core.partition);
            run_cycles(core, time_steps, 1)?;
            let after = plus_groups(&core.partition);
            cache.restore(&mut core.partition);

            let max_c = S::from_config(MAX_PLUS_GROUP_C);
            for ((category, &b), &a) in core.partition.iter_mut().zip(&before).zip(&after) {
                if b > S::ZERO {
                    let c = (a / b - S::ONE).clamp_value(S::ZERO, max_c);
                    if let Some(plus) = category.data_mut().last_mut() {
                        *plus *= S::ONE / (S::ONE - c);
                    }
                }
            }

            let tolerance = S::from_config(PLUS_GROUP_TOLERANCE);
            let mut extra = 0;
            loop {
                let before = plus_groups(&core.partition);
                run_cycles(core, time_steps, 1)?;
                extra += 1;
                let change = before
                    .iter()
                    .zip(plus_groups(&core.partition))
                    .filter(|(b, _)| **b > S::ZERO)
                    .map(|(&b, a)| ((a - b) / b).abs())
                    .fold(S::ZERO, |acc, x| acc.max(x));
                if change <= tolerance {
                    info!("初始化阶段 '{}' 累积组在额外 {} 年后稳定", self.config.label, extra);
                    break;
                }
                if extra >= MAX_EXTRA_YEARS {
                    warn!(
                        "初始化阶段 '{}' 累积组在 {} 年内未稳定 (变化 {:.4})",
                        self.config.label,
                        extra,
                        change.to_report()
                    );
                    break;
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
