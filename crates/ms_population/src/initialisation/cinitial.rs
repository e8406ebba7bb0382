// crates/ms_population/src/initialisation/cinitial.rs

//! C-initial：按类别-年龄表把前一阶段留下的分区缩放到目标数量
//!
//! 每行可以是 `+` 连接的组合类别，组内各年龄按 `n / total` 同比缩放。
//! 缩放后运行一次年循环供派生量记录，然后恢复缩放后的分区。

use std::any::Any;
use std::collections::HashSet;

use ms_config::CinitialPhaseConfig;
use ms_foundation::{MsError, MsResult};
use ms_runtime::RuntimeScalar;

use super::{run_cycles, InitialisationPhase};
use crate::category::CategoryDefinitions;
use crate::model::{ModelCore, ModelInfo};
use crate::partition::{CategoryId, PartitionCache};
use crate::time_step::TimeStepManager;

struct Row<S: RuntimeScalar> {
    members: Vec<String>,
    ids: Vec<CategoryId>,
    values: Vec<S>,
}

/// C-initial 初始化
pub struct Cinitial<S: RuntimeScalar> {
    config: CinitialPhaseConfig,
    rows: Vec<Row<S>>,
}

impl<S: RuntimeScalar> Cinitial<S> {
    /// 从配置创建
    pub fn new(config: &CinitialPhaseConfig) -> Self {
        Self {
            config: config.clone(),
            rows: Vec::new(),
        }
    }
}

impl<S: RuntimeScalar> InitialisationPhase<S> for Cinitial<S> {
    fn label(&self) -> &str {
        &self.config.label
    }

    fn type_name(&self) -> &'static str {
        "cinitial"
    }

    fn validate(&mut self, info: &ModelInfo, definitions: &CategoryDefinitions) -> MsResult<()> {
        let label = &self.config.label;
        let mut seen = HashSet::new();
        let mut rows = Vec::with_capacity(self.config.table.len());
        for row in &self.config.table {
            let members: Vec<String> = row.category.split('+').map(|m| m.trim().to_string()).collect();
            for member in &members {
                if !definitions.contains(member) {
                    return Err(MsError::unknown_label("category", member.clone()));
                }
                if !seen.insert(member.clone()) {
                    return Err(MsError::duplicate("category", format!("{label}:{member}")));
                }
            }
            MsError::check_size(&format!("{label}.table.{}", row.category), info.age_spread(), row.values.len())?;
            for &value in &row.values {
                MsError::check_range(&format!("{label}.table.{}", row.category), value, 0.0, f64::MAX)?;
            }
            rows.push(Row {
                members,
                ids: Vec::new(),
                values: row.values.iter().copied().map(S::from_config).collect(),
            });
        }
        self.rows = rows;
        Ok(())
    }

    fn build(&mut self, _phase: usize, core: &ModelCore<S>, _time_steps: &mut TimeStepManager) -> MsResult<()> {
        for row in &mut self.rows {
            row.ids = row
                .members
                .iter()
                .map(|m| core.partition.resolve(m))
                .collect::<MsResult<Vec<_>>>()?;
            for &id in &row.ids {
                let category = core.partition.get(id);
                MsError::check_size(
                    &format!("{}.table.{}", self.config.label, category.name()),
                    category.age_spread(),
                    row.values.len(),
                )?;
            }
        }
        Ok(())
    }

    fn execute(&mut self, core: &mut ModelCore<S>, time_steps: &TimeStepManager) -> MsResult<()> {
        for row in &self.rows {
            for (age, &target) in row.values.iter().enumerate() {
                let total: S = row.ids.iter().map(|&id| core.partition.get(id).data()[age]).sum();
                let factor = if total == S::ZERO { S::ONE } else { target / total };
                for &id in &row.ids {
                    core.partition.get_mut(id).data_mut()[age] *= factor;
                }
            }
        }
        let cache = PartitionCache::capture(&core.partition);
        run_cycles(core, time_steps, 1)?;
        cache.restore(&mut core.partition);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
