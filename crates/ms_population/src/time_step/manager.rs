// crates/ms_population/src/time_step/manager.rs

//! 时间步管理器：按模型声明的顺序持有时间步

use ms_config::TimeStepConfig;
use ms_foundation::{MsError, MsResult};
use ms_runtime::RuntimeScalar;
use tracing::debug;

use super::schedule::TimeStep;
use crate::model::ModelCore;
use crate::processes::{ProcessOrderEntry, ProcessRegistry};

/// 时间步管理器
#[derive(Debug, Clone, Default)]
pub struct TimeStepManager {
    steps: Vec<TimeStep>,
}

impl TimeStepManager {
    /// 按 `order` 中的标签顺序创建时间步
    pub fn from_configs(order: &[String], configs: &[TimeStepConfig]) -> MsResult<Self> {
        let steps = order
            .iter()
            .map(|label| {
                configs
                    .iter()
                    .find(|c| &c.label == label)
                    .map(|c| TimeStep::new(label.clone(), c.processes.clone()))
                    .ok_or_else(|| MsError::unknown_label("time_step", label.clone()))
            })
            .collect::<MsResult<Vec<_>>>()?;
        Ok(Self { steps })
    }

    /// 解析全部时间步的过程
    pub fn build<S: RuntimeScalar>(&mut self, processes: &ProcessRegistry<S>) -> MsResult<()> {
        for step in &mut self.steps {
            step.build(processes)?;
            debug!(
                "时间步 '{}' 构建完成: {} 个过程, 死亡块 {:?}",
                step.label(),
                step.schedule().ids().len(),
                step.schedule().block()
            );
        }
        Ok(())
    }

    /// 主年循环中按时间步展开的过程顺序
    pub fn process_order<S: RuntimeScalar>(&self, processes: &ProcessRegistry<S>) -> Vec<ProcessOrderEntry> {
        self.steps
            .iter()
            .enumerate()
            .flat_map(|(i, step)| {
                step.schedule().ids().iter().map(move |&id| {
                    let process = processes.get(id);
                    ProcessOrderEntry {
                        time_step: i,
                        label: process.label().to_string(),
                        process_type: process.process_type(),
                    }
                })
            })
            .collect()
    }

    /// 按顺序执行一年的全部时间步
    pub fn execute_year<S: RuntimeScalar>(&self, core: &mut ModelCore<S>) -> MsResult<()> {
        for (i, step) in self.steps.iter().enumerate() {
            core.info.current_time_step = i;
            step.execute(core)?;
        }
        Ok(())
    }

    /// 标签 -> 索引
    pub fn index_of(&self, label: &str) -> MsResult<usize> {
        self.steps
            .iter()
            .position(|s| s.label() == label)
            .ok_or_else(|| MsError::unknown_label("time_step", label))
    }

    /// 按索引访问
    pub fn get(&self, index: usize) -> Option<&TimeStep> {
        self.steps.get(index)
    }

    /// 按索引可变访问
    pub fn get_mut(&mut self, index: usize) -> Option<&mut TimeStep> {
        self.steps.get_mut(index)
    }

    /// 按标签可变访问
    pub fn find_mut(&mut self, label: &str) -> MsResult<&mut TimeStep> {
        let index = self.index_of(label)?;
        Ok(&mut self.steps[index])
    }

    /// 遍历
    pub fn iter(&self) -> impl Iterator<Item = &TimeStep> {
        self.steps.iter()
    }

    /// 可变遍历
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TimeStep> {
        self.steps.iter_mut()
    }

    /// 数量
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
