// crates/ms_population/src/model/core.rs

//! 模型核心状态
//!
//! 分区、协作者、过程、派生量与执行器集中在一个结构体中，时间步与
//! 初始化阶段通过 `&mut ModelCore` 驱动它们。字段公开，调用方按需拆分借用。

use ms_foundation::MsResult;
use ms_runtime::RuntimeScalar;

use super::ModelInfo;
use crate::age_length::AgeLengthRegistry;
use crate::category::CategoryDefinitions;
use crate::derived_quantity::DerivedQuantityRegistry;
use crate::executor::{ExecutorContext, ExecutorHandle, ExecutorRegistry, ExecutorTargets, Hook};
use crate::partition::Partition;
use crate::penalty::PenaltyManager;
use crate::processes::{ProcessContext, ProcessId, ProcessRegistry};
use crate::selectivity::SelectivityRegistry;

/// 一个模型实例拥有的全部可变状态
pub struct ModelCore<S: RuntimeScalar> {
    /// 模型信息
    pub info: ModelInfo,
    /// 类别定义
    pub definitions: CategoryDefinitions,
    /// 分区
    pub partition: Partition<S>,
    /// 选择性
    pub selectivities: SelectivityRegistry<S>,
    /// 年龄-体长模型
    pub age_lengths: AgeLengthRegistry<S>,
    /// 惩罚项
    pub penalties: PenaltyManager<S>,
    /// 过程
    pub processes: ProcessRegistry<S>,
    /// 派生量
    pub derived_quantities: DerivedQuantityRegistry<S>,
    /// 外部执行器
    pub executors: ExecutorRegistry<S>,
}

impl<S: RuntimeScalar> ModelCore<S> {
    /// 在当前年份/时间步执行一个过程
    pub fn run_process(&mut self, id: ProcessId) -> MsResult<()> {
        let Self {
            info,
            partition,
            selectivities,
            penalties,
            processes,
            derived_quantities,
            ..
        } = self;
        let mut ctx = ProcessContext {
            info,
            partition,
            selectivities,
            derived_quantities,
            penalties,
        };
        processes.execute(id, &mut ctx)
    }

    /// 依次调用一组订阅者的同一钩子
    pub fn fire_all(&mut self, handles: &[ExecutorHandle], hook: Hook) -> MsResult<()> {
        if handles.is_empty() {
            return Ok(());
        }
        let Self {
            info,
            partition,
            selectivities,
            processes,
            derived_quantities,
            executors,
            ..
        } = self;
        let ctx = ExecutorContext {
            info,
            partition,
            selectivities,
            processes,
        };
        let mut targets = ExecutorTargets {
            derived_quantities,
            external: executors,
        };
        for &handle in handles {
            targets.fire(handle, hook, &ctx)?;
        }
        Ok(())
    }

    /// 清零分区并清除所有运行记录
    pub fn reset(&mut self) {
        self.partition.reset();
        self.processes.reset_all();
        self.derived_quantities.reset_all();
        self.executors.reset_all();
        self.penalties.clear();
    }
}
