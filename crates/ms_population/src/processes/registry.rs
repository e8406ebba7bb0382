// crates/ms_population/src/processes/registry.rs

//! 过程注册中心
//!
//! 持有所有过程并检查生命周期；时间步只保存 [`ProcessId`]。

use std::collections::HashMap;

use ms_foundation::{MsError, MsResult};
use ms_runtime::RuntimeScalar;
use tracing::{debug, trace};

use super::traits::{BuildContext, Process, ProcessContext, ProcessType};
use crate::model::ModelInfo;

/// 过程索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(pub usize);

/// 过程生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// 刚创建
    Unvalidated,
    /// 参数已验证
    Validated,
    /// 引用已解析，可执行
    Built,
}

impl Lifecycle {
    fn name(&self) -> &'static str {
        match self {
            Self::Unvalidated => "unvalidated",
            Self::Validated => "validated",
            Self::Built => "built",
        }
    }
}

struct ProcessSlot<S: RuntimeScalar> {
    process: Box<dyn Process<S>>,
    lifecycle: Lifecycle,
}

/// 过程注册中心
pub struct ProcessRegistry<S: RuntimeScalar> {
    slots: Vec<ProcessSlot<S>>,
    index: HashMap<String, ProcessId>,
}

impl<S: RuntimeScalar> Default for ProcessRegistry<S> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<S: RuntimeScalar> ProcessRegistry<S> {
    /// 创建空注册中心
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册过程
    pub fn register(&mut self, process: Box<dyn Process<S>>) -> MsResult<ProcessId> {
        let label = process.label().to_string();
        if self.index.contains_key(&label) {
            return Err(MsError::duplicate("process", label));
        }
        let id = ProcessId(self.slots.len());
        self.slots.push(ProcessSlot {
            process,
            lifecycle: Lifecycle::Unvalidated,
        });
        self.index.insert(label, id);
        Ok(id)
    }

    /// 标签解析
    pub fn resolve(&self, label: &str) -> MsResult<ProcessId> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| MsError::unknown_label("process", label))
    }

    /// 是否存在
    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// 按 id 访问
    pub fn get(&self, id: ProcessId) -> &dyn Process<S> {
        self.slots[id.0].process.as_ref()
    }

    /// 按 id 可变访问
    pub fn get_mut(&mut self, id: ProcessId) -> &mut dyn Process<S> {
        self.slots[id.0].process.as_mut()
    }

    /// 按具体类型访问
    pub fn downcast_ref<T: Process<S>>(&self, id: ProcessId) -> Option<&T> {
        self.slots.get(id.0)?.process.as_any().downcast_ref::<T>()
    }

    /// 按具体类型可变访问
    pub fn downcast_mut<T: Process<S>>(&mut self, id: ProcessId) -> Option<&mut T> {
        self.slots.get_mut(id.0)?.process.as_any_mut().downcast_mut::<T>()
    }

    /// 某类别的全部过程 id
    pub fn ids_of_type(&self, process_type: ProcessType) -> Vec<ProcessId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.process.process_type() == process_type)
            .map(|(i, _)| ProcessId(i))
            .collect()
    }

    /// 生命周期
    pub fn lifecycle(&self, id: ProcessId) -> Lifecycle {
        self.slots[id.0].lifecycle
    }

    /// 全部标签（注册顺序）
    pub fn labels(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.process.label()).collect()
    }

    /// 数量
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 验证全部过程
    pub fn validate_all(&mut self, info: &ModelInfo) -> MsResult<()> {
        for slot in &mut self.slots {
            slot.process.validate(info)?;
            slot.lifecycle = Lifecycle::Validated;
        }
        Ok(())
    }

    /// 构建全部过程
    pub fn build_all(&mut self, ctx: &BuildContext<'_, S>) -> MsResult<()> {
        for slot in &mut self.slots {
            if slot.lifecycle == Lifecycle::Unvalidated {
                return Err(MsError::lifecycle(
                    slot.process.label(),
                    Lifecycle::Validated.name(),
                    slot.lifecycle.name(),
                ));
            }
            slot.process.build(ctx)?;
            slot.lifecycle = Lifecycle::Built;
            debug!(
                "过程 '{}' ({}) 构建完成",
                slot.process.label(),
                slot.process.type_name()
            );
        }
        Ok(())
    }

    /// 重置全部过程的运行记录
    pub fn reset_all(&mut self) {
        for slot in &mut self.slots {
            if slot.lifecycle == Lifecycle::Built {
                slot.process.reset();
            }
        }
    }

    /// 执行一个过程
    pub fn execute(&mut self, id: ProcessId, ctx: &mut ProcessContext<'_, S>) -> MsResult<()> {
        let slot = self
            .slots
            .get_mut(id.0)
            .ok_or_else(|| MsError::internal(format!("无效的过程 id {}", id.0)))?;
        if slot.lifecycle != Lifecycle::Built {
            return Err(MsError::lifecycle(
                slot.process.label(),
                Lifecycle::Built.name(),
                slot.lifecycle.name(),
            ));
        }
        trace!(
            "执行过程 '{}' year={} time_step={}",
            slot.process.label(),
            ctx.info.current_year,
            ctx.info.current_time_step
        );
        slot.process.execute(ctx)
    }
}
