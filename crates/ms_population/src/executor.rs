// crates/ms_population/src/executor.rs

//! 执行器：订阅时间步钩子的观察者
//!
//! 执行器在时间步的三个位置被调用：
//!
//! - 死亡块：块首个过程之前 `pre_execute`，块最后一个过程之后 `execute`
//! - 单个过程：该过程前后
//! - 整个时间步：时间步开始与结束
//!
//! 派生量是内置的执行器；外部观测者通过 [`ExecutorRegistry`] 注册。
//! 钩子只读访问模型状态。

use ms_foundation::MsResult;
use ms_runtime::RuntimeScalar;

use crate::derived_quantity::{DerivedQuantityId, DerivedQuantityRegistry};
use crate::model::ModelInfo;
use crate::partition::Partition;
use crate::processes::ProcessRegistry;
use crate::selectivity::SelectivityRegistry;

/// 执行器可见的模型状态
pub struct ExecutorContext<'a, S: RuntimeScalar> {
    /// 模型信息（当前年份/时间步/阶段）
    pub info: &'a ModelInfo,
    /// 分区
    pub partition: &'a Partition<S>,
    /// 选择性
    pub selectivities: &'a SelectivityRegistry<S>,
    /// 过程（用于读取过程记录）
    pub processes: &'a ProcessRegistry<S>,
}

/// 执行器接口
pub trait Executor<S: RuntimeScalar>: Send {
    /// 标签
    fn label(&self) -> &str;

    /// 钩子区间开始前
    fn pre_execute(&mut self, _ctx: &ExecutorContext<'_, S>) -> MsResult<()> {
        Ok(())
    }

    /// 钩子区间结束后
    fn execute(&mut self, ctx: &ExecutorContext<'_, S>) -> MsResult<()>;

    /// 清除运行记录
    fn reset(&mut self) {}
}

/// 外部执行器索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExecutorId(pub usize);

/// 时间步中保存的订阅者句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutorHandle {
    /// 派生量
    DerivedQuantity(DerivedQuantityId),
    /// 外部执行器
    External(ExecutorId),
}

impl From<DerivedQuantityId> for ExecutorHandle {
    fn from(id: DerivedQuantityId) -> Self {
        Self::DerivedQuantity(id)
    }
}

impl From<ExecutorId> for ExecutorHandle {
    fn from(id: ExecutorId) -> Self {
        Self::External(id)
    }
}

/// 钩子位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    /// 区间开始前
    Pre,
    /// 区间结束后
    Post,
}

/// 外部执行器注册中心
pub struct ExecutorRegistry<S: RuntimeScalar> {
    executors: Vec<Box<dyn Executor<S>>>,
}

impl<S: RuntimeScalar> Default for ExecutorRegistry<S> {
    fn default() -> Self {
        Self { executors: Vec::new() }
    }
}

impl<S: RuntimeScalar> ExecutorRegistry<S> {
    /// 创建空注册中心
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册执行器
    pub fn register(&mut self, executor: Box<dyn Executor<S>>) -> ExecutorId {
        self.executors.push(executor);
        ExecutorId(self.executors.len() - 1)
    }

    /// 按 id 访问
    pub fn get(&self, id: ExecutorId) -> Option<&dyn Executor<S>> {
        self.executors.get(id.0).map(|e| e.as_ref())
    }

    /// 数量
    pub fn len(&self) -> usize {
        self.executors.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }

    /// 清除全部运行记录
    pub fn reset_all(&mut self) {
        self.executors.iter_mut().for_each(|e| e.reset());
    }

    fn get_mut(&mut self, id: ExecutorId) -> MsResult<&mut Box<dyn Executor<S>>> {
        self.executors
            .get_mut(id.0)
            .ok_or_else(|| ms_foundation::MsError::internal(format!("无效的执行器 id {}", id.0)))
    }
}

/// 钩子分发目标：派生量与外部执行器
pub struct ExecutorTargets<'a, S: RuntimeScalar> {
    /// 派生量
    pub derived_quantities: &'a mut DerivedQuantityRegistry<S>,
    /// 外部执行器
    pub external: &'a mut ExecutorRegistry<S>,
}

impl<S: RuntimeScalar> ExecutorTargets<'_, S> {
    /// 调用一个订阅者的钩子
    pub fn fire(&mut self, handle: ExecutorHandle, hook: Hook, ctx: &ExecutorContext<'_, S>) -> MsResult<()> {
        match handle {
            ExecutorHandle::DerivedQuantity(id) => {
                let dq = self.derived_quantities.get_mut(id);
                match hook {
                    Hook::Pre => Executor::pre_execute(dq, ctx),
                    Hook::Post => Executor::execute(dq, ctx),
                }
            }
            ExecutorHandle::External(id) => {
                let executor = self.external.get_mut(id)?;
                match hook {
                    Hook::Pre => executor.pre_execute(ctx),
                    Hook::Post => executor.execute(ctx),
                }
            }
        }
    }
}
