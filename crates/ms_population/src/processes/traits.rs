// crates/ms_population/src/processes/traits.rs

//! 过程 Trait 定义
//!
//! 过程是作用在分区上的一个流水线阶段。生命周期：
//!
//! ```text
//! Unvalidated ─validate─> Validated ─build─> Built ─execute*─> Built
//!                                              └──reset──> Built
//! ```
//!
//! 生命周期由 [`ProcessRegistry`](super::ProcessRegistry) 检查。

use std::any::Any;

use ms_foundation::MsResult;
use ms_runtime::RuntimeScalar;

use crate::category::CategoryDefinitions;
use crate::derived_quantity::DerivedQuantityRegistry;
use crate::model::ModelInfo;
use crate::partition::Partition;
use crate::penalty::PenaltyManager;
use crate::selectivity::SelectivityRegistry;

/// 过程类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessType {
    /// 年龄增长
    Ageing,
    /// 补充
    Recruitment,
    /// 死亡（死亡块成员）
    Mortality,
    /// 类别转移
    Transition,
    /// 直接修改分区的其他过程
    Nop,
}

impl ProcessType {
    /// 名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ageing => "ageing",
            Self::Recruitment => "recruitment",
            Self::Mortality => "mortality",
            Self::Transition => "transition",
            Self::Nop => "nop",
        }
    }
}

/// 年循环中的一个过程位置
#[derive(Debug, Clone)]
pub struct ProcessOrderEntry {
    /// 时间步索引
    pub time_step: usize,
    /// 过程标签
    pub label: String,
    /// 过程类别
    pub process_type: ProcessType,
}

/// 构建上下文
pub struct BuildContext<'a, S: RuntimeScalar> {
    /// 模型信息
    pub info: &'a ModelInfo,
    /// 类别定义
    pub definitions: &'a CategoryDefinitions,
    /// 分区
    pub partition: &'a Partition<S>,
    /// 选择性
    pub selectivities: &'a SelectivityRegistry<S>,
    /// 惩罚项
    pub penalties: &'a PenaltyManager<S>,
    /// 派生量
    pub derived_quantities: &'a DerivedQuantityRegistry<S>,
    /// 主年循环的过程顺序（按时间步展开）
    pub process_order: &'a [ProcessOrderEntry],
}

impl<S: RuntimeScalar> BuildContext<'_, S> {
    /// 某过程在年循环中所在的时间步（按出现顺序，去重）
    pub fn time_steps_of(&self, label: &str) -> Vec<usize> {
        let mut steps: Vec<usize> = self
            .process_order
            .iter()
            .filter(|e| e.label == label)
            .map(|e| e.time_step)
            .collect();
        steps.dedup();
        steps
    }
}

/// 执行上下文
pub struct ProcessContext<'a, S: RuntimeScalar> {
    /// 模型信息
    pub info: &'a ModelInfo,
    /// 分区
    pub partition: &'a mut Partition<S>,
    /// 选择性
    pub selectivities: &'a SelectivityRegistry<S>,
    /// 派生量（只读）
    pub derived_quantities: &'a DerivedQuantityRegistry<S>,
    /// 惩罚项
    pub penalties: &'a mut PenaltyManager<S>,
}

impl<S: RuntimeScalar> ProcessContext<'_, S> {
    /// 当前年份
    #[inline]
    pub fn year(&self) -> u32 {
        self.info.current_year
    }

    /// 当前时间步
    #[inline]
    pub fn time_step(&self) -> usize {
        self.info.current_time_step
    }
}

/// 过程接口
pub trait Process<S: RuntimeScalar>: Send + Any {
    /// 标签
    fn label(&self) -> &str;

    /// 配置中的类型名
    fn type_name(&self) -> &'static str;

    /// 过程类别
    fn process_type(&self) -> ProcessType;

    /// 是否属于死亡块
    fn is_mortality_block_member(&self) -> bool {
        self.process_type() == ProcessType::Mortality
    }

    /// 参数验证（不依赖其他对象）
    fn validate(&mut self, info: &ModelInfo) -> MsResult<()>;

    /// 解析类别、选择性、派生量等引用
    fn build(&mut self, ctx: &BuildContext<'_, S>) -> MsResult<()>;

    /// 清除每次运行的记录（不涉及分区数据）
    fn reset(&mut self) {}

    /// 执行一次
    fn execute(&mut self, ctx: &mut ProcessContext<'_, S>) -> MsResult<()>;

    /// 向下转型
    fn as_any(&self) -> &dyn Any;

    /// 向下转型（可变）
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
