// crates/ms_population/src/initialisation/mod.rs

//! 初始化阶段
//!
//! 主年循环开始之前，按声明顺序执行各阶段，把分区推到初始状态：
//!
//! | 类型 | 说明 |
//! |------|------|
//! | `iterative` | 重复运行年循环，可检查收敛 |
//! | `derived` | 运行年龄跨度年数后用几何级数近似累积组 |
//! | `cinitial` | 按类别-年龄表缩放前一阶段的分区 |
//! | `state_injection` | 直接覆盖分区 |
//!
//! 初始化期间模型状态为 `Initialise`，年份固定为起始年。

pub mod cinitial;
pub mod derived;
pub mod iterative;
pub mod state_injection;

use std::any::Any;

use ms_config::InitialisationPhaseConfig;
use ms_foundation::{MsError, MsResult};
use ms_runtime::RuntimeScalar;
use tracing::{debug, info};

use crate::category::CategoryDefinitions;
use crate::model::{ModelCore, ModelInfo};
use crate::partition::{Partition, PartitionCache};
use crate::processes::{ProcessType, RecruitmentBevertonHolt};
use crate::time_step::TimeStepManager;

pub use cinitial::Cinitial;
pub use derived::Derived;
pub use iterative::Iterative;
pub use state_injection::StateInjectionPhase;

/// 初始化阶段接口
pub trait InitialisationPhase<S: RuntimeScalar>: Send + Any {
    /// 标签
    fn label(&self) -> &str;

    /// 类型名
    fn type_name(&self) -> &'static str;

    /// 参数验证
    fn validate(&mut self, info: &ModelInfo, definitions: &CategoryDefinitions) -> MsResult<()>;

    /// 解析引用；可为时间步设置本阶段专用的过程列表
    fn build(&mut self, phase: usize, core: &ModelCore<S>, time_steps: &mut TimeStepManager) -> MsResult<()>;

    /// 执行
    fn execute(&mut self, core: &mut ModelCore<S>, time_steps: &TimeStepManager) -> MsResult<()>;

    /// 向下转型
    fn as_any(&self) -> &dyn Any;
}

/// 按配置创建初始化阶段
pub fn create_phase<S: RuntimeScalar>(config: &InitialisationPhaseConfig) -> Box<dyn InitialisationPhase<S>> {
    match config {
        InitialisationPhaseConfig::Iterative(c) => Box::new(Iterative::new(c)),
        InitialisationPhaseConfig::Derived(c) => Box::new(Derived::new(c)),
        InitialisationPhaseConfig::Cinitial(c) => Box::new(Cinitial::new(c)),
        InitialisationPhaseConfig::StateInjection(c) => Box::new(StateInjectionPhase::new(c)),
    }
}

// =============================================================================
// InitialisationPhaseManager
// =============================================================================

/// 初始化阶段管理器
pub struct InitialisationPhaseManager<S: RuntimeScalar> {
    phases: Vec<Box<dyn InitialisationPhase<S>>>,
}

impl<S: RuntimeScalar> Default for InitialisationPhaseManager<S> {
    fn default() -> Self {
        Self { phases: Vec::new() }
    }
}

impl<S: RuntimeScalar> InitialisationPhaseManager<S> {
    /// 按 `order` 中的标签顺序创建
    pub fn from_configs(order: &[String], configs: &[InitialisationPhaseConfig]) -> MsResult<Self> {
        let phases = order
            .iter()
            .map(|label| {
                configs
                    .iter()
                    .find(|c| c.label() == label)
                    .map(create_phase)
                    .ok_or_else(|| MsError::unknown_label("initialisation_phase", label.clone()))
            })
            .collect::<MsResult<Vec<_>>>()?;
        Ok(Self { phases })
    }

    /// 验证全部阶段
    pub fn validate(&mut self, info: &ModelInfo, definitions: &CategoryDefinitions) -> MsResult<()> {
        self.phases
            .iter_mut()
            .try_for_each(|p| p.validate(info, definitions))
    }

    /// 构建全部阶段
    pub fn build(&mut self, core: &ModelCore<S>, time_steps: &mut TimeStepManager) -> MsResult<()> {
        for (i, phase) in self.phases.iter_mut().enumerate() {
            phase.build(i, core, time_steps)?;
            debug!("初始化阶段 '{}' ({}) 构建完成", phase.label(), phase.type_name());
        }
        Ok(())
    }

    /// 按顺序执行全部阶段
    pub fn execute(&mut self, core: &mut ModelCore<S>, time_steps: &TimeStepManager) -> MsResult<()> {
        for (i, phase) in self.phases.iter_mut().enumerate() {
            core.info.current_initialisation_phase = i;
            core.info.current_year = core.info.start_year;
            info!("初始化阶段 '{}' ({}) 开始", phase.label(), phase.type_name());
            phase.execute(core, time_steps)?;
        }
        Ok(())
    }

    /// 按标签查找
    pub fn find(&self, label: &str) -> Option<&dyn InitialisationPhase<S>> {
        self.phases.iter().find(|p| p.label() == label).map(Box::as_ref)
    }

    /// 按标签与具体类型查找
    pub fn downcast_ref<T: InitialisationPhase<S>>(&self, label: &str) -> Option<&T> {
        self.find(label)?.as_any().downcast_ref::<T>()
    }

    /// 阶段标签
    pub fn labels(&self) -> Vec<&str> {
        self.phases.iter().map(|p| p.label()).collect()
    }

    /// 数量
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

// =============================================================================
// 阶段共用工具
// =============================================================================

/// 运行 `years` 次年循环
pub(crate) fn run_cycles<S: RuntimeScalar>(
    core: &mut ModelCore<S>,
    time_steps: &TimeStepManager,
    years: u32,
) -> MsResult<()> {
    for _ in 0..years {
        time_steps.execute_year(core)?;
    }
    Ok(())
}

/// 应用插入与排除，得到每个时间步在本阶段的过程列表
///
/// 插入格式：`time_step(process)=new` 插入到 `process` 之前，
/// `time_step=new` 追加到末尾。
pub(crate) fn apply_overrides(
    phase: &str,
    time_steps: &TimeStepManager,
    insert: &[String],
    exclude: &[String],
) -> MsResult<Vec<Vec<String>>> {
    let mut lists: Vec<Vec<String>> = time_steps.iter().map(|t| t.process_labels().to_vec()).collect();

    for entry in insert {
        let (target, new) = entry.split_once('=').ok_or_else(|| {
            MsError::invalid_config(format!("{phase}.insert_processes"), entry, "格式应为 time_step(process)=new")
        })?;
        let new = new.trim().to_string();
        let (step, before) = match target.split_once('(') {
            Some((step, rest)) => {
                let process = rest.strip_suffix(')').ok_or_else(|| {
                    MsError::invalid_config(format!("{phase}.insert_processes"), entry, "缺少右括号")
                })?;
                (step.trim(), Some(process.trim()))
            }
            None => (target.trim(), None),
        };
        let index = time_steps.index_of(step)?;
        let list = &mut lists[index];
        match before {
            Some(process) => {
                let position = list.iter().position(|l| l == process).ok_or_else(|| {
                    MsError::invalid_config(
                        format!("{phase}.insert_processes"),
                        entry,
                        format!("时间步 '{step}' 中没有过程 '{process}'"),
                    )
                })?;
                list.insert(position, new);
            }
            None => list.push(new),
        }
    }

    for label in exclude {
        let mut matched = false;
        for list in &mut lists {
            let before = list.len();
            list.retain(|l| l != label);
            matched |= list.len() != before;
        }
        if !matched {
            return Err(MsError::invalid_config(
                format!("{phase}.exclude_processes"),
                label,
                "没有任何时间步包含此过程",
            ));
        }
    }
    Ok(lists)
}

/// 把本阶段的过程列表写入时间步
pub(crate) fn install_overrides<S: RuntimeScalar>(
    phase: usize,
    lists: Vec<Vec<String>>,
    core: &ModelCore<S>,
    time_steps: &mut TimeStepManager,
) -> MsResult<()> {
    for (step, labels) in time_steps.iter_mut().zip(lists) {
        step.build_for_initialisation(phase, labels, &core.processes)?;
    }
    Ok(())
}

/// 由 B0 初始化的 Beverton-Holt 补充在其 B0 阶段结束时缩放分区
///
/// 返回是否有过程执行了缩放。
pub(crate) fn scale_b0_recruitment<S: RuntimeScalar>(core: &mut ModelCore<S>) -> MsResult<bool> {
    let phase = core.info.current_initialisation_phase;
    let mut scaled = false;
    for id in core.processes.ids_of_type(ProcessType::Recruitment) {
        let Some(process) = core.processes.downcast_mut::<RecruitmentBevertonHolt<S>>(id) else {
            continue;
        };
        if process.b0_initialised() && process.b0_phase() == phase {
            process.scale_partition(&core.info, &mut core.partition, &core.derived_quantities)?;
            scaled = true;
        }
    }
    Ok(scaled)
}

/// 分区相对缓存的变化：Σ|cached - current| / Σ current，总量为 0 时返回 None
pub(crate) fn relative_change<S: RuntimeScalar>(cache: &PartitionCache<S>, partition: &Partition<S>) -> Option<S> {
    let mut difference = S::ZERO;
    let mut total = S::ZERO;
    for (cached, category) in cache.data().iter().zip(partition.iter()) {
        for (&before, &now) in cached.iter().zip(category.data()) {
            difference += (before - now).abs();
            total += now;
        }
    }
    (total > S::ZERO).then(|| difference / total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ms_config::TimeStepConfig;

    fn manager() -> TimeStepManager {
        let configs = vec![
            TimeStepConfig {
                label: "step_one".into(),
                processes: vec!["recruitment".into(), "ageing".into()],
            },
            TimeStepConfig {
                label: "step_two".into(),
                processes: vec!["mortality".into()],
            },
        ];
        TimeStepManager::from_configs(&["step_one".into(), "step_two".into()], &configs).unwrap()
    }

    #[test]
    fn test_insert_before_target() {
        let lists = apply_overrides(
            "phase_one",
            &manager(),
            &["step_one(ageing)=recruitment_bh".into(), "step_two=nop".into()],
            &[],
        )
        .unwrap();
        assert_eq!(lists[0], vec!["recruitment", "recruitment_bh", "ageing"]);
        assert_eq!(lists[1], vec!["mortality", "nop"]);
    }

    #[test]
    fn test_exclude_removes_everywhere() {
        let lists = apply_overrides("phase_one", &manager(), &[], &["mortality".into()]).unwrap();
        assert!(lists[1].is_empty());
    }

    #[test]
    fn test_exclude_unmatched_is_error() {
        let err = apply_overrides("phase_one", &manager(), &[], &["fishing".into()]).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_insert_unknown_target_is_error() {
        let err = apply_overrides("phase_one", &manager(), &["step_one(fishing)=nop".into()], &[]).unwrap_err();
        assert!(err.is_configuration());
        let err = apply_overrides("phase_one", &manager(), &["step_three=nop".into()], &[]).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_relative_change() {
        let mut partition = crate::test_support::test_partition();
        partition.iter_mut().for_each(|c| c.data_mut()[0] = 10.0);
        let cache = PartitionCache::capture(&partition);
        assert_eq!(relative_change(&cache, &partition), Some(0.0));

        partition.iter_mut().for_each(|c| c.data_mut()[0] = 20.0);
        let change = relative_change(&cache, &partition).unwrap();
        assert!((change - 0.5).abs() < 1e-12);

        partition.reset();
        assert_eq!(relative_change(&cache, &partition), None);
    }
}
