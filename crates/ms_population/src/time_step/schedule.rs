// crates/ms_population/src/time_step/schedule.rs

//! 时间步：有序过程列表 + 死亡块 + 订阅者

use std::collections::{BTreeMap, HashMap};

use ms_foundation::{MsError, MsResult};
use ms_runtime::RuntimeScalar;

use crate::executor::{ExecutorHandle, Hook};
use crate::model::ModelCore;
use crate::processes::{ProcessId, ProcessRegistry};

/// 死亡块：连续的死亡过程区间（含两端）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MortalityBlock {
    /// 块内第一个过程的位置
    pub start: usize,
    /// 块内最后一个过程的位置
    pub end: usize,
}

/// 解析后的过程顺序
#[derive(Debug, Clone, Default)]
pub struct ProcessSchedule {
    labels: Vec<String>,
    ids: Vec<ProcessId>,
    block: Option<MortalityBlock>,
}

impl ProcessSchedule {
    /// 解析标签并定位死亡块
    pub fn resolve<S: RuntimeScalar>(
        time_step: &str,
        labels: Vec<String>,
        processes: &ProcessRegistry<S>,
    ) -> MsResult<Self> {
        let ids = labels
            .iter()
            .map(|l| processes.resolve(l))
            .collect::<MsResult<Vec<_>>>()?;
        let members: Vec<usize> = ids
            .iter()
            .enumerate()
            .filter(|(_, id)| processes.get(**id).is_mortality_block_member())
            .map(|(i, _)| i)
            .collect();
        let block = match (members.first(), members.last()) {
            (Some(&start), Some(&end)) => {
                if end - start + 1 != members.len() {
                    return Err(MsError::invalid_config(
                        format!("time_steps.{time_step}.processes"),
                        labels.join(", "),
                        "死亡过程必须在时间步中连续排列",
                    ));
                }
                Some(MortalityBlock { start, end })
            }
            _ => None,
        };
        Ok(Self { labels, ids, block })
    }

    /// 过程标签
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// 过程 id
    pub fn ids(&self) -> &[ProcessId] {
        &self.ids
    }

    /// 死亡块
    pub fn block(&self) -> Option<MortalityBlock> {
        self.block
    }
}

/// 时间步
#[derive(Debug, Clone)]
pub struct TimeStep {
    label: String,
    process_labels: Vec<String>,
    main: ProcessSchedule,
    initialisation: Vec<Option<ProcessSchedule>>,
    block_executors: BTreeMap<u32, Vec<ExecutorHandle>>,
    initialisation_block_executors: BTreeMap<usize, Vec<ExecutorHandle>>,
    process_executors: HashMap<(u32, ProcessId), Vec<ExecutorHandle>>,
    time_step_executors: BTreeMap<u32, Vec<ExecutorHandle>>,
}

impl TimeStep {
    /// 创建（尚未解析过程）
    pub fn new(label: impl Into<String>, process_labels: Vec<String>) -> Self {
        Self {
            label: label.into(),
            process_labels,
            main: ProcessSchedule::default(),
            initialisation: Vec::new(),
            block_executors: BTreeMap::new(),
            initialisation_block_executors: BTreeMap::new(),
            process_executors: HashMap::new(),
            time_step_executors: BTreeMap::new(),
        }
    }

    /// 标签
    pub fn label(&self) -> &str {
        &self.label
    }

    /// 配置的过程标签
    pub fn process_labels(&self) -> &[String] {
        &self.process_labels
    }

    /// 主年循环的过程顺序
    pub fn schedule(&self) -> &ProcessSchedule {
        &self.main
    }

    /// 某初始化阶段使用的过程顺序，未单独设置时与主循环相同
    pub fn initialisation_schedule(&self, phase: usize) -> &ProcessSchedule {
        self.initialisation
            .get(phase)
            .and_then(Option::as_ref)
            .unwrap_or(&self.main)
    }

    /// 解析主年循环的过程列表
    pub fn build<S: RuntimeScalar>(&mut self, processes: &ProcessRegistry<S>) -> MsResult<()> {
        self.main = ProcessSchedule::resolve(&self.label, self.process_labels.clone(), processes)?;
        Ok(())
    }

    /// 为某初始化阶段设置单独的过程列表
    pub fn build_for_initialisation<S: RuntimeScalar>(
        &mut self,
        phase: usize,
        labels: Vec<String>,
        processes: &ProcessRegistry<S>,
    ) -> MsResult<()> {
        let schedule = ProcessSchedule::resolve(&self.label, labels, processes)?;
        if self.initialisation.len() <= phase {
            self.initialisation.resize(phase + 1, None);
        }
        self.initialisation[phase] = Some(schedule);
        Ok(())
    }

    // =========================================================================
    // 订阅
    // =========================================================================

    /// 订阅死亡块
    pub fn subscribe_to_block(&mut self, handle: ExecutorHandle, years: &[u32]) {
        for &year in years {
            self.block_executors.entry(year).or_default().push(handle);
        }
    }

    /// 订阅某初始化阶段的死亡块
    pub fn subscribe_to_initialisation_block(&mut self, handle: ExecutorHandle, phase: usize) {
        self.initialisation_block_executors
            .entry(phase)
            .or_default()
            .push(handle);
    }

    /// 订阅某过程前后
    pub fn subscribe_to_process<S: RuntimeScalar>(
        &mut self,
        handle: ExecutorHandle,
        years: &[u32],
        process_label: &str,
        processes: &ProcessRegistry<S>,
    ) -> MsResult<()> {
        if !self.process_labels.iter().any(|l| l == process_label) {
            return Err(MsError::invalid_config(
                format!("time_steps.{}", self.label),
                process_label,
                "该时间步中没有此过程",
            ));
        }
        let id = processes.resolve(process_label)?;
        for &year in years {
            self.process_executors.entry((year, id)).or_default().push(handle);
        }
        Ok(())
    }

    /// 订阅整个时间步
    pub fn subscribe_to_time_step(&mut self, handle: ExecutorHandle, years: &[u32]) {
        for &year in years {
            self.time_step_executors.entry(year).or_default().push(handle);
        }
    }

    // =========================================================================
    // 执行
    // =========================================================================

    /// 执行一次
    ///
    /// 初始化期间使用该阶段的过程列表，只触发初始化块订阅者。
    pub fn execute<S: RuntimeScalar>(&self, core: &mut ModelCore<S>) -> MsResult<()> {
        if core.info.is_initialising() {
            let phase = core.info.current_initialisation_phase;
            let block = handles(self.initialisation_block_executors.get(&phase));
            return self.run(self.initialisation_schedule(phase), core, block, None, &[]);
        }
        let year = core.info.current_year;
        let block = handles(self.block_executors.get(&year));
        let whole = handles(self.time_step_executors.get(&year));
        self.run(&self.main, core, block, Some(year), whole)
    }

    fn run<S: RuntimeScalar>(
        &self,
        schedule: &ProcessSchedule,
        core: &mut ModelCore<S>,
        block: &[ExecutorHandle],
        year: Option<u32>,
        whole: &[ExecutorHandle],
    ) -> MsResult<()> {
        core.fire_all(whole, Hook::Pre)?;
        for (position, &id) in schedule.ids.iter().enumerate() {
            let in_block = schedule.block;
            if in_block.map(|b| b.start) == Some(position) {
                core.fire_all(block, Hook::Pre)?;
            }
            let around = handles(year.and_then(|y| self.process_executors.get(&(y, id))));
            core.fire_all(around, Hook::Pre)?;
            core.run_process(id)?;
            core.fire_all(around, Hook::Post)?;
            if in_block.map(|b| b.end) == Some(position) {
                core.fire_all(block, Hook::Post)?;
            }
        }
        if schedule.block.is_none() {
            core.fire_all(block, Hook::Pre)?;
            core.fire_all(block, Hook::Post)?;
        }
        core.fire_all(whole, Hook::Post)
    }
}

fn handles(list: Option<&Vec<ExecutorHandle>>) -> &[ExecutorHandle] {
    list.map(Vec::as_slice).unwrap_or(&[])
}
