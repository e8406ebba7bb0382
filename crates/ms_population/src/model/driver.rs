// crates/ms_population/src/model/driver.rs

//! 模型驱动
//!
//! ```text
//! from_config ─> build ─> iterate ─> (reset ─> iterate)*
//!   Validate     Build     Initialise → Execute → IterationComplete
//! ```

use ms_config::{ModelConfig, Precision};
use ms_foundation::{ensure, MsError, MsResult};
use ms_runtime::RuntimeScalar;
use tracing::{debug, info};

use super::{ModelCore, ModelInfo, ModelState};
use crate::age_length::AgeLengthRegistry;
use crate::category::CategoryDefinitions;
use crate::derived_quantity::{DerivedQuantity, DerivedQuantityRegistry};
use crate::executor::{Executor, ExecutorHandle, ExecutorId, ExecutorRegistry};
use crate::initialisation::InitialisationPhaseManager;
use crate::partition::Partition;
use crate::penalty::PenaltyManager;
use crate::processes::{create_process, BuildContext, Process, ProcessRegistry};
use crate::selectivity::SelectivityRegistry;
use crate::time_step::TimeStepManager;

/// 一个模型实例
pub struct Model<S: RuntimeScalar> {
    core: ModelCore<S>,
    time_steps: TimeStepManager,
    phases: InitialisationPhaseManager<S>,
    precision: Precision,
    built: bool,
}

impl<S: RuntimeScalar> Model<S> {
    /// 从配置创建并验证全部对象
    pub fn from_config(config: &ModelConfig) -> MsResult<Self> {
        config
            .validate()
            .map_err(|e| MsError::config(e.to_string()))?;

        let mut info = ModelInfo::from_section(&config.model);
        info.state = ModelState::Validate;

        let definitions = CategoryDefinitions::from_config(&config.categories, &info)?;
        let partition = Partition::build(&definitions)?;
        let selectivities = SelectivityRegistry::from_configs(&config.selectivities, &info)?;
        let age_lengths = AgeLengthRegistry::from_configs(&config.age_lengths, &info)?;
        let penalties = PenaltyManager::from_configs(&config.penalties)?;

        let mut processes = ProcessRegistry::new();
        for process in &config.processes {
            processes.register(create_process(process, &definitions)?)?;
        }
        processes.validate_all(&info)?;

        let derived_quantities =
            DerivedQuantityRegistry::from_configs(&config.derived_quantities, &definitions, &info)?;
        let time_steps = TimeStepManager::from_configs(&config.model.time_steps, &config.time_steps)?;
        let mut phases =
            InitialisationPhaseManager::from_configs(&config.model.initialisation_phases, &config.initialisation_phases)?;
        phases.validate(&info, &definitions)?;

        debug!(
            "模型验证完成: {}-{}, 年龄 {}-{}, {} 个类别, {} 个过程",
            info.start_year,
            info.final_year,
            info.min_age,
            info.max_age,
            definitions.len(),
            processes.len()
        );

        Ok(Self {
            core: ModelCore {
                info,
                definitions,
                partition,
                selectivities,
                age_lengths,
                penalties,
                processes,
                derived_quantities,
                executors: ExecutorRegistry::new(),
            },
            time_steps,
            phases,
            precision: config.model.precision,
            built: false,
        })
    }

    /// 解析全部引用并订阅派生量
    ///
    /// 只能调用一次；重复构建会让派生量重复订阅。
    pub fn build(&mut self) -> MsResult<()> {
        ensure!(
            !self.built,
            MsError::lifecycle("model", ModelState::Validate.name(), self.core.info.state.name())
        );
        let core = &mut self.core;
        core.info.state = ModelState::Build;
        core.partition.rebuild_caches(&core.info, &core.age_lengths)?;

        self.time_steps.build(&core.processes)?;
        let order = self.time_steps.process_order(&core.processes);
        let ctx = BuildContext {
            info: &core.info,
            definitions: &core.definitions,
            partition: &core.partition,
            selectivities: &core.selectivities,
            penalties: &core.penalties,
            derived_quantities: &core.derived_quantities,
            process_order: &order,
        };
        core.processes.build_all(&ctx)?;
        core.derived_quantities.build_all(&core.partition, &core.selectivities)?;

        let years = core.info.years();
        let phase_count = core.info.initialisation_phase_labels.len();
        for (id, dq) in core.derived_quantities.iter() {
            let step = self
                .time_steps
                .get_mut(dq.time_step())
                .ok_or_else(|| MsError::internal(format!("派生量 '{}' 的时间步不存在", dq.label())))?;
            step.subscribe_to_block(id.into(), &years);
            for phase in 0..phase_count {
                step.subscribe_to_initialisation_block(id.into(), phase);
            }
        }

        self.phases.build(&self.core, &mut self.time_steps)?;
        self.core.info.state = ModelState::Verify;
        self.built = true;
        debug!("模型构建完成");
        Ok(())
    }

    /// 运行一次：初始化阶段后逐年执行全部时间步
    pub fn iterate(&mut self) -> MsResult<()> {
        ensure!(
            self.built,
            MsError::lifecycle("model", ModelState::Verify.name(), self.core.info.state.name())
        );
        let core = &mut self.core;
        core.info.state = ModelState::Initialise;
        core.info.current_year = core.info.start_year;
        self.phases.execute(core, &self.time_steps)?;

        core.info.state = ModelState::Execute;
        for year in core.info.start_year..=core.info.final_year {
            core.info.current_year = year;
            self.time_steps.execute_year(core)?;
        }
        core.info.state = ModelState::IterationComplete;
        info!(
            "模型运行完成: {}-{}, 惩罚 {:.6}",
            core.info.start_year,
            core.info.final_year,
            core.penalties.total_score().to_report()
        );
        Ok(())
    }

    /// 重置后运行
    pub fn full_iteration(&mut self) -> MsResult<()> {
        self.reset();
        self.iterate()
    }

    /// 清零分区并清除所有运行记录
    pub fn reset(&mut self) {
        self.core.info.state = ModelState::Reset;
        self.core.info.current_year = self.core.info.start_year;
        self.core.info.current_time_step = 0;
        self.core.info.current_initialisation_phase = 0;
        self.core.reset();
    }

    // =========================================================================
    // 订阅
    // =========================================================================

    /// 注册外部执行器
    pub fn register_executor(&mut self, executor: Box<dyn Executor<S>>) -> ExecutorId {
        self.core.executors.register(executor)
    }

    /// 订阅某时间步的死亡块
    pub fn subscribe_to_block(&mut self, time_step: &str, handle: ExecutorHandle, years: &[u32]) -> MsResult<()> {
        self.time_steps.find_mut(time_step)?.subscribe_to_block(handle, years);
        Ok(())
    }

    /// 订阅某时间步中某过程前后
    pub fn subscribe_to_process(
        &mut self,
        time_step: &str,
        handle: ExecutorHandle,
        years: &[u32],
        process: &str,
    ) -> MsResult<()> {
        self.time_steps
            .find_mut(time_step)?
            .subscribe_to_process(handle, years, process, &self.core.processes)
    }

    /// 订阅整个时间步
    pub fn subscribe_to_time_step(&mut self, time_step: &str, handle: ExecutorHandle, years: &[u32]) -> MsResult<()> {
        self.time_steps.find_mut(time_step)?.subscribe_to_time_step(handle, years);
        Ok(())
    }

    /// 订阅某时间步在某初始化阶段中的死亡块
    pub fn subscribe_to_initialisation_block(
        &mut self,
        time_step: &str,
        handle: ExecutorHandle,
        phase: &str,
    ) -> MsResult<()> {
        let index = self
            .core
            .info
            .initialisation_phase_index(phase)
            .ok_or_else(|| MsError::unknown_label("initialisation_phase", phase))?;
        self.time_steps
            .find_mut(time_step)?
            .subscribe_to_initialisation_block(handle, index);
        Ok(())
    }

    // =========================================================================
    // 访问
    // =========================================================================

    /// 模型信息
    pub fn info(&self) -> &ModelInfo {
        &self.core.info
    }

    /// 分区
    pub fn partition(&self) -> &Partition<S> {
        &self.core.partition
    }

    /// 分区（可变）
    pub fn partition_mut(&mut self) -> &mut Partition<S> {
        &mut self.core.partition
    }

    /// 类别定义
    pub fn definitions(&self) -> &CategoryDefinitions {
        &self.core.definitions
    }

    /// 按标签查找派生量
    pub fn derived_quantity(&self, label: &str) -> Option<&DerivedQuantity<S>> {
        self.core.derived_quantities.find(label)
    }

    /// 全部派生量
    pub fn derived_quantities(&self) -> &DerivedQuantityRegistry<S> {
        &self.core.derived_quantities
    }

    /// 按标签与具体类型查找过程
    pub fn process<T: Process<S>>(&self, label: &str) -> Option<&T> {
        let id = self.core.processes.resolve(label).ok()?;
        self.core.processes.downcast_ref::<T>(id)
    }

    /// 按标签与具体类型查找过程（可变）
    pub fn process_mut<T: Process<S>>(&mut self, label: &str) -> Option<&mut T> {
        let id = self.core.processes.resolve(label).ok()?;
        self.core.processes.downcast_mut::<T>(id)
    }

    /// 全部过程
    pub fn processes(&self) -> &ProcessRegistry<S> {
        &self.core.processes
    }

    /// 惩罚项
    pub fn penalties(&self) -> &PenaltyManager<S> {
        &self.core.penalties
    }

    /// 时间步
    pub fn time_steps(&self) -> &TimeStepManager {
        &self.time_steps
    }

    /// 初始化阶段
    pub fn initialisation_phases(&self) -> &InitialisationPhaseManager<S> {
        &self.phases
    }

    /// 外部执行器
    pub fn executors(&self) -> &ExecutorRegistry<S> {
        &self.core.executors
    }

    /// 配置的精度
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// 是否已构建
    pub fn is_built(&self) -> bool {
        self.built
    }
}
