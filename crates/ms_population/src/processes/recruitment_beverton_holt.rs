// crates/ms_population/src/processes/recruitment_beverton_holt.rs

//! Beverton-Holt 补充（含年级强度偏差）
//!
//! ```text
//! SR(x)     = x / (1 - (5h - 1) / (4h) · (1 - x))        x = SSB / B0
//! ycs_y     = exp(dev_y - bias_y · σ_R² / 2)
//! recruits  = R0 · ycs_y · SR(SSB_{y - offset} / B0)
//! ```
//!
//! B0 是 B0 初始化阶段结束时 SSB 派生量的值。给定 `b0` 而不是 `r0` 时，
//! B0 阶段内 `r0 = 1`，阶段结束时按 `b0 / SSB` 缩放分区与 `r0`。

use std::any::Any;
use std::collections::BTreeMap;

use ms_config::RecruitmentBevertonHoltConfig;
use ms_foundation::{MsError, MsResult};
use ms_runtime::RuntimeScalar;
use tracing::debug;

use super::common::check_all_in_range;
use super::traits::{BuildContext, Process, ProcessContext, ProcessOrderEntry, ProcessType};
use crate::derived_quantity::{DerivedQuantityId, DerivedQuantityRegistry};
use crate::model::ModelInfo;
use crate::partition::{CategoriesAccessor, Partition};

/// 比例之和的容差
const PROPORTION_TOLERANCE: f64 = 1e-5;

/// Beverton-Holt 补充
pub struct RecruitmentBevertonHolt<S: RuntimeScalar> {
    label: String,
    config: RecruitmentBevertonHoltConfig,
    category_labels: Vec<String>,
    accessor: CategoriesAccessor,
    proportions: Vec<S>,
    age_index: usize,
    ssb_offset: u32,
    steepness: S,
    sigma_r: S,
    /// 配置给定的 R0；b0 模式下为 1
    initial_r0: S,
    r0: S,
    /// b0 模式下配置给定的 B0
    b0_config: Option<S>,
    b0_phase: usize,
    ssb: Option<DerivedQuantityId>,
    deviations: Vec<S>,
    bias: Vec<S>,
    partition_scaled: bool,
    ssb_values: BTreeMap<u32, S>,
    ycs_values: BTreeMap<u32, S>,
    true_ycs_values: BTreeMap<u32, S>,
    recruitment_values: BTreeMap<u32, S>,
}

impl<S: RuntimeScalar> RecruitmentBevertonHolt<S> {
    /// 从配置创建，类别标签已展开
    pub fn new(config: &RecruitmentBevertonHoltConfig, categories: Vec<String>) -> Self {
        Self {
            label: config.label.clone(),
            config: config.clone(),
            category_labels: categories,
            accessor: CategoriesAccessor::default(),
            proportions: Vec::new(),
            age_index: 0,
            ssb_offset: 0,
            steepness: S::ONE,
            sigma_r: S::ONE,
            initial_r0: S::ONE,
            r0: S::ONE,
            b0_config: None,
            b0_phase: 0,
            ssb: None,
            deviations: Vec::new(),
            bias: Vec::new(),
            partition_scaled: false,
            ssb_values: BTreeMap::new(),
            ycs_values: BTreeMap::new(),
            true_ycs_values: BTreeMap::new(),
            recruitment_values: BTreeMap::new(),
        }
    }

    /// 当前 R0
    pub fn r0(&self) -> S {
        self.r0
    }

    /// SSB 年份偏移
    pub fn ssb_offset(&self) -> u32 {
        self.ssb_offset
    }

    /// B0 初始化阶段索引
    pub fn b0_phase(&self) -> usize {
        self.b0_phase
    }

    /// 是否由 b0 给定（需要在 B0 阶段结束时缩放分区）
    pub fn b0_initialised(&self) -> bool {
        self.b0_config.is_some()
    }

    /// 本次运行是否已按 B0 缩放过分区
    pub fn partition_scaled(&self) -> bool {
        self.partition_scaled
    }

    /// 各年份的偏差校正量
    pub fn bias_adjustments(&self) -> &[S] {
        &self.bias
    }

    /// 逐年 SSB
    pub fn ssb_values(&self) -> &BTreeMap<u32, S> {
        &self.ssb_values
    }

    /// 逐年年级强度
    pub fn ycs_values(&self) -> &BTreeMap<u32, S> {
        &self.ycs_values
    }

    /// 逐年 `ycs · SR`
    pub fn true_ycs_values(&self) -> &BTreeMap<u32, S> {
        &self.true_ycs_values
    }

    /// 逐年补充量
    pub fn recruitment_values(&self) -> &BTreeMap<u32, S> {
        &self.recruitment_values
    }

    /// 当前使用的 B0
    pub fn b0(&self, derived_quantities: &DerivedQuantityRegistry<S>) -> MsResult<S> {
        if let Some(b0) = self.b0_config {
            return Ok(b0);
        }
        let dq = derived_quantities.get(self.ssb_id()?);
        dq.last_value_from_initialisation(self.b0_phase).ok_or_else(|| {
            MsError::runtime(format!(
                "过程 '{}': 派生量 '{}' 在 B0 阶段没有记录值",
                self.label,
                dq.label()
            ))
        })
    }

    /// 应力-补充关系
    pub fn stock_recruit(&self, ratio: S) -> S {
        let h = self.steepness;
        let five = S::from_config(5.0);
        let four = S::from_config(4.0);
        ratio / (S::ONE - ((five * h - S::ONE) / (four * h)) * (S::ONE - ratio))
    }

    fn ssb_id(&self) -> MsResult<DerivedQuantityId> {
        self.ssb
            .ok_or_else(|| MsError::lifecycle(&self.label, "built", "validated"))
    }

    /// B0 阶段结束时按 `b0 / SSB` 缩放 R0 与目标类别
    pub fn scale_partition(
        &mut self,
        info: &ModelInfo,
        partition: &mut Partition<S>,
        derived_quantities: &DerivedQuantityRegistry<S>,
    ) -> MsResult<()> {
        let Some(b0) = self.b0_config else {
            return Ok(());
        };
        let dq = derived_quantities.get(self.ssb_id()?);
        let ssb_year = info.start_year.checked_sub(self.ssb_offset);
        let ssb = ssb_year
            .filter(|&y| y >= info.start_year)
            .and_then(|y| dq.value(y))
            .or_else(|| dq.last_value_from_initialisation(self.b0_phase))
            .ok_or_else(|| {
                MsError::runtime(format!(
                    "过程 '{}': 缩放分区时派生量 '{}' 没有值",
                    self.label,
                    dq.label()
                ))
            })?;
        let scalar = b0 / ms_runtime::zero_fun(ssb);
        self.r0 *= scalar;
        self.partition_scaled = true;
        for &id in self.accessor.ids() {
            partition
                .get_mut(id)
                .data_mut()
                .iter_mut()
                .for_each(|v| *v *= scalar);
        }
        debug!(
            "过程 '{}' 按 B0 缩放分区: scalar={:.6}, r0={:.3}",
            self.label,
            scalar.to_report(),
            self.r0.to_report()
        );
        Ok(())
    }

    /// Methot-Taylor 偏差校正斜坡
    fn bias_ramp(&self, year: u32, b: [u32; 4]) -> f64 {
        let b_max = self.config.b_max;
        let (year, b1, b2, b3, b4) = (
            f64::from(year),
            f64::from(b[0]),
            f64::from(b[1]),
            f64::from(b[2]),
            f64::from(b[3]),
        );
        if year <= b1 || year >= b4 {
            0.0
        } else if year < b2 {
            b_max * (year - b1) / (b2 - b1)
        } else if year <= b3 {
            b_max
        } else {
            b_max * (1.0 - (year - b3) / (b4 - b3))
        }
    }

    /// 默认 SSB 偏移：由年循环中补充、增长与 SSB 计算点的相对位置决定
    fn default_ssb_offset(
        &self,
        order: &[ProcessOrderEntry],
        ssb_time_step: usize,
        age: u32,
    ) -> MsResult<u32> {
        // 位置加倍，奇数表示时间步中无死亡过程时的虚拟位置
        let recruitment = order
            .iter()
            .position(|e| e.label == self.label)
            .map(|i| 2 * i as i64)
            .ok_or_else(|| {
                MsError::config(format!("过程 '{}' 未被任何时间步使用", self.label))
            })?;
        let ageing: Vec<i64> = order
            .iter()
            .enumerate()
            .filter(|(_, e)| e.process_type == ProcessType::Ageing)
            .map(|(i, _)| 2 * i as i64)
            .collect();
        let [ageing] = ageing.as_slice() else {
            return Err(MsError::config(format!(
                "过程 '{}': 无法推算 ssb_offset, 年循环中必须恰有一个 ageing 过程 (实际 {} 个)",
                self.label,
                ageing.len()
            )));
        };
        let ageing = *ageing;
        let in_step: Vec<usize> = order
            .iter()
            .enumerate()
            .filter(|(_, e)| e.time_step == ssb_time_step)
            .map(|(i, _)| i)
            .collect();
        let ssb = match in_step
            .iter()
            .rev()
            .find(|&&i| order[i].process_type == ProcessType::Mortality)
        {
            Some(&i) => 2 * i as i64,
            None => match in_step.last() {
                Some(&last) => 2 * last as i64 + 1,
                None => {
                    let before = order.iter().filter(|e| e.time_step < ssb_time_step).count();
                    2 * before as i64 - 1
                }
            },
        };

        if recruitment < ageing && ageing < ssb {
            Ok(age + 1)
        } else if ssb < ageing && ageing < recruitment {
            age.checked_sub(1).ok_or_else(|| {
                MsError::config(format!("过程 '{}': 推算的 ssb_offset 为负", self.label))
            })
        } else {
            Ok(age)
        }
    }
}

impl<S: RuntimeScalar> Process<S> for RecruitmentBevertonHolt<S> {
    fn label(&self) -> &str {
        &self.label
    }

    fn type_name(&self) -> &'static str {
        "recruitment_beverton_holt"
    }

    fn process_type(&self) -> ProcessType {
        ProcessType::Recruitment
    }

    fn validate(&mut self, info: &ModelInfo) -> MsResult<()> {
        let label = self.label.clone();
        let c = &self.config;
        if self.category_labels.is_empty() {
            return Err(MsError::invalid_config(format!("{label}.categories"), "[]", "至少需要一个类别"));
        }
        match (c.r0, c.b0) {
            (Some(r0), None) => {
                MsError::check_range(&format!("{label}.r0"), r0, 0.0, f64::MAX)?;
                self.initial_r0 = S::from_config(r0);
                self.b0_config = None;
            }
            (None, Some(b0)) => {
                MsError::check_range(&format!("{label}.b0"), b0, 0.0, f64::MAX)?;
                self.initial_r0 = S::ONE;
                self.b0_config = Some(S::from_config(b0));
            }
            _ => {
                return Err(MsError::invalid_config(
                    format!("{label}.r0"),
                    format!("r0={:?}, b0={:?}", c.r0, c.b0),
                    "r0 与 b0 必须且只能给定一个",
                ))
            }
        }
        self.r0 = self.initial_r0;

        let count = self.category_labels.len();
        let proportions = match &c.proportions {
            Some(p) => {
                MsError::check_size(&format!("{label}.proportions"), count, p.len())?;
                check_all_in_range(&format!("{label}.proportions"), p, 0.0, 1.0)?;
                let total: f64 = p.iter().sum();
                if (total - 1.0).abs() > PROPORTION_TOLERANCE {
                    return Err(MsError::invalid_config(
                        format!("{label}.proportions"),
                        total,
                        "比例之和必须为 1",
                    ));
                }
                p.clone()
            }
            None => vec![1.0 / count as f64; count],
        };
        self.proportions = proportions.into_iter().map(S::from_config).collect();

        let age = c.age.unwrap_or(info.min_age);
        MsError::check_range(
            &format!("{label}.age"),
            f64::from(age),
            f64::from(info.min_age),
            f64::from(info.max_age),
        )?;
        self.age_index = (age - info.min_age) as usize;

        MsError::check_range(&format!("{label}.steepness"), c.steepness, 0.2, 1.0)?;
        MsError::check_range(&format!("{label}.b_max"), c.b_max, 0.0, 1.0)?;
        MsError::check_range(&format!("{label}.sigma_r"), c.sigma_r, 0.0, f64::MAX)?;
        self.steepness = S::from_config(c.steepness);
        self.sigma_r = S::from_config(c.sigma_r);

        let deviations = c
            .deviation_values
            .clone()
            .unwrap_or_else(|| vec![0.0; info.year_count()]);
        MsError::check_size(&format!("{label}.deviation_values"), info.year_count(), deviations.len())?;
        self.deviations = deviations.into_iter().map(S::from_config).collect();

        let start = info.start_year;
        let b = [
            c.last_year_with_no_bias.unwrap_or(start),
            c.first_year_with_bias.unwrap_or(start),
            c.last_year_with_bias.unwrap_or(start),
            c.first_recent_year_with_no_bias.unwrap_or(start),
        ];
        if b.windows(2).any(|w| w[0] > w[1]) {
            return Err(MsError::invalid_config(
                format!("{label}.bias_years"),
                format!("{b:?}"),
                "偏差校正年份必须单调不减",
            ));
        }
        self.bias = (info.start_year..=info.final_year)
            .map(|y| S::from_config(self.bias_ramp(y, b)))
            .collect();

        if info.initialisation_phase_labels.is_empty() {
            return Err(MsError::config(format!(
                "过程 '{label}': Beverton-Holt 补充需要至少一个初始化阶段来确定 B0"
            )));
        }
        self.b0_phase = match &self.config.b0_phase {
            Some(phase) => info
                .initialisation_phase_index(phase)
                .ok_or_else(|| MsError::unknown_label("initialisation_phase", phase.clone()))?,
            None => 0,
        };
        Ok(())
    }

    fn build(&mut self, ctx: &BuildContext<'_, S>) -> MsResult<()> {
        self.accessor = CategoriesAccessor::new(ctx.partition, &self.category_labels)?;
        let ssb = ctx.derived_quantities.resolve(&self.config.ssb)?;
        self.ssb = Some(ssb);
        let age = ctx.info.min_age + self.age_index as u32;
        self.ssb_offset = match self.config.ssb_offset {
            Some(offset) => offset,
            None => {
                let ssb_time_step = ctx.derived_quantities.get(ssb).time_step();
                self.default_ssb_offset(ctx.process_order, ssb_time_step, age)?
            }
        };
        debug!("过程 '{}' ssb_offset={}", self.label, self.ssb_offset);
        Ok(())
    }

    fn reset(&mut self) {
        self.r0 = self.initial_r0;
        self.partition_scaled = false;
        self.ssb_values.clear();
        self.ycs_values.clear();
        self.true_ycs_values.clear();
        self.recruitment_values.clear();
    }

    fn execute(&mut self, ctx: &mut ProcessContext<'_, S>) -> MsResult<()> {
        let info = ctx.info;
        let year = info.current_year;
        let dq = ctx.derived_quantities.get(self.ssb_id()?);

        let amount = if info.is_initialising() {
            let phase = info.current_initialisation_phase;
            if phase <= self.b0_phase {
                self.r0
            } else {
                let b0 = self.b0(ctx.derived_quantities)?;
                let ssb = dq
                    .last_value_up_to_phase(phase)
                    .unwrap_or(b0);
                self.r0 * self.stock_recruit(ssb / ms_runtime::zero_fun(b0))
            }
        } else {
            let index = info.year_index(year).ok_or_else(|| {
                MsError::internal(format!("过程 '{}': {} 不是模型年份", self.label, year))
            })?;
            let half = S::HALF;
            let ycs = (self.deviations[index] - self.bias[index] * half * self.sigma_r * self.sigma_r).exp();
            let ssb_year = year.checked_sub(self.ssb_offset).unwrap_or(0);
            let ssb = if ssb_year < info.start_year {
                dq.last_value_from_initialisation(info.initialisation_phase_labels.len().saturating_sub(1))
            } else {
                dq.value(ssb_year)
            }
            .ok_or_else(|| {
                MsError::runtime(format!(
                    "过程 '{}': 派生量 '{}' 在 {} 年没有值",
                    self.label,
                    dq.label(),
                    ssb_year
                ))
            })?;
            let b0 = self.b0(ctx.derived_quantities)?;
            let true_ycs = ycs * self.stock_recruit(ssb / ms_runtime::zero_fun(b0));
            let amount = self.r0 * true_ycs;
            self.ssb_values.insert(year, ssb);
            self.ycs_values.insert(year, ycs);
            self.true_ycs_values.insert(year, true_ycs);
            self.recruitment_values.insert(year, amount);
            amount
        };

        let (age_index, proportions) = (self.age_index, &self.proportions);
        self.accessor.for_each_mut(ctx.partition, year, |i, category| {
            category.data_mut()[age_index] += amount * proportions[i];
            Ok(())
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
