// crates/ms_population/src/processes/mortality_instantaneous.rs

//! 瞬时死亡：自然死亡与多个渔业在同一次执行中作用
//!
//! 渔业按半个自然死亡之后的易捕生物量计算开发率，
//! 同一类别-年龄上各渔业的开发率相加：
//!
//! ```text
//! vul_f  = Σ data · w · fsel_f · exp(-½ · r · M · sel)
//! U_f    = catch_f / zero_fun(vul_f)
//! U(a)   = Σ_f U_f · fsel_f(a)
//! data  *= exp(-r · M · sel) · (1 - U(a))
//! ```

use std::any::Any;
use std::collections::{BTreeMap, HashMap};

use ms_config::{FisheryConfig, MortalityInstantaneousConfig};
use ms_foundation::{MsError, MsResult};
use ms_runtime::{zero_fun, AgeTotal, RuntimeScalar};
use tracing::warn;

use super::common::{broadcast, check_all_in_range, ensure_non_negative, year_table};
use super::mortality_constant_rate::resolve_time_step_ratios;
use super::traits::{BuildContext, Process, ProcessContext, ProcessType};
use crate::model::ModelInfo;
use crate::partition::CategoriesAccessor;
use crate::selectivity::SelectivityId;

/// 一个渔业
struct Fishery<S: RuntimeScalar> {
    config: FisheryConfig,
    time_step: usize,
    catches: BTreeMap<u32, S>,
    u_max: S,
    selectivities: Vec<SelectivityId>,
    actual_catch: BTreeMap<u32, S>,
    exploitation: BTreeMap<u32, S>,
    /// 年份 -> 类别位置 -> 各年龄渔获数量
    catch_at_age: BTreeMap<u32, Vec<Vec<S>>>,
}

/// 瞬时死亡
pub struct MortalityInstantaneous<S: RuntimeScalar> {
    label: String,
    config: MortalityInstantaneousConfig,
    category_labels: Vec<String>,
    m: Vec<S>,
    selectivities: Vec<SelectivityId>,
    ratios: HashMap<usize, S>,
    fisheries: Vec<Fishery<S>>,
    accessor: CategoriesAccessor,
}

impl<S: RuntimeScalar> MortalityInstantaneous<S> {
    /// 从配置创建，类别标签已展开
    pub fn new(config: &MortalityInstantaneousConfig, categories: Vec<String>) -> Self {
        Self {
            label: config.label.clone(),
            config: config.clone(),
            category_labels: categories,
            m: Vec::new(),
            selectivities: Vec::new(),
            ratios: HashMap::new(),
            fisheries: Vec::new(),
            accessor: CategoriesAccessor::default(),
        }
    }

    fn fishery(&self, label: &str) -> Option<&Fishery<S>> {
        self.fisheries.iter().find(|f| f.config.label == label)
    }

    /// 渔业标签
    pub fn fishery_labels(&self) -> Vec<&str> {
        self.fisheries.iter().map(|f| f.config.label.as_str()).collect()
    }

    /// 某渔业某年的实际渔获量（生物量）
    pub fn actual_catch(&self, fishery: &str, year: u32) -> Option<S> {
        self.fishery(fishery)?.actual_catch.get(&year).copied()
    }

    /// 某渔业某年的开发率（截断后）
    pub fn exploitation(&self, fishery: &str, year: u32) -> Option<S> {
        self.fishery(fishery)?.exploitation.get(&year).copied()
    }

    /// 某渔业某年某类别的各年龄渔获数量
    pub fn catch_at_age(&self, fishery: &str, category: &str, year: u32) -> Option<&[S]> {
        let position = self.category_labels.iter().position(|c| c == category)?;
        self.fishery(fishery)?
            .catch_at_age
            .get(&year)?
            .get(position)
            .map(Vec::as_slice)
    }
}

impl<S: RuntimeScalar> Process<S> for MortalityInstantaneous<S> {
    fn label(&self) -> &str {
        &self.label
    }

    fn type_name(&self) -> &'static str {
        "mortality_instantaneous"
    }

    fn process_type(&self) -> ProcessType {
        ProcessType::Mortality
    }

    fn validate(&mut self, info: &ModelInfo) -> MsResult<()> {
        let label = self.label.clone();
        let count = self.category_labels.len();
        if count == 0 {
            return Err(MsError::invalid_config(format!("{label}.categories"), "[]", "至少需要一个类别"));
        }
        let m = broadcast(self.config.m.clone(), count, &format!("{label}.m"))?;
        check_all_in_range(&format!("{label}.m"), &m, 0.0, 1.0)?;
        self.m = m.into_iter().map(S::from_config).collect();

        let mut fisheries = Vec::with_capacity(self.config.fisheries.len());
        for fishery in &self.config.fisheries {
            let name = format!("{label}.fisheries.{}", fishery.label);
            if fisheries.iter().any(|f: &Fishery<S>| f.config.label == fishery.label) {
                return Err(MsError::duplicate("fishery", fishery.label.clone()));
            }
            let time_step = info
                .time_step_index(&fishery.time_step)
                .ok_or_else(|| MsError::unknown_label("time_step", fishery.time_step.clone()))?;
            if !(fishery.u_max > 0.0 && fishery.u_max <= 1.0) {
                return Err(MsError::out_of_range(format!("{name}.u_max"), fishery.u_max, 0.0, 1.0));
            }
            let mut catches = BTreeMap::new();
            for (year, catch) in year_table(&name, &fishery.years, &fishery.catches)? {
                if !info.is_model_year(year) {
                    return Err(MsError::out_of_range(
                        format!("{name}.years"),
                        f64::from(year),
                        f64::from(info.start_year),
                        f64::from(info.final_year),
                    ));
                }
                MsError::check_range(&format!("{name}.catches"), catch, 0.0, f64::MAX)?;
                catches.insert(year, S::from_config(catch));
            }
            fisheries.push(Fishery {
                config: fishery.clone(),
                time_step,
                catches,
                u_max: S::from_config(fishery.u_max),
                selectivities: Vec::new(),
                actual_catch: BTreeMap::new(),
                exploitation: BTreeMap::new(),
                catch_at_age: BTreeMap::new(),
            });
        }
        self.fisheries = fisheries;
        Ok(())
    }

    fn build(&mut self, ctx: &BuildContext<'_, S>) -> MsResult<()> {
        let count = self.category_labels.len();
        self.accessor = CategoriesAccessor::new(ctx.partition, &self.category_labels)?;
        self.selectivities = ctx.selectivities.resolve_broadcast(
            &self.config.selectivities,
            count,
            &format!("{}.selectivities", self.label),
        )?;
        let steps = ctx.time_steps_of(&self.label);
        self.ratios = resolve_time_step_ratios(&self.label, self.config.time_step_ratio.as_deref(), &steps)?;
        for fishery in &mut self.fisheries {
            if !steps.contains(&fishery.time_step) {
                return Err(MsError::invalid_config(
                    format!("{}.fisheries.{}.time_step", self.label, fishery.config.label),
                    &fishery.config.time_step,
                    "该时间步中没有此死亡过程",
                ));
            }
            fishery.selectivities = ctx.selectivities.resolve_broadcast(
                &fishery.config.selectivities,
                count,
                &format!("{}.fisheries.{}.selectivities", self.label, fishery.config.label),
            )?;
            if let Some(penalty) = &fishery.config.penalty {
                ctx.penalties.check_label(penalty)?;
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        for fishery in &mut self.fisheries {
            fishery.actual_catch.clear();
            fishery.exploitation.clear();
            fishery.catch_at_age.clear();
        }
    }

    fn execute(&mut self, ctx: &mut ProcessContext<'_, S>) -> MsResult<()> {
        let year = ctx.year();
        let time_step = ctx.time_step();
        let ratio = self.ratios.get(&time_step).copied().unwrap_or(S::ONE);
        let selectivities = ctx.selectivities;
        let positions = self.accessor.len();

        // 渔业只在主年循环中作用
        let active: Vec<usize> = if ctx.info.is_initialising() {
            Vec::new()
        } else {
            self.fisheries
                .iter()
                .enumerate()
                .filter(|(_, f)| f.time_step == time_step && f.catches.contains_key(&year))
                .map(|(i, _)| i)
                .collect()
        };

        // 各类别位置、年龄的自然死亡率与渔业选择性
        let mut natural: Vec<Vec<S>> = vec![Vec::new(); positions];
        let mut fsel: Vec<Vec<Vec<S>>> = vec![vec![Vec::new(); positions]; active.len()];
        for (i, category) in self.accessor.iter(ctx.partition, year) {
            let ages = category.min_age()..=category.max_age();
            natural[i] = ages
                .clone()
                .map(|age| self.m[i] * ratio * selectivities.value(self.selectivities[i], age))
                .collect();
            for (k, &f) in active.iter().enumerate() {
                let id = self.fisheries[f].selectivities[i];
                fsel[k][i] = ages.clone().map(|age| selectivities.value(id, age)).collect();
            }
        }

        // 易捕生物量与初始开发率
        let mut rates: Vec<S> = Vec::with_capacity(active.len());
        for (k, &f) in active.iter().enumerate() {
            let mut vulnerable = AgeTotal::new();
            for (i, category) in self.accessor.iter(ctx.partition, year) {
                for (a, &value) in category.data().iter().enumerate() {
                    let half_survival = (-(S::HALF * natural[i][a])).exp();
                    let weight = category.mean_weight(year, time_step, a) * fsel[k][i][a] * half_survival;
                    vulnerable.add_weighted(value, weight);
                }
            }
            let vul = vulnerable.total();
            let catch = self.fisheries[f].catches[&year];
            rates.push(catch / zero_fun(vul));
        }

        let total_exploitation = |rates: &[S]| -> Vec<Vec<S>> {
            (0..positions)
                .map(|i| {
                    (0..natural[i].len())
                        .map(|a| {
                            (0..rates.len())
                                .map(|k| rates[k] * fsel[k][i][a])
                                .fold(S::ZERO, |acc, x| acc + x)
                        })
                        .collect()
                })
                .collect()
        };

        let mut exploitation = total_exploitation(&rates);
        for (k, &f) in active.iter().enumerate() {
            let fishery = &self.fisheries[f];
            let observed = (0..positions)
                .flat_map(|i| {
                    let fsel_k = &fsel[k][i];
                    exploitation[i]
                        .iter()
                        .zip(fsel_k)
                        .filter(|(_, s)| **s > S::ZERO)
                        .map(|(&u, _)| u)
                        .collect::<Vec<_>>()
                })
                .fold(S::ZERO, |acc, u| acc.max(u));
            if observed > fishery.u_max {
                let catch = fishery.catches[&year];
                rates[k] *= fishery.u_max / observed;
                warn!(
                    "过程 '{}' 渔业 '{}' {} 年开发率 {:.4} 超过上限 {:.4}，已缩放",
                    self.label,
                    fishery.config.label,
                    year,
                    observed.to_report(),
                    fishery.u_max.to_report()
                );
                if let Some(penalty) = &fishery.config.penalty {
                    ctx.penalties
                        .trigger(penalty, catch, catch * fishery.u_max / observed, year)?;
                }
                exploitation = total_exploitation(&rates);
            }
        }

        // 渔获记录
        for (k, &f) in active.iter().enumerate() {
            let mut catch_at_age: Vec<Vec<S>> = vec![Vec::new(); positions];
            let mut total = AgeTotal::new();
            for (i, category) in self.accessor.iter(ctx.partition, year) {
                catch_at_age[i] = category
                    .data()
                    .iter()
                    .enumerate()
                    .map(|(a, &value)| {
                        let half_survival = (-(S::HALF * natural[i][a])).exp();
                        let caught = value * half_survival * rates[k] * fsel[k][i][a];
                        total.add_weighted(caught, category.mean_weight(year, time_step, a));
                        caught
                    })
                    .collect();
            }
            let fishery = &mut self.fisheries[f];
            fishery.actual_catch.insert(year, total.total());
            fishery.exploitation.insert(year, rates[k]);
            fishery.catch_at_age.insert(year, catch_at_age);
        }

        // 消耗
        let label = &self.label;
        self.accessor.for_each_mut(ctx.partition, year, |i, category| {
            for (a, value) in category.data_mut().iter_mut().enumerate() {
                let u = exploitation[i].get(a).copied().unwrap_or(S::ZERO);
                *value *= (-natural[i][a]).exp() * (S::ONE - u);
            }
            ensure_non_negative(label, category)
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
