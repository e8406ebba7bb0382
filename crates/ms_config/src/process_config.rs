// crates/ms_config/src/process_config.rs

//! 过程配置
//!
//! `type` 字段选择过程种类，引擎层的过程工厂按该标签构造对应实现。

use serde::{Deserialize, Serialize};

/// 过程配置（按 `type` 标记）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProcessConfig {
    /// 年龄增长
    Ageing(AgeingConfig),
    /// 恒定补充
    RecruitmentConstant(RecruitmentConstantConfig),
    /// Beverton-Holt 补充（含年级强度偏差）
    RecruitmentBevertonHolt(RecruitmentBevertonHoltConfig),
    /// 恒定自然死亡率
    MortalityConstantRate(MortalityConstantRateConfig),
    /// 按生物量的捕捞事件
    MortalityEventBiomass(MortalityEventBiomassConfig),
    /// 瞬时死亡（自然死亡 + 多个渔业）
    MortalityInstantaneous(MortalityInstantaneousConfig),
    /// 类别转移
    TransitionCategory(TransitionCategoryConfig),
    /// 性成熟
    Maturation(MaturationConfig),
    /// 状态注入
    StateInjection(StateInjectionConfig),
    /// 空过程
    Nop(NopConfig),
}

impl ProcessConfig {
    /// 过程标签
    pub fn label(&self) -> &str {
        match self {
            Self::Ageing(c) => &c.label,
            Self::RecruitmentConstant(c) => &c.label,
            Self::RecruitmentBevertonHolt(c) => &c.label,
            Self::MortalityConstantRate(c) => &c.label,
            Self::MortalityEventBiomass(c) => &c.label,
            Self::MortalityInstantaneous(c) => &c.label,
            Self::TransitionCategory(c) => &c.label,
            Self::Maturation(c) => &c.label,
            Self::StateInjection(c) => &c.label,
            Self::Nop(c) => &c.label,
        }
    }

    /// 类型名（与配置文件中的 `type` 一致）
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Ageing(_) => "ageing",
            Self::RecruitmentConstant(_) => "recruitment_constant",
            Self::RecruitmentBevertonHolt(_) => "recruitment_beverton_holt",
            Self::MortalityConstantRate(_) => "mortality_constant_rate",
            Self::MortalityEventBiomass(_) => "mortality_event_biomass",
            Self::MortalityInstantaneous(_) => "mortality_instantaneous",
            Self::TransitionCategory(_) => "transition_category",
            Self::Maturation(_) => "maturation",
            Self::StateInjection(_) => "state_injection",
            Self::Nop(_) => "nop",
        }
    }

    /// 所有受支持的类型名
    pub fn supported_types() -> &'static [&'static str] {
        &[
            "ageing",
            "recruitment_constant",
            "recruitment_beverton_holt",
            "mortality_constant_rate",
            "mortality_event_biomass",
            "mortality_instantaneous",
            "transition_category",
            "maturation",
            "state_injection",
            "nop",
        ]
    }
}

/// 年龄增长
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgeingConfig {
    /// 标签
    pub label: String,
    /// 目标类别
    pub categories: Vec<String>,
}

/// 恒定补充
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecruitmentConstantConfig {
    /// 标签
    pub label: String,
    /// 目标类别
    pub categories: Vec<String>,
    /// 各类别比例（省略时平均分配）
    #[serde(default)]
    pub proportions: Option<Vec<f64>>,
    /// 补充年龄
    pub age: u32,
    /// 年补充量 R0
    pub r0: f64,
}

/// Beverton-Holt 补充
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecruitmentBevertonHoltConfig {
    /// 标签
    pub label: String,
    /// 目标类别
    pub categories: Vec<String>,
    /// 平均补充量 R0（与 b0 二选一）
    #[serde(default)]
    pub r0: Option<f64>,
    /// 原始产卵生物量 B0（与 r0 二选一）
    #[serde(default)]
    pub b0: Option<f64>,
    /// 各类别比例（省略时平均分配）
    #[serde(default)]
    pub proportions: Option<Vec<f64>>,
    /// 补充年龄（默认模型最小年龄）
    #[serde(default)]
    pub age: Option<u32>,
    /// SSB 年份偏移（默认按年内过程顺序推算）
    #[serde(default)]
    pub ssb_offset: Option<u32>,
    /// 陡度 h
    #[serde(default = "default_steepness")]
    pub steepness: f64,
    /// SSB 派生量标签
    pub ssb: String,
    /// 补充标准差 σ_R
    #[serde(default = "default_sigma_r")]
    pub sigma_r: f64,
    /// 最大偏差校正
    #[serde(default = "default_b_max")]
    pub b_max: f64,
    /// 最后一个无偏差校正年
    #[serde(default)]
    pub last_year_with_no_bias: Option<u32>,
    /// 第一个完全校正年
    #[serde(default)]
    pub first_year_with_bias: Option<u32>,
    /// 最后一个完全校正年
    #[serde(default)]
    pub last_year_with_bias: Option<u32>,
    /// 近期第一个无校正年
    #[serde(default)]
    pub first_recent_year_with_no_bias: Option<u32>,
    /// 计算 B0 的初始化阶段（默认第一个阶段）
    #[serde(default)]
    pub b0_phase: Option<String>,
    /// 各模型年份的补充偏差
    #[serde(default)]
    pub deviation_values: Option<Vec<f64>>,
}

fn default_steepness() -> f64 {
    1.0
}

fn default_sigma_r() -> f64 {
    1.0
}

fn default_b_max() -> f64 {
    0.85
}

/// 恒定自然死亡率
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortalityConstantRateConfig {
    /// 标签
    pub label: String,
    /// 目标类别
    pub categories: Vec<String>,
    /// 死亡率（一个值广播或每类别一个）
    pub m: Vec<f64>,
    /// 选择性标签（一个广播或每类别一个）
    pub selectivities: Vec<String>,
    /// 各时间步所占比例
    #[serde(default)]
    pub time_step_ratio: Option<Vec<f64>>,
}

/// 按生物量的捕捞事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortalityEventBiomassConfig {
    /// 标签
    pub label: String,
    /// 目标类别
    pub categories: Vec<String>,
    /// 选择性标签（一个广播或每类别一个）
    pub selectivities: Vec<String>,
    /// 捕捞年份
    pub years: Vec<u32>,
    /// 渔获量（与年份一一对应）
    pub catches: Vec<f64>,
    /// 最大开发率
    #[serde(default = "default_u_max")]
    pub u_max: f64,
    /// 惩罚标签
    #[serde(default)]
    pub penalty: Option<String>,
    /// 执行的模型状态
    ///
    /// `true`: 只在初始化阶段执行，年份取起始年；
    /// `false`（默认）: 只在主年循环的 `years` 中执行，初始化阶段跳过。
    #[serde(default)]
    pub initialisation_only: bool,
}

fn default_u_max() -> f64 {
    0.99
}

/// 瞬时死亡
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortalityInstantaneousConfig {
    /// 标签
    pub label: String,
    /// 目标类别
    pub categories: Vec<String>,
    /// 自然死亡率（一个值广播或每类别一个）
    pub m: Vec<f64>,
    /// 自然死亡选择性
    pub selectivities: Vec<String>,
    /// 各时间步所占比例
    #[serde(default)]
    pub time_step_ratio: Option<Vec<f64>>,
    /// 渔业
    #[serde(default)]
    pub fisheries: Vec<FisheryConfig>,
}

/// 瞬时死亡中的一个渔业
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FisheryConfig {
    /// 渔业标签
    pub label: String,
    /// 作业时间步
    pub time_step: String,
    /// 捕捞年份
    pub years: Vec<u32>,
    /// 渔获量
    pub catches: Vec<f64>,
    /// 最大开发率
    #[serde(default = "default_u_max")]
    pub u_max: f64,
    /// 惩罚标签
    #[serde(default)]
    pub penalty: Option<String>,
    /// 渔业选择性（一个广播或每类别一个）
    pub selectivities: Vec<String>,
}

/// 类别转移
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionCategoryConfig {
    /// 标签
    pub label: String,
    /// 源类别
    pub from: Vec<String>,
    /// 目标类别
    pub to: Vec<String>,
    /// 转移比例（一个广播或每对一个）
    pub proportions: Vec<f64>,
    /// 选择性（一个广播或每对一个）
    pub selectivities: Vec<String>,
}

/// 性成熟
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaturationConfig {
    /// 标签
    pub label: String,
    /// 未成熟类别
    pub from: Vec<String>,
    /// 成熟类别
    pub to: Vec<String>,
    /// 给出比例的年份
    pub years: Vec<u32>,
    /// 各年份的成熟比例
    pub rates: Vec<f64>,
    /// 选择性（一个广播或每对一个）
    pub selectivities: Vec<String>,
}

/// 状态注入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateInjectionConfig {
    /// 标签
    pub label: String,
    /// 目标类别
    pub category: String,
    /// 覆盖起始年龄（默认类别最小年龄）
    #[serde(default)]
    pub from_age: Option<u32>,
    /// 覆盖值
    pub values: Vec<f64>,
}

/// 空过程
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NopConfig {
    /// 标签
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beverton_holt_defaults() {
        let yaml = r#"
type: recruitment_beverton_holt
label: recruitment
categories: [stock]
r0: 1.0e6
ssb: ssb
"#;
        let config: ProcessConfig = serde_yaml::from_str(yaml).unwrap();
        match config {
            ProcessConfig::RecruitmentBevertonHolt(c) => {
                assert_eq!(c.steepness, 1.0);
                assert_eq!(c.b_max, 0.85);
                assert!(c.b0.is_none());
            }
            other => panic!("unexpected variant: {}", other.type_name()),
        }
    }

    #[test]
    fn test_event_biomass_defaults_to_main_loop() {
        let yaml = r#"
type: mortality_event_biomass
label: fishing
categories: [stock]
selectivities: [one]
years: [2000]
catches: [200]
"#;
        let config: ProcessConfig = serde_yaml::from_str(yaml).unwrap();
        match config {
            ProcessConfig::MortalityEventBiomass(c) => {
                assert!(!c.initialisation_only);
                assert_eq!(c.u_max, 0.99);
                assert!(c.penalty.is_none());
            }
            other => panic!("unexpected variant: {}", other.type_name()),
        }
    }

    #[test]
    fn test_supported_types_cover_variants() {
        let nop = ProcessConfig::Nop(NopConfig { label: "idle".into() });
        assert!(ProcessConfig::supported_types().contains(&nop.type_name()));
        assert_eq!(nop.label(), "idle");
    }
}
