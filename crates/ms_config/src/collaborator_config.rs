// crates/ms_config/src/collaborator_config.rs

//! 协作者配置：选择性、年龄-体长模型、派生量、惩罚项

use serde::{Deserialize, Serialize};

// =============================================================================
// 选择性
// =============================================================================

/// 选择性配置（按 `type` 标记）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SelectivityConfig {
    /// 常数
    Constant {
        /// 标签
        label: String,
        /// 常数值
        c: f64,
    },
    /// 刀刃型：age >= e 时为 alpha
    KnifeEdge {
        /// 标签
        label: String,
        /// 刀刃年龄
        e: f64,
        /// 上限
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    /// Logistic: `alpha / (1 + 19^((a50 - age) / ato95))`
    Logistic {
        /// 标签
        label: String,
        /// 50% 选择年龄
        a50: f64,
        /// 50% 到 95% 的年龄差
        ato95: f64,
        /// 上限
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    /// 每个年龄一个值
    AllValues {
        /// 标签
        label: String,
        /// 从 min_age 到 max_age 的值
        values: Vec<f64>,
    },
    /// 双正态
    DoubleNormal {
        /// 标签
        label: String,
        /// 峰值年龄
        mu: f64,
        /// 左侧宽度
        sigma_l: f64,
        /// 右侧宽度
        sigma_r: f64,
        /// 上限
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
}

fn default_alpha() -> f64 {
    1.0
}

impl SelectivityConfig {
    /// 标签
    pub fn label(&self) -> &str {
        match self {
            Self::Constant { label, .. }
            | Self::KnifeEdge { label, .. }
            | Self::Logistic { label, .. }
            | Self::AllValues { label, .. }
            | Self::DoubleNormal { label, .. } => label,
        }
    }

    /// 所有受支持的类型名
    pub fn supported_types() -> &'static [&'static str] {
        &["constant", "knife_edge", "logistic", "all_values", "double_normal"]
    }
}

// =============================================================================
// 年龄-体长
// =============================================================================

/// 年龄-体长模型配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgeLengthConfig {
    /// von Bertalanffy 生长 + `a·L^b` 体长-体重关系
    VonBertalanffy {
        /// 标签
        label: String,
        /// 渐近体长
        linf: f64,
        /// 生长系数
        k: f64,
        /// 理论零体长年龄
        t0: f64,
        /// 体长-体重系数 a
        a: f64,
        /// 体长-体重指数 b
        b: f64,
        /// 各时间步的年内生长比例（省略时全部为 0）
        #[serde(default)]
        time_step_proportions: Vec<f64>,
    },
}

impl AgeLengthConfig {
    /// 标签
    pub fn label(&self) -> &str {
        match self {
            Self::VonBertalanffy { label, .. } => label,
        }
    }
}

// =============================================================================
// 派生量
// =============================================================================

/// 时间步内插值方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProportionMethod {
    /// 算术加权：`cache + (value - cache) * p`
    #[default]
    WeightedSum,
    /// 几何加权：`cache^(1-p) * value^p`
    WeightedProduct,
}

/// 派生量公共参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedQuantitySettings {
    /// 标签
    pub label: String,
    /// 计算所在时间步
    pub time_step: String,
    /// 类别
    pub categories: Vec<String>,
    /// 选择性（一个广播或每类别一个）
    pub selectivities: Vec<String>,
    /// 死亡块内的时间比例
    #[serde(default = "default_time_step_proportion")]
    pub time_step_proportion: f64,
    /// 插值方法
    #[serde(default)]
    pub time_step_proportion_method: ProportionMethod,
}

fn default_time_step_proportion() -> f64 {
    0.5
}

/// 派生量配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DerivedQuantityConfig {
    /// 生物量：Σ 数量 × 选择性 × 平均体重
    Biomass(DerivedQuantitySettings),
    /// 丰度：Σ 数量 × 选择性
    Abundance(DerivedQuantitySettings),
}

impl DerivedQuantityConfig {
    /// 公共参数
    pub fn settings(&self) -> &DerivedQuantitySettings {
        match self {
            Self::Biomass(s) | Self::Abundance(s) => s,
        }
    }

    /// 标签
    pub fn label(&self) -> &str {
        &self.settings().label
    }
}

// =============================================================================
// 惩罚项
// =============================================================================

/// 惩罚项配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyConfig {
    /// 标签
    pub label: String,
    /// 乘数
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// 是否在对数尺度上计算
    #[serde(default)]
    pub log_scale: bool,
}

fn default_multiplier() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_quantity_defaults() {
        let yaml = r#"
type: biomass
label: ssb
time_step: step_one
categories: [mature]
selectivities: [one]
"#;
        let config: DerivedQuantityConfig = serde_yaml::from_str(yaml).unwrap();
        let s = config.settings();
        assert_eq!(s.time_step_proportion, 0.5);
        assert_eq!(s.time_step_proportion_method, ProportionMethod::WeightedSum);
    }

    #[test]
    fn test_selectivity_alpha_default() {
        let yaml = "type: logistic\nlabel: fsel\na50: 5\nato95: 2\n";
        let config: SelectivityConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.label(), "fsel");
        assert!(matches!(config, SelectivityConfig::Logistic { alpha, .. } if alpha == 1.0));
    }
}
