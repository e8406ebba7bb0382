// crates/ms_config/src/model_config.rs

//! ModelConfig - 模型配置（全 f64）
//!
//! 一个模型配置文件包含：模型年份/年龄范围、类别定义、选择性与生长模型、
//! 过程列表、时间步顺序、初始化阶段与派生量。构建引擎时根据
//! `model.precision` 转换到相应精度。

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::collaborator_config::{
    AgeLengthConfig, DerivedQuantityConfig, PenaltyConfig, SelectivityConfig,
};
use crate::error::ConfigError;
use crate::phase_config::InitialisationPhaseConfig;
use crate::precision::Precision;
use crate::process_config::ProcessConfig;

/// 模型配置根节点
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// 模型范围
    pub model: ModelSection,

    /// 类别定义
    pub categories: CategoriesConfig,

    /// 选择性
    #[serde(default)]
    pub selectivities: Vec<SelectivityConfig>,

    /// 年龄-体长（生长）模型
    #[serde(default)]
    pub age_lengths: Vec<AgeLengthConfig>,

    /// 过程
    #[serde(default)]
    pub processes: Vec<ProcessConfig>,

    /// 时间步定义
    #[serde(default)]
    pub time_steps: Vec<TimeStepConfig>,

    /// 初始化阶段定义
    #[serde(default)]
    pub initialisation_phases: Vec<InitialisationPhaseConfig>,

    /// 派生量
    #[serde(default)]
    pub derived_quantities: Vec<DerivedQuantityConfig>,

    /// 惩罚项
    #[serde(default)]
    pub penalties: Vec<PenaltyConfig>,
}

/// 模型年份与年龄范围
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSection {
    /// 起始年
    pub start_year: u32,
    /// 终止年（含）
    pub final_year: u32,
    /// 最小年龄
    pub min_age: u32,
    /// 最大年龄
    pub max_age: u32,
    /// 最大年龄是否为累积组（plus group）
    #[serde(default = "default_age_plus")]
    pub age_plus: bool,
    /// 年内时间步顺序
    pub time_steps: Vec<String>,
    /// 初始化阶段顺序
    #[serde(default)]
    pub initialisation_phases: Vec<String>,
    /// 计算精度
    #[serde(default)]
    pub precision: Precision,
}

fn default_age_plus() -> bool {
    true
}

impl ModelSection {
    /// 年龄跨度 `max_age - min_age + 1`
    pub fn age_spread(&self) -> u32 {
        self.max_age.saturating_sub(self.min_age) + 1
    }

    /// 模型年份列表
    pub fn years(&self) -> Vec<u32> {
        (self.start_year..=self.final_year).collect()
    }
}

/// 类别定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesConfig {
    /// 类别名称格式，例如 `"maturity.sex"`
    pub format: String,
    /// 类别名称
    pub names: Vec<String>,
    /// 个别类别的有效年份，例如 `"tagged.male=1995,1996"`
    #[serde(default)]
    pub years: Vec<String>,
    /// 每个类别的年龄-体长模型标签（为空表示按数量计）
    #[serde(default)]
    pub age_lengths: Vec<String>,
}

/// 时间步定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeStepConfig {
    /// 标签
    pub label: String,
    /// 有序过程标签
    pub processes: Vec<String>,
}

impl ModelConfig {
    /// 从文件加载（按扩展名选择 YAML 或 JSON）
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// 从 YAML 字符串解析
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// 从 JSON 字符串解析
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// 序列化为 JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 结构性验证
    ///
    /// 只检查配置本身的一致性；标签能否解析到引擎对象在引擎 build 阶段检查。
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.model;
        if m.start_year > m.final_year {
            return Err(ConfigError::invalid(
                "model.final_year",
                m.final_year,
                format!("不能早于 start_year ({})", m.start_year),
            ));
        }
        if m.min_age > m.max_age {
            return Err(ConfigError::invalid(
                "model.max_age",
                m.max_age,
                format!("不能小于 min_age ({})", m.min_age),
            ));
        }
        if m.time_steps.is_empty() {
            return Err(ConfigError::Missing("model.time_steps".into()));
        }
        if self.categories.names.is_empty() {
            return Err(ConfigError::Missing("categories.names".into()));
        }
        if !self.categories.age_lengths.is_empty()
            && self.categories.age_lengths.len() != self.categories.names.len()
        {
            return Err(ConfigError::invalid(
                "categories.age_lengths",
                self.categories.age_lengths.len(),
                format!("数量必须与类别数量 ({}) 相同", self.categories.names.len()),
            ));
        }

        check_unique("categories", self.categories.names.iter().map(String::as_str))?;
        check_unique("selectivities", self.selectivities.iter().map(|s| s.label()))?;
        check_unique("age_lengths", self.age_lengths.iter().map(|a| a.label()))?;
        check_unique("processes", self.processes.iter().map(|p| p.label()))?;
        check_unique("time_steps", self.time_steps.iter().map(|t| t.label.as_str()))?;
        check_unique(
            "initialisation_phases",
            self.initialisation_phases.iter().map(|p| p.label()),
        )?;
        check_unique(
            "derived_quantities",
            self.derived_quantities.iter().map(|d| d.label()),
        )?;
        check_unique("penalties", self.penalties.iter().map(|p| p.label.as_str()))?;

        for label in &m.time_steps {
            if !self.time_steps.iter().any(|t| &t.label == label) {
                return Err(ConfigError::invalid(
                    "model.time_steps",
                    label,
                    "未定义该时间步",
                ));
            }
        }
        for label in &m.initialisation_phases {
            if !self.initialisation_phases.iter().any(|p| p.label() == label) {
                return Err(ConfigError::invalid(
                    "model.initialisation_phases",
                    label,
                    "未定义该初始化阶段",
                ));
            }
        }
        for time_step in &self.time_steps {
            for process in &time_step.processes {
                if !self.processes.iter().any(|p| p.label() == process) {
                    return Err(ConfigError::invalid(
                        format!("time_steps.{}.processes", time_step.label),
                        process,
                        "未定义该过程",
                    ));
                }
            }
        }
        Ok(())
    }
}

fn check_unique<'a>(
    section: &str,
    labels: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for label in labels {
        if label.trim().is_empty() {
            return Err(ConfigError::invalid(section, "''", "标签不能为空"));
        }
        if !seen.insert(label) {
            return Err(ConfigError::Duplicate(format!("{section}.{label}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
model:
  start_year: 1990
  final_year: 1992
  min_age: 1
  max_age: 10
  time_steps: [step_one]
categories:
  format: maturity.sex
  names: [immature.male, immature.female]
processes:
  - type: recruitment_constant
    label: recruitment
    categories: [immature.male, immature.female]
    proportions: [0.6, 0.4]
    age: 1
    r0: 100000
  - type: ageing
    label: ageing
    categories: [immature.male, immature.female]
time_steps:
  - label: step_one
    processes: [recruitment, ageing]
"#;

    #[test]
    fn test_parse_minimal_yaml() {
        let config = ModelConfig::from_yaml(MINIMAL).unwrap();
        assert!(config.model.age_plus);
        assert_eq!(config.model.age_spread(), 10);
        assert_eq!(config.model.years(), vec![1990, 1991, 1992]);
        assert_eq!(config.processes.len(), 2);
        assert_eq!(config.processes[0].type_name(), "recruitment_constant");
        config.validate().unwrap();
    }

    #[test]
    fn test_json_roundtrip_keeps_labels() {
        let config = ModelConfig::from_yaml(MINIMAL).unwrap();
        let json = config.to_json().unwrap();
        let back = ModelConfig::from_json(&json).unwrap();
        assert_eq!(back.time_steps[0].processes, vec!["recruitment", "ageing"]);
    }

    #[test]
    fn test_validate_rejects_unknown_time_step_process() {
        let mut config = ModelConfig::from_yaml(MINIMAL).unwrap();
        config.time_steps[0].processes.push("mortality".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_category() {
        let mut config = ModelConfig::from_yaml(MINIMAL).unwrap();
        config.categories.names.push("immature.male".into());
        assert!(matches!(config.validate(), Err(ConfigError::Duplicate(_))));
    }

    #[test]
    fn test_validate_rejects_reversed_years() {
        let mut config = ModelConfig::from_yaml(MINIMAL).unwrap();
        config.model.final_year = 1980;
        assert!(config.validate().is_err());
    }
}
