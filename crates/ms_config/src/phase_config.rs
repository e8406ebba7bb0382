// crates/ms_config/src/phase_config.rs

//! 初始化阶段配置

use serde::{Deserialize, Serialize};

/// 初始化阶段配置（按 `type` 标记）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InitialisationPhaseConfig {
    /// 重复运行年循环
    Iterative(IterativePhaseConfig),
    /// 年龄跨度年数 + 累积组近似
    Derived(DerivedPhaseConfig),
    /// 按类别-年龄表缩放前一阶段的分区
    Cinitial(CinitialPhaseConfig),
    /// 直接覆盖分区
    StateInjection(StateInjectionPhaseConfig),
}

impl InitialisationPhaseConfig {
    /// 阶段标签
    pub fn label(&self) -> &str {
        match self {
            Self::Iterative(c) => &c.label,
            Self::Derived(c) => &c.label,
            Self::Cinitial(c) => &c.label,
            Self::StateInjection(c) => &c.label,
        }
    }

    /// 类型名
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Iterative(_) => "iterative",
            Self::Derived(_) => "derived",
            Self::Cinitial(_) => "cinitial",
            Self::StateInjection(_) => "state_injection",
        }
    }

    /// 所有受支持的类型名
    pub fn supported_types() -> &'static [&'static str] {
        &["iterative", "derived", "cinitial", "state_injection"]
    }
}

/// 迭代初始化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterativePhaseConfig {
    /// 标签
    pub label: String,
    /// 运行年数
    pub years: u32,
    /// 插入过程：`time_step(process)=new_process` 或 `time_step=new_process`
    #[serde(default)]
    pub insert_processes: Vec<String>,
    /// 排除过程
    #[serde(default)]
    pub exclude_processes: Vec<String>,
    /// 检查收敛的年份
    #[serde(default)]
    pub convergence_years: Vec<u32>,
    /// 收敛阈值
    #[serde(default = "default_lambda")]
    pub lambda: f64,
}

fn default_lambda() -> f64 {
    1e-10
}

/// 派生初始化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedPhaseConfig {
    /// 标签
    pub label: String,
    /// 插入过程
    #[serde(default)]
    pub insert_processes: Vec<String>,
    /// 排除过程
    #[serde(default)]
    pub exclude_processes: Vec<String>,
}

/// 类别-年龄表的一行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRow {
    /// 类别（可以是 `+` 连接的组合类别）
    pub category: String,
    /// 各年龄的值
    pub values: Vec<f64>,
}

/// C-initial 初始化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CinitialPhaseConfig {
    /// 标签
    pub label: String,
    /// 目标数量表
    pub table: Vec<TableRow>,
}

/// 状态注入初始化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateInjectionPhaseConfig {
    /// 标签
    pub label: String,
    /// 注入表（每个类别一行，覆盖完整年龄范围）
    pub table: Vec<TableRow>,
    /// 注入后运行年循环的年数（用于派生量）
    #[serde(default)]
    pub cycle_years: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iterative_defaults() {
        let yaml = r#"
type: iterative
label: phase_one
years: 200
"#;
        let config: InitialisationPhaseConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.label(), "phase_one");
        match config {
            InitialisationPhaseConfig::Iterative(c) => {
                assert_eq!(c.lambda, 1e-10);
                assert!(c.convergence_years.is_empty());
            }
            other => panic!("unexpected variant: {}", other.type_name()),
        }
    }
}
