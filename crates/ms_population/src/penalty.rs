// crates/ms_population/src/penalty.rs

//! 惩罚项
//!
//! 过程在违反约束时（例如捕捞开发率超过上限）触发惩罚，
//! 惩罚分数进入目标函数；记录在每次重置时清空。

use std::collections::HashMap;

use ms_config::PenaltyConfig;
use ms_foundation::{MsError, MsResult};
use ms_runtime::{zero_fun, RuntimeScalar};
use tracing::warn;

/// 惩罚接口
pub trait Penalty<S: RuntimeScalar>: Send + Sync {
    /// 标签
    fn label(&self) -> &str;

    /// 目标值与实际值的惩罚分数
    fn score(&self, target: S, achieved: S) -> S;
}

/// 过程惩罚：`(target - achieved)^2 · multiplier`
#[derive(Debug, Clone)]
pub struct ProcessPenalty {
    label: String,
    multiplier: f64,
    log_scale: bool,
}

impl ProcessPenalty {
    /// 从配置创建
    pub fn from_config(config: &PenaltyConfig) -> MsResult<Self> {
        if config.multiplier < 0.0 {
            return Err(MsError::invalid_config(
                format!("{}.multiplier", config.label),
                config.multiplier,
                "不能为负",
            ));
        }
        Ok(Self {
            label: config.label.clone(),
            multiplier: config.multiplier,
            log_scale: config.log_scale,
        })
    }
}

impl<S: RuntimeScalar> Penalty<S> for ProcessPenalty {
    fn label(&self) -> &str {
        &self.label
    }

    fn score(&self, target: S, achieved: S) -> S {
        let diff = if self.log_scale {
            zero_fun(target).ln() - zero_fun(achieved).ln()
        } else {
            target - achieved
        };
        diff * diff * S::from_config(self.multiplier)
    }
}

/// 一次惩罚触发记录
#[derive(Debug, Clone, PartialEq)]
pub struct PenaltyInfo<S: RuntimeScalar> {
    /// 惩罚标签
    pub label: String,
    /// 触发年份
    pub year: u32,
    /// 分数
    pub score: S,
}

/// 惩罚管理器
pub struct PenaltyManager<S: RuntimeScalar> {
    penalties: Vec<Box<dyn Penalty<S>>>,
    index: HashMap<String, usize>,
    triggered: Vec<PenaltyInfo<S>>,
}

impl<S: RuntimeScalar> Default for PenaltyManager<S> {
    fn default() -> Self {
        Self {
            penalties: Vec::new(),
            index: HashMap::new(),
            triggered: Vec::new(),
        }
    }
}

impl<S: RuntimeScalar> PenaltyManager<S> {
    /// 按配置构建
    pub fn from_configs(configs: &[PenaltyConfig]) -> MsResult<Self> {
        let mut manager = Self::default();
        for config in configs {
            manager.register(Box::new(ProcessPenalty::from_config(config)?))?;
        }
        Ok(manager)
    }

    /// 注册
    pub fn register(&mut self, penalty: Box<dyn Penalty<S>>) -> MsResult<()> {
        let label = penalty.label().to_string();
        if self.index.contains_key(&label) {
            return Err(MsError::duplicate("penalty", label));
        }
        self.index.insert(label, self.penalties.len());
        self.penalties.push(penalty);
        Ok(())
    }

    /// 标签是否存在
    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// 构建期检查标签
    pub fn check_label(&self, label: &str) -> MsResult<()> {
        if self.contains(label) {
            Ok(())
        } else {
            Err(MsError::unknown_label("penalty", label))
        }
    }

    /// 触发惩罚
    pub fn trigger(&mut self, label: &str, target: S, achieved: S, year: u32) -> MsResult<()> {
        let &i = self
            .index
            .get(label)
            .ok_or_else(|| MsError::unknown_label("penalty", label))?;
        let score = self.penalties[i].score(target, achieved);
        warn!(
            "惩罚 '{}' 在 {} 年触发: target={:.6}, achieved={:.6}",
            label,
            year,
            target.to_report(),
            achieved.to_report()
        );
        self.triggered.push(PenaltyInfo {
            label: label.to_string(),
            year,
            score,
        });
        Ok(())
    }

    /// 已触发的惩罚
    pub fn triggered(&self) -> &[PenaltyInfo<S>] {
        &self.triggered
    }

    /// 总分
    pub fn total_score(&self) -> S {
        self.triggered.iter().map(|p| p.score).sum()
    }

    /// 清空触发记录
    pub fn clear(&mut self) {
        self.triggered.clear();
    }
}
