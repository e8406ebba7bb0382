// crates/ms_config/src/dyn_model.rs

//! DynModel - 运行时多态模型接口
//!
//! 定义不含泛型的模型接口，应用层通过 `Box<dyn DynModel>` 调用
//! 任意精度的引擎实例。

use ms_foundation::{ErrorKind, MsError};
use serde::Serialize;

use crate::precision::Precision;

/// 模型运行错误（按类别保留引擎错误信息）
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelRunError {
    /// 用户配置错误
    #[error("配置错误: {0}")]
    Configuration(String),

    /// 引擎内部错误
    #[error("内部错误: {0}")]
    Internal(String),

    /// 运行期业务规则违反
    #[error("运行时错误: {0}")]
    Runtime(String),
}

impl From<MsError> for ModelRunError {
    fn from(err: MsError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Configuration => Self::Configuration(message),
            ErrorKind::Internal => Self::Internal(message),
            ErrorKind::Runtime => Self::Runtime(message),
        }
    }
}

/// 一次完整运行的摘要
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// 计算精度
    pub precision: String,
    /// 起止年份
    pub years: (u32, u32),
    /// 各派生量的逐年值
    pub derived_quantities: Vec<DerivedQuantitySeries>,
    /// 期末各类别总数量
    pub partition_totals: Vec<(String, f64)>,
    /// 惩罚总分
    pub penalty_score: f64,
}

/// 派生量逐年序列
#[derive(Debug, Clone, Default, Serialize)]
pub struct DerivedQuantitySeries {
    /// 派生量标签
    pub label: String,
    /// (年份, 值)
    pub values: Vec<(u32, f64)>,
}

/// 运行时模型接口（无泛型）
///
/// # 示例
///
/// ```ignore
/// use ms_config::DynModel;
///
/// fn run_twice(model: &mut dyn DynModel) {
///     model.run().expect("first run");
///     let first = model.summary();
///     model.run().expect("second run");
///     assert_eq!(first.partition_totals, model.summary().partition_totals);
/// }
/// ```
pub trait DynModel: Send {
    /// 重置并完整运行一次（初始化阶段 + 全部模型年份）
    fn run(&mut self) -> Result<(), ModelRunError>;

    /// 重置分区与各过程的运行缓存
    fn reset(&mut self) -> Result<(), ModelRunError>;

    /// 计算精度
    fn precision(&self) -> Precision;

    /// 起止年份
    fn years(&self) -> (u32, u32);

    /// 派生量标签
    fn derived_quantity_labels(&self) -> Vec<String>;

    /// 某派生量的逐年值
    fn derived_quantity_values(&self, label: &str) -> Option<Vec<(u32, f64)>>;

    /// 某类别的当前各年龄数量
    fn category_data(&self, name: &str) -> Option<Vec<f64>>;

    /// 各类别的当前总数量
    fn partition_totals(&self) -> Vec<(String, f64)>;

    /// 惩罚总分
    fn penalty_score(&self) -> f64;

    /// 运行摘要
    fn summary(&self) -> RunSummary {
        let derived_quantities = self
            .derived_quantity_labels()
            .into_iter()
            .map(|label| {
                let values = self.derived_quantity_values(&label).unwrap_or_default();
                DerivedQuantitySeries { label, values }
            })
            .collect();
        RunSummary {
            precision: self.precision().to_string(),
            years: self.years(),
            derived_quantities,
            partition_totals: self.partition_totals(),
            penalty_score: self.penalty_score(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        let err: ModelRunError = MsError::unknown_label("selectivity", "missing").into();
        assert!(matches!(err, ModelRunError::Configuration(_)));
        let err: ModelRunError = MsError::UnknownCategory("ghost".into()).into();
        assert!(matches!(err, ModelRunError::Internal(_)));
        let err: ModelRunError = MsError::runtime("negative").into();
        assert!(matches!(err, ModelRunError::Runtime(_)));
    }

    #[test]
    fn test_summary_default() {
        let summary = RunSummary::default();
        assert!(summary.derived_quantities.is_empty());
        assert_eq!(summary.penalty_score, 0.0);
    }
}
