// crates/ms_population/src/age_length/mod.rs

//! 年龄-体长（生长）模型
//!
//! 为类别提供各 (年份, 时间步, 年龄) 的平均体长与平均体重，
//! 结果缓存在 [`Category`](crate::category::Category) 中。

use std::collections::HashMap;

use ms_config::AgeLengthConfig;
use ms_foundation::{MsError, MsResult};
use ms_runtime::RuntimeScalar;

use crate::model::ModelInfo;

/// 年龄-体长模型接口
pub trait AgeLength<S: RuntimeScalar>: Send + Sync {
    /// 标签
    fn label(&self) -> &str;

    /// 平均体长
    fn mean_length(&self, year: u32, time_step: usize, age: u32) -> S;

    /// 平均体重
    fn mean_weight(&self, year: u32, time_step: usize, age: u32) -> S;
}

/// von Bertalanffy 生长 + `a·L^b` 体长-体重关系
#[derive(Debug, Clone)]
pub struct VonBertalanffy<S: RuntimeScalar> {
    label: String,
    linf: S,
    k: S,
    t0: S,
    a: S,
    b: S,
    time_step_proportions: Vec<S>,
}

impl<S: RuntimeScalar> VonBertalanffy<S> {
    /// 创建并验证
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        label: &str,
        linf: f64,
        k: f64,
        t0: f64,
        a: f64,
        b: f64,
        time_step_proportions: &[f64],
        info: &ModelInfo,
    ) -> MsResult<Self> {
        if linf <= 0.0 {
            return Err(MsError::invalid_config(format!("{label}.linf"), linf, "必须大于 0"));
        }
        if k <= 0.0 {
            return Err(MsError::invalid_config(format!("{label}.k"), k, "必须大于 0"));
        }
        let proportions = if time_step_proportions.is_empty() {
            vec![0.0; info.time_step_count().max(1)]
        } else {
            MsError::check_size(
                &format!("{label}.time_step_proportions"),
                info.time_step_count(),
                time_step_proportions.len(),
            )?;
            for &p in time_step_proportions {
                MsError::check_range(&format!("{label}.time_step_proportions"), p, 0.0, 1.0)?;
            }
            time_step_proportions.to_vec()
        };
        Ok(Self {
            label: label.to_string(),
            linf: S::from_config(linf),
            k: S::from_config(k),
            t0: S::from_config(t0),
            a: S::from_config(a),
            b: S::from_config(b),
            time_step_proportions: proportions.into_iter().map(S::from_config).collect(),
        })
    }
}

impl<S: RuntimeScalar> AgeLength<S> for VonBertalanffy<S> {
    fn label(&self) -> &str {
        &self.label
    }

    fn mean_length(&self, _year: u32, time_step: usize, age: u32) -> S {
        let p = self
            .time_step_proportions
            .get(time_step)
            .copied()
            .unwrap_or(S::ZERO);
        let age = S::from_count(age) + p;
        let length = self.linf * (S::ONE - (-self.k * (age - self.t0)).exp());
        length.max(S::ZERO)
    }

    fn mean_weight(&self, year: u32, time_step: usize, age: u32) -> S {
        self.a * self.mean_length(year, time_step, age).powf(self.b)
    }
}

/// 年龄-体长模型注册表
pub struct AgeLengthRegistry<S: RuntimeScalar> {
    items: HashMap<String, Box<dyn AgeLength<S>>>,
}

impl<S: RuntimeScalar> Default for AgeLengthRegistry<S> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
        }
    }
}

impl<S: RuntimeScalar> AgeLengthRegistry<S> {
    /// 按配置构建
    pub fn from_configs(configs: &[AgeLengthConfig], info: &ModelInfo) -> MsResult<Self> {
        let mut items: HashMap<String, Box<dyn AgeLength<S>>> = HashMap::new();
        for config in configs {
            let model: Box<dyn AgeLength<S>> = match config {
                AgeLengthConfig::VonBertalanffy {
                    label,
                    linf,
                    k,
                    t0,
                    a,
                    b,
                    time_step_proportions,
                } => Box::new(VonBertalanffy::new(
                    label,
                    *linf,
                    *k,
                    *t0,
                    *a,
                    *b,
                    time_step_proportions,
                    info,
                )?),
            };
            if items.insert(config.label().to_string(), model).is_some() {
                return Err(MsError::duplicate("age_length", config.label()));
            }
        }
        Ok(Self { items })
    }

    /// 标签解析
    pub fn resolve(&self, label: &str) -> MsResult<&dyn AgeLength<S>> {
        self.items
            .get(label)
            .map(|m| m.as_ref())
            .ok_or_else(|| MsError::unknown_label("age_length", label))
    }

    /// 数量
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_info;

    #[test]
    fn test_von_bertalanffy() {
        let info = test_info(1990, 1992, 1, 10);
        let vb = VonBertalanffy::<f64>::new("growth", 100.0, 0.2, 0.0, 1e-5, 3.0, &[], &info).unwrap();
        let expected = 100.0 * (1.0 - (-0.2f64 * 5.0).exp());
        assert!((vb.mean_length(1990, 0, 5) - expected).abs() < 1e-12);
        let weight = 1e-5 * expected.powf(3.0);
        assert!((vb.mean_weight(1990, 0, 5) - weight).abs() < 1e-12);
    }

    #[test]
    fn test_length_floored_at_zero() {
        let info = test_info(1990, 1992, 1, 10);
        let vb = VonBertalanffy::<f64>::new("growth", 100.0, 0.2, 3.0, 1.0, 3.0, &[], &info).unwrap();
        assert_eq!(vb.mean_length(1990, 0, 1), 0.0);
    }

    #[test]
    fn test_proportions_validated() {
        let info = test_info(1990, 1992, 1, 10);
        assert!(VonBertalanffy::<f64>::new("g", 100.0, 0.2, 0.0, 1.0, 3.0, &[0.5, 0.5], &info).is_err());
        assert!(VonBertalanffy::<f64>::new("g", 100.0, 0.2, 0.0, 1.0, 3.0, &[1.5], &info).is_err());
    }
}
