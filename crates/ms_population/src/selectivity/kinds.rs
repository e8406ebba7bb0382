// crates/ms_population/src/selectivity/kinds.rs

//! 标准选择性形式

use ms_config::SelectivityConfig;
use ms_foundation::{MsError, MsResult};
use ms_runtime::RuntimeScalar;

use super::Selectivity;
use crate::model::ModelInfo;

/// Logistic 形式的截断阈值
const LOGISTIC_CUTOFF: f64 = 5.0;

/// 按年龄预计算的选择性
#[derive(Debug, Clone)]
pub struct AgeTableSelectivity<S: RuntimeScalar> {
    label: String,
    type_name: &'static str,
    min_age: u32,
    values: Vec<S>,
}

impl<S: RuntimeScalar> AgeTableSelectivity<S> {
    /// 对 `min_age..=max_age` 逐年龄求值
    pub fn from_fn(
        label: impl Into<String>,
        type_name: &'static str,
        info: &ModelInfo,
        f: impl Fn(S) -> S,
    ) -> Self {
        let values = (info.min_age..=info.max_age)
            .map(|age| f(S::from_count(age)))
            .collect();
        Self {
            label: label.into(),
            type_name,
            min_age: info.min_age,
            values,
        }
    }
}

impl<S: RuntimeScalar> Selectivity<S> for AgeTableSelectivity<S> {
    fn label(&self) -> &str {
        &self.label
    }

    fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    fn value(&self, age: u32) -> S {
        age.checked_sub(self.min_age)
            .and_then(|i| self.values.get(i as usize).copied())
            .unwrap_or(S::ZERO)
    }
}

/// 按配置创建选择性
pub fn create_selectivity<S: RuntimeScalar>(
    config: &SelectivityConfig,
    info: &ModelInfo,
) -> MsResult<Box<dyn Selectivity<S>>> {
    let selectivity = match config {
        SelectivityConfig::Constant { label, c } => {
            let c = S::from_config(*c);
            AgeTableSelectivity::from_fn(label.as_str(), "constant", info, move |_| c)
        }
        SelectivityConfig::KnifeEdge { label, e, alpha } => {
            let (e, alpha) = (S::from_config(*e), S::from_config(*alpha));
            AgeTableSelectivity::from_fn(label.as_str(), "knife_edge", info, move |age| {
                if age >= e {
                    alpha
                } else {
                    S::ZERO
                }
            })
        }
        SelectivityConfig::Logistic {
            label,
            a50,
            ato95,
            alpha,
        } => {
            if *ato95 <= 0.0 {
                return Err(MsError::invalid_config(
                    format!("{label}.ato95"),
                    ato95,
                    "必须大于 0",
                ));
            }
            let (a50, ato95, alpha) = (S::from_config(*a50), S::from_config(*ato95), S::from_config(*alpha));
            let cutoff = S::from_config(LOGISTIC_CUTOFF);
            let base = S::from_config(19.0);
            AgeTableSelectivity::from_fn(label.as_str(), "logistic", info, move |age| {
                let t = (a50 - age) / ato95;
                if t > cutoff {
                    S::ZERO
                } else if t < -cutoff {
                    alpha
                } else {
                    alpha / (S::ONE + base.powf(t))
                }
            })
        }
        SelectivityConfig::AllValues { label, values } => {
            MsError::check_size(&format!("{label}.values"), info.age_spread(), values.len())?;
            let values: Vec<S> = values.iter().map(|&v| S::from_config(v)).collect();
            AgeTableSelectivity {
                label: label.clone(),
                type_name: "all_values",
                min_age: info.min_age,
                values,
            }
        }
        SelectivityConfig::DoubleNormal {
            label,
            mu,
            sigma_l,
            sigma_r,
            alpha,
        } => {
            if *sigma_l <= 0.0 || *sigma_r <= 0.0 {
                return Err(MsError::invalid_config(
                    format!("{label}.sigma"),
                    format!("({sigma_l}, {sigma_r})"),
                    "左右宽度必须大于 0",
                ));
            }
            let (mu, sl, sr, alpha) = (
                S::from_config(*mu),
                S::from_config(*sigma_l),
                S::from_config(*sigma_r),
                S::from_config(*alpha),
            );
            AgeTableSelectivity::from_fn(label.as_str(), "double_normal", info, move |age: S| {
                let sigma = if age < mu { sl } else { sr };
                let z: S = (age - mu) / sigma;
                alpha * S::TWO.powf(-(z * z))
            })
        }
    };
    Ok(Box::new(selectivity))
}
