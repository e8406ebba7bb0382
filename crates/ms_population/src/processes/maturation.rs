// crates/ms_population/src/processes/maturation.rs

//! 性成熟：按年份比例把未成熟类别移到成熟类别

use std::any::Any;
use std::collections::BTreeMap;

use ms_config::MaturationConfig;
use ms_foundation::{MsError, MsResult};
use ms_runtime::RuntimeScalar;

use super::common::year_table;
use super::traits::{BuildContext, Process, ProcessContext, ProcessType};
use super::transition_category::{resolve_pairs, transfer, TransitionPair};
use crate::model::ModelInfo;

/// 性成熟
///
/// 某年的比例取不晚于该年的最后一个给定年份；早于所有给定年份时取第一个比例。
pub struct Maturation<S: RuntimeScalar> {
    label: String,
    config: MaturationConfig,
    from: Vec<String>,
    to: Vec<String>,
    rates: BTreeMap<u32, S>,
    pairs: Vec<TransitionPair>,
    matured: BTreeMap<u32, S>,
}

impl<S: RuntimeScalar> Maturation<S> {
    /// 从配置创建，源/目标标签已展开
    pub fn new(config: &MaturationConfig, from: Vec<String>, to: Vec<String>) -> Self {
        Self {
            label: config.label.clone(),
            config: config.clone(),
            from,
            to,
            rates: BTreeMap::new(),
            pairs: Vec::new(),
            matured: BTreeMap::new(),
        }
    }

    /// 某年使用的成熟比例
    pub fn rate(&self, year: u32) -> S {
        self.rates
            .range(..=year)
            .next_back()
            .or_else(|| self.rates.iter().next())
            .map(|(_, &rate)| rate)
            .unwrap_or(S::ZERO)
    }

    /// 逐年成熟数量
    pub fn matured(&self) -> &BTreeMap<u32, S> {
        &self.matured
    }
}

impl<S: RuntimeScalar> Process<S> for Maturation<S> {
    fn label(&self) -> &str {
        &self.label
    }

    fn type_name(&self) -> &'static str {
        "maturation"
    }

    fn process_type(&self) -> ProcessType {
        ProcessType::Transition
    }

    fn validate(&mut self, _info: &ModelInfo) -> MsResult<()> {
        if self.from.is_empty() {
            return Err(MsError::invalid_config(format!("{}.from", self.label), "[]", "至少需要一个类别"));
        }
        MsError::check_size(&format!("{}.to", self.label), self.from.len(), self.to.len())?;
        if self.config.years.is_empty() {
            return Err(MsError::invalid_config(format!("{}.years", self.label), "[]", "至少需要一个年份"));
        }
        let mut rates = BTreeMap::new();
        for (year, rate) in year_table(&self.label, &self.config.years, &self.config.rates)? {
            MsError::check_range(&format!("{}.rates", self.label), rate, 0.0, 1.0)?;
            rates.insert(year, S::from_config(rate));
        }
        self.rates = rates;
        Ok(())
    }

    fn build(&mut self, ctx: &BuildContext<'_, S>) -> MsResult<()> {
        self.pairs = resolve_pairs(&self.label, &self.from, &self.to, &self.config.selectivities, ctx)?;
        Ok(())
    }

    fn reset(&mut self) {
        self.matured.clear();
    }

    fn execute(&mut self, ctx: &mut ProcessContext<'_, S>) -> MsResult<()> {
        let year = ctx.year();
        let rate = self.rate(year);
        let mut total = S::ZERO;
        for &pair in &self.pairs {
            total += transfer(&self.label, ctx.partition, ctx.selectivities, pair, rate, year)?;
        }
        *self.matured.entry(year).or_insert(S::ZERO) += total;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maturation(years: Vec<u32>, rates: Vec<f64>) -> Maturation<f64> {
        let config = MaturationConfig {
            label: "maturation".into(),
            from: vec!["immature.male".into()],
            to: vec!["mature.male".into()],
            years,
            rates,
            selectivities: vec!["one".into()],
        };
        Maturation::new(&config, config.from.clone(), config.to.clone())
    }

    #[test]
    fn test_rate_uses_last_listed_year() {
        let info = crate::test_support::test_info(1990, 2000, 1, 10);
        let mut process = maturation(vec![1992, 1995], vec![0.1, 0.3]);
        process.validate(&info).unwrap();

        assert_eq!(process.rate(1990), 0.1);
        assert_eq!(process.rate(1993), 0.1);
        assert_eq!(process.rate(1995), 0.3);
        assert_eq!(process.rate(2000), 0.3);
    }

    #[test]
    fn test_rate_out_of_range_rejected() {
        let info = crate::test_support::test_info(1990, 2000, 1, 10);
        let mut process = maturation(vec![1992], vec![1.5]);
        assert!(process.validate(&info).unwrap_err().is_configuration());
    }
}
