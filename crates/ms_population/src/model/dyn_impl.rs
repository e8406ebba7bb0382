// crates/ms_population/src/model/dyn_impl.rs

//! `DynModel` 实现与按精度分发的构造入口

use ms_config::{DynModel, ModelConfig, ModelRunError, Precision};
use ms_foundation::MsResult;
use ms_runtime::RuntimeScalar;

use super::Model;

impl<S: RuntimeScalar> DynModel for Model<S> {
    fn run(&mut self) -> Result<(), ModelRunError> {
        if !self.is_built() {
            self.build()?;
        }
        self.full_iteration()?;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), ModelRunError> {
        Model::reset(self);
        Ok(())
    }

    fn precision(&self) -> Precision {
        Model::precision(self)
    }

    fn years(&self) -> (u32, u32) {
        (self.info().start_year, self.info().final_year)
    }

    fn derived_quantity_labels(&self) -> Vec<String> {
        self.derived_quantities()
            .labels()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn derived_quantity_values(&self, label: &str) -> Option<Vec<(u32, f64)>> {
        let dq = self.derived_quantity(label)?;
        Some(dq.values().iter().map(|(&y, v)| (y, v.to_report())).collect())
    }

    fn category_data(&self, name: &str) -> Option<Vec<f64>> {
        let category = self.partition().category(name).ok()?;
        Some(category.data().iter().map(|v| v.to_report()).collect())
    }

    fn partition_totals(&self) -> Vec<(String, f64)> {
        self.partition()
            .iter()
            .map(|c| (c.name().to_string(), c.total().to_report()))
            .collect()
    }

    fn penalty_score(&self) -> f64 {
        self.penalties().total_score().to_report()
    }
}

/// 按配置的精度创建并构建模型
pub fn build_dyn_model(config: &ModelConfig) -> MsResult<Box<dyn DynModel>> {
    match config.model.precision {
        Precision::F32 => {
            let mut model = Model::<f32>::from_config(config)?;
            model.build()?;
            Ok(Box::new(model))
        }
        Precision::F64 => {
            let mut model = Model::<f64>::from_config(config)?;
            model.build()?;
            Ok(Box::new(model))
        }
    }
}
