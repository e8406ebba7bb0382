// crates/ms_population/src/test_support.rs

//! 单元测试共用的小型模型构件

use ms_config::CategoriesConfig;

use crate::category::CategoryDefinitions;
use crate::model::{ModelInfo, ModelState};
use crate::partition::Partition;

/// 单时间步、无初始化阶段的模型信息
pub(crate) fn test_info(start_year: u32, final_year: u32, min_age: u32, max_age: u32) -> ModelInfo {
    ModelInfo {
        start_year,
        final_year,
        min_age,
        max_age,
        age_plus: true,
        state: ModelState::Execute,
        current_year: start_year,
        current_time_step: 0,
        current_initialisation_phase: 0,
        time_step_labels: vec!["step_one".into()],
        initialisation_phase_labels: Vec::new(),
    }
}

/// `immature.male` 与 `immature.female` 两个类别，1990-1992，年龄 1-10
pub(crate) fn test_definitions() -> CategoryDefinitions {
    let config = CategoriesConfig {
        format: "maturity.sex".into(),
        names: vec!["immature.male".into(), "immature.female".into()],
        years: Vec::new(),
        age_lengths: Vec::new(),
    };
    CategoryDefinitions::from_config(&config, &test_info(1990, 1992, 1, 10))
        .expect("test definitions")
}

/// 由 [`test_definitions`] 构建的全零分区
pub(crate) fn test_partition() -> Partition<f64> {
    Partition::build(&test_definitions()).expect("test partition")
}
