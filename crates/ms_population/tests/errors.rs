//! 错误分类测试：配置错误、生命周期（内部）错误与运行期错误

mod common;

use common::build_model;
use ms_config::{DynModel, ModelConfig, ModelRunError};
use ms_foundation::{ErrorKind, MsError};
use ms_population::{build_dyn_model, Model};

fn yaml(processes: &str, time_step: &str) -> String {
    format!(
        r#"
model:
  start_year: 2000
  final_year: 2001
  min_age: 1
  max_age: 3
  time_steps: [step_one]
categories:
  format: stage
  names: [stock, mature]
selectivities:
  - type: constant
    label: one
    c: 1
  - type: constant
    label: double
    c: 2
processes:
  - type: recruitment_constant
    label: recruitment
    categories: [stock]
    age: 1
    r0: 1000
{processes}
time_steps:
  - label: step_one
    processes: [{time_step}]
"#
    )
}

fn create(yaml: &str) -> Result<Model<f64>, MsError> {
    let config = ModelConfig::from_yaml(yaml).expect("配置解析失败");
    Model::<f64>::from_config(&config).and_then(|mut model| model.build().map(|_| model))
}

fn create_err(yaml: &str) -> MsError {
    create(yaml).err().expect("应当失败")
}

#[test]
fn test_unknown_category_is_configuration() {
    let processes = "  - {type: ageing, label: ageing, categories: [juvenile]}";
    let err = create_err(&yaml(processes, "recruitment, ageing"));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_unknown_selectivity_is_configuration() {
    let processes = "  - {type: mortality_constant_rate, label: mortality, categories: [stock], m: [0.1], selectivities: [missing]}";
    let err = create_err(&yaml(processes, "recruitment, mortality"));
    assert!(err.is_configuration());
}

#[test]
fn test_out_of_range_rate_is_configuration() {
    let processes = "  - {type: mortality_constant_rate, label: mortality, categories: [stock], m: [1.5], selectivities: [one]}";
    let err = create_err(&yaml(processes, "recruitment, mortality"));
    assert!(err.is_configuration());
}

#[test]
fn test_split_mortality_block_rejected() {
    let processes = r#"
  - {type: mortality_constant_rate, label: natural, categories: [stock], m: [0.1], selectivities: [one]}
  - {type: mortality_constant_rate, label: extra, categories: [stock], m: [0.1], selectivities: [one]}
"#;
    let err = create_err(&yaml(processes, "natural, recruitment, extra"));
    assert!(err.is_configuration());

    // 相邻的死亡过程组成同一个块
    assert!(create(&yaml(processes, "recruitment, natural, extra")).is_ok());
}

#[test]
fn test_iterate_before_build_is_internal() {
    let config = ModelConfig::from_yaml(&yaml("", "recruitment")).unwrap();
    let mut model = Model::<f64>::from_config(&config).unwrap();
    let err = model.iterate().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
}

#[test]
fn test_negative_partition_is_runtime() {
    let processes = "  - {type: transition_category, label: transition, from: [stock], to: [mature], proportions: [0.75], selectivities: [double]}";
    let mut model = build_model(&yaml(processes, "recruitment, transition"));
    let err = model.iterate().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Runtime);
    assert!(matches!(err, MsError::NegativePartition { .. }));
}

#[test]
fn test_dyn_model_maps_error_kinds() {
    let processes = "  - {type: transition_category, label: transition, from: [stock], to: [mature], proportions: [0.75], selectivities: [double]}";
    let config = ModelConfig::from_yaml(&yaml(processes, "recruitment, transition")).unwrap();
    let mut model = build_dyn_model(&config).unwrap();
    assert!(matches!(model.run(), Err(ModelRunError::Runtime(_))));

    let mut config = ModelConfig::from_yaml(&yaml("", "recruitment")).unwrap();
    config.model.final_year = 1999;
    let err = build_dyn_model(&config).err().expect("应当失败");
    assert!(matches!(ModelRunError::from(err), ModelRunError::Configuration(_)));
}
