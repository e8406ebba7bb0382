//! 派生量插值集成测试
//!
//! 单类别、补充后接恒定死亡：死亡块前的丰度已知，块后的丰度为其乘以 exp(-M)。

mod common;

use common::{assert_close, data, run_model};
use ms_population::DerivedQuantityKind;

fn stock_model(years: (u32, u32), phases: &str) -> String {
    format!(
        r#"
model:
  start_year: {start}
  final_year: {end}
  min_age: 1
  max_age: 5
  time_steps: [step_one]
  initialisation_phases: [{labels}]
categories:
  format: stock
  names: [stock]
selectivities:
  - type: constant
    label: one
    c: 1
processes:
  - type: recruitment_constant
    label: recruitment
    categories: [stock]
    age: 1
    r0: 1000
  - type: mortality_constant_rate
    label: mortality
    categories: [stock]
    m: [0.2]
    selectivities: [one]
time_steps:
  - label: step_one
    processes: [recruitment, mortality]
initialisation_phases: [{definitions}]
derived_quantities:
  - type: abundance
    label: before
    time_step: step_one
    categories: [stock]
    selectivities: [one]
    time_step_proportion: 0.0
  - type: abundance
    label: after
    time_step: step_one
    categories: [stock]
    selectivities: [one]
    time_step_proportion: 1.0
  - type: abundance
    label: mid_sum
    time_step: step_one
    categories: [stock]
    selectivities: [one]
    time_step_proportion: 0.5
    time_step_proportion_method: weighted_sum
  - type: biomass
    label: mid_product
    time_step: step_one
    categories: [stock]
    selectivities: [one]
    time_step_proportion: 0.5
    time_step_proportion_method: weighted_product
"#,
        start = years.0,
        end = years.1,
        labels = if phases.is_empty() { "" } else { "burn_in" },
        definitions = phases,
    )
}

fn value(model: &ms_population::Model<f64>, label: &str, year: u32) -> f64 {
    model
        .derived_quantity(label)
        .and_then(|dq| dq.value(year))
        .expect("派生量没有该年份的值")
}

#[test]
fn test_proportion_boundaries_are_exact() {
    let model = run_model(&stock_model((2000, 2000), ""));
    let stock = data(&model, "stock");

    assert_eq!(value(&model, "before", 2000).to_bits(), 1000.0f64.to_bits());
    assert_eq!(value(&model, "after", 2000).to_bits(), stock[0].to_bits());
}

#[test]
fn test_interior_proportion_uses_configured_method() {
    let model = run_model(&stock_model((2000, 2001), ""));
    let survival = (-0.2f64).exp();

    assert_close(value(&model, "mid_sum", 2000), 1000.0 * (1.0 + survival) / 2.0, 1e-12);
    assert_close(value(&model, "mid_product", 2000), 1000.0 * survival.sqrt(), 1e-12);

    let before = 1000.0 * survival + 1000.0;
    assert_close(value(&model, "before", 2001), before, 1e-12);
    assert_close(value(&model, "after", 2001), before * survival, 1e-12);
    assert_eq!(model.derived_quantity("mid_product").unwrap().kind(), DerivedQuantityKind::Biomass);
}

#[test]
fn test_initialisation_values_recorded_per_phase() {
    let phase = "{type: iterative, label: burn_in, years: 3}";
    let mut model = run_model(&stock_model((2000, 2000), phase));
    let survival = (-0.2f64).exp();
    let expected = [
        1000.0,
        1000.0 * (1.0 + survival),
        1000.0 * (1.0 + survival + survival * survival),
    ];

    let before = model.derived_quantity("before").unwrap();
    let recorded = before.initialisation_values(0);
    assert_eq!(recorded.len(), 3);
    for (&actual, &expected) in recorded.iter().zip(&expected) {
        assert_close(actual, expected, 1e-12);
    }
    assert_close(before.last_value_from_initialisation(0).unwrap(), expected[2], 1e-12);
    // 起始年之前的年份取初始化阶段的最后一个值
    assert_close(before.value(1999).unwrap(), expected[2], 1e-12);

    model.full_iteration().unwrap();
    let before = model.derived_quantity("before").unwrap();
    assert_eq!(before.initialisation_values(0).len(), 3);
    assert_eq!(before.values().len(), 1);
}

#[test]
fn test_unknown_derived_quantity_time_step_rejected() {
    let yaml = stock_model((2000, 2000), "").replace("label: after\n    time_step: step_one", "label: after\n    time_step: step_two");
    let config = ms_config::ModelConfig::from_yaml(&yaml).unwrap();
    let err = ms_population::Model::<f64>::from_config(&config).err().expect("应当失败");
    assert!(err.is_configuration());
}
