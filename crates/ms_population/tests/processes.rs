//! 过程集成测试：渔获截断与惩罚、类别转移、性成熟

mod common;

use common::{assert_close, build_model, data, run_model};
use ms_population::processes::{Maturation, MortalityEventBiomass, MortalityInstantaneous};

fn model(categories: &str, processes: &str, time_step: &str) -> String {
    format!(
        r#"
model:
  start_year: 2000
  final_year: 2000
  min_age: 1
  max_age: 3
  time_steps: [step_one]
categories:
{categories}
selectivities:
  - type: constant
    label: one
    c: 1
penalties:
  - label: catch_penalty
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

const STOCK: &str = "  format: stock\n  names: [stock]";

fn event_model(catch: f64, initialisation_only: bool) -> String {
    let process = format!(
        r#"
  - type: mortality_event_biomass
    label: fishing
    initialisation_only: {initialisation_only}
    categories: [stock]
    selectivities: [one]
    years: [2000]
    catches: [{catch}]
    u_max: 0.5
    penalty: catch_penalty
"#
    );
    model(STOCK, &process, "recruitment, fishing")
}

// =============================================================================
// 按生物量的捕捞事件
// =============================================================================

#[test]
fn test_event_clamps_exploitation_and_triggers_penalty_once() {
    let model = run_model(&event_model(5000.0, false));

    assert_eq!(data(&model, "stock"), vec![500.0, 0.0, 0.0]);
    let process = model.process::<MortalityEventBiomass<f64>>("fishing").unwrap();
    assert_eq!(process.exploitation()[&2000], 0.5);
    assert_eq!(process.actual_catch()[&2000], 500.0);

    let triggered = model.penalties().triggered();
    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].label, "catch_penalty");
    assert_eq!(triggered[0].year, 2000);
    assert_eq!(model.penalties().total_score(), 4500.0 * 4500.0);
}

#[test]
fn test_event_below_limit_removes_catch() {
    let model = run_model(&event_model(200.0, false));

    assert_close(data(&model, "stock")[0], 800.0, 1e-12);
    assert!(model.penalties().triggered().is_empty());
}

#[test]
fn test_initialisation_only_event_skips_main_years() {
    let model = run_model(&event_model(200.0, true));
    assert_eq!(data(&model, "stock")[0], 1000.0);
    let process = model.process::<MortalityEventBiomass<f64>>("fishing").unwrap();
    assert!(process.actual_catch().is_empty());
}

#[test]
fn test_initialisation_only_event_fishes_during_burn_in() {
    let yaml = event_model(200.0, true).replace(
        "  time_steps: [step_one]\n",
        "  time_steps: [step_one]\n  initialisation_phases: [burn_in]\n",
    ) + "initialisation_phases:\n  - {type: iterative, label: burn_in, years: 1}\n";
    let model = run_model(&yaml);

    // 初始化：补充 1000 后捕捞 200；主循环再补充 1000，不捕捞
    assert_close(data(&model, "stock")[0], 1800.0, 1e-12);
    let process = model.process::<MortalityEventBiomass<f64>>("fishing").unwrap();
    assert_close(process.exploitation()[&2000], 0.2, 1e-12);
    assert_close(process.actual_catch()[&2000], 200.0, 1e-12);
}

#[test]
fn test_default_event_skips_burn_in() {
    let yaml = event_model(200.0, false).replace(
        "  time_steps: [step_one]\n",
        "  time_steps: [step_one]\n  initialisation_phases: [burn_in]\n",
    ) + "initialisation_phases:\n  - {type: iterative, label: burn_in, years: 1}\n";
    let model = run_model(&yaml);

    // 初始化留下 1000，主循环补充到 2000 后捕捞 200
    assert_close(data(&model, "stock")[0], 1800.0, 1e-12);
    let process = model.process::<MortalityEventBiomass<f64>>("fishing").unwrap();
    assert_close(process.exploitation()[&2000], 0.1, 1e-12);
    assert_close(process.actual_catch()[&2000], 200.0, 1e-12);
}

#[test]
fn test_unknown_penalty_rejected_at_build() {
    let yaml = event_model(200.0, false).replace("penalty: catch_penalty", "penalty: missing");
    let config = ms_config::ModelConfig::from_yaml(&yaml).unwrap();
    let mut model = ms_population::Model::<f64>::from_config(&config).unwrap();
    assert!(model.build().unwrap_err().is_configuration());
}

// =============================================================================
// 瞬时死亡
// =============================================================================

#[test]
fn test_instantaneous_fishery_scaled_to_u_max() {
    let process = r#"
  - type: mortality_instantaneous
    label: instant
    categories: [stock]
    m: [0.0]
    selectivities: [one]
    fisheries:
      - label: trawl
        time_step: step_one
        years: [2000]
        catches: [2000]
        u_max: 0.5
        penalty: catch_penalty
        selectivities: [one]
"#;
    let model = run_model(&model(STOCK, process, "recruitment, instant"));

    assert_eq!(data(&model, "stock")[0], 500.0);
    let instant = model.process::<MortalityInstantaneous<f64>>("instant").unwrap();
    assert_eq!(instant.fishery_labels(), vec!["trawl"]);
    assert_eq!(instant.exploitation("trawl", 2000), Some(0.5));
    assert_eq!(instant.actual_catch("trawl", 2000), Some(500.0));
    assert_eq!(instant.catch_at_age("trawl", "stock", 2000), Some(&[500.0, 0.0, 0.0][..]));

    let triggered = model.penalties().triggered();
    assert_eq!(triggered.len(), 1);
    assert_eq!(model.penalties().total_score(), 1500.0 * 1500.0);
}

#[test]
fn test_instantaneous_natural_mortality_only() {
    let process = r#"
  - type: mortality_instantaneous
    label: instant
    categories: [stock]
    m: [0.1]
    selectivities: [one]
"#;
    let model = run_model(&model(STOCK, process, "recruitment, instant"));
    assert_close(data(&model, "stock")[0], 1000.0 * (-0.1f64).exp(), 1e-12);
}

// =============================================================================
// 类别转移与性成熟
// =============================================================================

const STAGES: &str = "  format: stage\n  names: [stock, mature]";

#[test]
fn test_transition_moves_proportion() {
    let process = r#"
  - type: transition_category
    label: transition
    from: [stock]
    to: [mature]
    proportions: [0.5]
    selectivities: [one]
"#;
    let model = run_model(&model(STAGES, process, "recruitment, transition"));

    assert_eq!(data(&model, "stock"), vec![500.0, 0.0, 0.0]);
    assert_eq!(data(&model, "mature"), vec![500.0, 0.0, 0.0]);
    assert_eq!(model.partition().total(), 1000.0);
}

#[test]
fn test_maturation_records_matured_total() {
    let process = r#"
  - type: maturation
    label: maturation
    from: [stock]
    to: [mature]
    years: [2000]
    rates: [0.25]
    selectivities: [one]
"#;
    let model = run_model(&model(STAGES, process, "recruitment, maturation"));

    assert_eq!(data(&model, "stock")[0], 750.0);
    assert_eq!(data(&model, "mature")[0], 250.0);
    let maturation = model.process::<Maturation<f64>>("maturation").unwrap();
    assert_eq!(maturation.matured()[&2000], 250.0);
}

#[test]
fn test_transition_to_same_category_rejected() {
    let process = r#"
  - type: transition_category
    label: transition
    from: [stock]
    to: [stock]
    proportions: [0.5]
    selectivities: [one]
"#;
    let config = ms_config::ModelConfig::from_yaml(&model(STAGES, process, "recruitment, transition")).unwrap();
    let built = ms_population::Model::<f64>::from_config(&config).and_then(|mut m| m.build());
    assert!(built.unwrap_err().is_configuration());
}

#[test]
fn test_build_then_reset_clears_partition() {
    let mut model = build_model(&model(STOCK, "", "recruitment"));
    model.iterate().unwrap();
    assert_eq!(data(&model, "stock")[0], 1000.0);
    model.reset();
    assert_eq!(model.partition().total(), 0.0);
}
