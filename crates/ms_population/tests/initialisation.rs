//! 初始化阶段集成测试
//!
//! 恒定补充与死亡下，分区的平衡状态有解析解：
//! 年龄 k（k < 最大年龄）为 `R·e^{-kM}`，累积组为 `R·e^{-AM} / (1 - e^{-M})`。

mod common;

use common::{assert_close, data, equilibrium, run_model, two_sex_model, STANDARD_PROCESSES};
use ms_population::initialisation::Iterative;
use ms_population::processes::RecruitmentBevertonHolt;

const M: f64 = 0.065;

fn phase_model(definition: &str) -> String {
    two_sex_model((1990, 2004), "burn_in", STANDARD_PROCESSES, "ageing, recruitment, mortality")
        + &format!("initialisation_phases:\n  - {definition}\n")
}

fn assert_equilibrium(model: &ms_population::Model<f64>, rel: f64) {
    for (name, recruits) in [("immature.male", 60000.0), ("immature.female", 40000.0)] {
        let values = data(model, name);
        for age in 1..=20u32 {
            assert_close(values[(age - 1) as usize], equilibrium(recruits, M, age, 20), rel);
        }
    }
}

// =============================================================================
// Iterative
// =============================================================================

#[test]
fn test_iterative_reaches_equilibrium() {
    let model = run_model(&phase_model("{type: iterative, label: burn_in, years: 400}"));
    assert_equilibrium(&model, 1e-9);
}

#[test]
fn test_iterative_convergence_stops_early() {
    let model = run_model(&phase_model(
        "{type: iterative, label: burn_in, years: 400, convergence_years: [50, 300], lambda: 1.0e-6}",
    ));
    let phase = model
        .initialisation_phases()
        .downcast_ref::<Iterative>("burn_in")
        .expect("阶段类型不符");
    assert_eq!(phase.converged_at(), Some(300));
}

#[test]
fn test_iterative_exclude_process() {
    let model = run_model(
        &phase_model("{type: iterative, label: burn_in, years: 50, exclude_processes: [mortality]}")
            .replace("1990\n  final_year: 2004", "1990\n  final_year: 1990"),
    );
    // 初始化期间无死亡：年龄 1-19 各 R，累积组 R·31
    let male = data(&model, "immature.male");
    let survival = (-M).exp();
    assert_close(male[0], 60000.0 * survival, 1e-12);
    assert_close(male[1], 60000.0 * survival, 1e-12);
    assert_close(male[19], 60000.0 * 32.0 * survival, 1e-12);
}

// =============================================================================
// Derived
// =============================================================================

#[test]
fn test_derived_plus_group_approximation() {
    let model = run_model(&phase_model("{type: derived, label: burn_in}"));
    assert_equilibrium(&model, 1e-9);
}

// =============================================================================
// Cinitial / StateInjection
// =============================================================================

fn idle_model(phases: &[&str], definitions: &str) -> String {
    let processes = r#"
processes:
  - type: recruitment_constant
    label: recruitment
    categories: [immature.male, immature.female]
    proportions: [0.6, 0.4]
    age: 1
    r0: 100000
  - type: nop
    label: idle
"#;
    two_sex_model((2000, 2001), &phases.join(", "), processes, "idle")
        + &format!("initialisation_phases:\n{definitions}")
}

#[test]
fn test_cinitial_scales_combined_group() {
    let thousands = vec!["1000"; 20].join(", ");
    let definitions = format!(
        "  - {{type: iterative, label: seed, years: 1, insert_processes: [step_one=recruitment]}}\n  \
         - {{type: cinitial, label: scale, table: [{{category: immature.male+immature.female, values: [{thousands}]}}]}}\n"
    );
    let model = run_model(&idle_model(&["seed", "scale"], &definitions));

    let male = data(&model, "immature.male");
    let female = data(&model, "immature.female");
    assert_close(male[0], 600.0, 1e-12);
    assert_close(female[0], 400.0, 1e-12);
    // 总量为 0 的年龄保持不变
    assert!(male[1..].iter().all(|&v| v == 0.0));
}

#[test]
fn test_cinitial_wrong_length_rejected() {
    let definitions = "  - {type: cinitial, label: scale, table: [{category: immature.male, values: [1, 2]}]}\n";
    let config = ms_config::ModelConfig::from_yaml(&idle_model(&["scale"], definitions)).unwrap();
    let err = ms_population::Model::<f64>::from_config(&config).err().expect("应当失败");
    assert!(err.is_configuration());
}

#[test]
fn test_state_injection_phase_overwrites() {
    let values: Vec<String> = (1..=20).map(|v| v.to_string()).collect();
    let definitions = format!(
        "  - {{type: state_injection, label: inject, table: [{{category: immature.female, values: [{}]}}]}}\n",
        values.join(", ")
    );
    let model = run_model(&idle_model(&["inject"], &definitions));

    let female = data(&model, "immature.female");
    assert_eq!(female[0], 1.0);
    assert_eq!(female[19], 20.0);
    assert!(data(&model, "immature.male").iter().all(|&v| v == 0.0));
}

// =============================================================================
// Beverton-Holt B0
// =============================================================================

const BEVERTON_HOLT: &str = r#"
model:
  start_year: 1990
  final_year: 1995
  min_age: 1
  max_age: 20
  time_steps: [step_one]
  initialisation_phases: [burn_in]
categories:
  format: stock
  names: [stock]
selectivities:
  - type: constant
    label: one
    c: 1
processes:
  - type: ageing
    label: ageing
    categories: [stock]
  - type: recruitment_beverton_holt
    label: recruitment
    categories: [stock]
    b0: 500000
    ssb: ssb
    ssb_offset: 1
    steepness: 0.75
  - type: mortality_constant_rate
    label: mortality
    categories: [stock]
    m: [0.065]
    selectivities: [one]
time_steps:
  - label: step_one
    processes: [ageing, recruitment, mortality]
initialisation_phases:
  - {type: iterative, label: burn_in, years: 400}
derived_quantities:
  - type: biomass
    label: ssb
    time_step: step_one
    categories: [stock]
    selectivities: [one]
"#;

#[test]
fn test_b0_scales_partition_to_target() {
    let model = run_model(BEVERTON_HOLT);
    let ssb = model.derived_quantity("ssb").unwrap();
    assert_close(ssb.last_value_from_initialisation(0).unwrap(), 500000.0, 1e-6);

    let recruitment = model.process::<RecruitmentBevertonHolt<f64>>("recruitment").unwrap();
    assert!(recruitment.r0() > 1.0);
    // 平衡状态下 SSB 与 B0 相同，补充等于 R0
    let first = recruitment.recruitment_values()[&1990];
    assert_close(first, recruitment.r0(), 1e-6);
}
