//! 年循环端到端测试
//!
//! 从零分区开始运行整年循环，检验补充、年龄增长与恒定死亡后的精确数值。

mod common;

use common::{assert_close, data, run_model, two_sex_model, STANDARD_PROCESSES};
use ms_config::{DynModel, ModelConfig, Precision};
use ms_population::build_dyn_model;

// =============================================================================
// 补充 + 年龄增长
// =============================================================================

const RECRUITMENT_AGEING: &str = r#"
model:
  start_year: 1994
  final_year: 1994
  min_age: 1
  max_age: 10
  time_steps: [step_one]
categories:
  format: maturity.sex
  names: [immature.male, immature.female]
processes:
  - type: recruitment_constant
    label: recruitment
    categories: [immature.male, immature.female]
    proportions: [0.6, 0.4]
    age: 1
    r0: 100000
  - type: ageing
    label: ageing
    categories: [immature.male, immature.female]
time_steps:
  - label: step_one
    processes: [ageing, recruitment]
"#;

#[test]
fn test_recruitment_then_ageing_single_year() {
    let model = run_model(RECRUITMENT_AGEING);

    let male = data(&model, "immature.male");
    let female = data(&model, "immature.female");
    assert_eq!(male[0], 60000.0);
    assert_eq!(female[0], 40000.0);
    assert!(male[1..].iter().all(|&v| v == 0.0));
    assert!(female[1..].iter().all(|&v| v == 0.0));
}

#[test]
fn test_recruitment_before_ageing_moves_recruits() {
    let yaml = RECRUITMENT_AGEING.replace("[ageing, recruitment]", "[recruitment, ageing]");
    let model = run_model(&yaml);

    let male = data(&model, "immature.male");
    assert_eq!(male[0], 0.0);
    assert_eq!(male[1], 60000.0);
}

// =============================================================================
// 恒定死亡
// =============================================================================

#[test]
fn test_constant_mortality_multi_year() {
    let yaml = two_sex_model((1990, 2004), "", STANDARD_PROCESSES, "ageing, recruitment, mortality");
    let model = run_model(&yaml);
    let survival = (-0.065f64).exp();

    let male = data(&model, "immature.male");
    let female = data(&model, "immature.female");
    assert_close(male[0], 60000.0 * survival, 1e-12);
    assert_close(female[0], 40000.0 * survival, 1e-12);

    // 15 个模型年份只填满前 15 个年龄
    for age in 1..=15usize {
        assert_close(male[age - 1], 60000.0 * survival.powi(age as i32), 1e-10);
    }
    assert!(male[15..].iter().all(|&v| v == 0.0));
}

#[test]
fn test_mortality_removals_recorded() {
    use ms_population::processes::MortalityConstantRate;

    let yaml = two_sex_model((1990, 1991), "", STANDARD_PROCESSES, "ageing, recruitment, mortality");
    let model = run_model(&yaml);
    let process = model
        .process::<MortalityConstantRate<f64>>("mortality")
        .expect("过程类型不符");

    let removed_1990 = process.removals()[&1990];
    assert_close(removed_1990, 100000.0 * (1.0 - (-0.065f64).exp()), 1e-10);
    assert!(process.removals()[&1991] > removed_1990);
}

// =============================================================================
// 年龄增长守恒
// =============================================================================

fn ageing_model(age_plus: bool) -> String {
    let values: Vec<String> = (1..=20).map(|v| v.to_string()).collect();
    let processes = format!(
        r#"
processes:
  - type: state_injection
    label: injection
    category: immature.male
    values: [{}]
  - type: ageing
    label: ageing
    categories: [immature.male, immature.female]
"#,
        values.join(", ")
    );
    two_sex_model((2000, 2000), "", &processes, "injection, ageing")
        .replace("age_plus: true", &format!("age_plus: {age_plus}"))
}

#[test]
fn test_ageing_conserves_with_plus_group() {
    let model = run_model(&ageing_model(true));
    let male = data(&model, "immature.male");

    assert_eq!(male[0], 0.0);
    assert_eq!(male[1], 1.0);
    assert_eq!(male[18], 19.0);
    assert_eq!(male[19], 39.0);
    assert_eq!(male.iter().sum::<f64>(), 210.0);
    assert!(data(&model, "immature.female").iter().all(|&v| v == 0.0));
}

#[test]
fn test_ageing_drops_oldest_without_plus_group() {
    let model = run_model(&ageing_model(false));
    let male = data(&model, "immature.male");

    assert_eq!(male[19], 19.0);
    assert_eq!(male.iter().sum::<f64>(), 190.0);
}

// =============================================================================
// 类别有效年份
// =============================================================================

const TAGGED: &str = r#"
model:
  start_year: 1990
  final_year: 1996
  min_age: 1
  max_age: 5
  time_steps: [step_one]
categories:
  format: tag.sex
  names: [untagged.male, tagged.male]
  years: ["tagged.male=1995,1996"]
selectivities:
  - type: constant
    label: one
    c: 1
processes:
  - type: recruitment_constant
    label: recruitment
    categories: [untagged.male, tagged.male]
    proportions: [0.5, 0.5]
    age: 1
    r0: 1000
derived_quantities:
  - type: abundance
    label: abundance
    time_step: step_one
    categories: [untagged.male, tagged.male]
    selectivities: [one]
time_steps:
  - label: step_one
    processes: [recruitment]
"#;

#[test]
fn test_invalid_categories_skipped_by_year() {
    let model = run_model(TAGGED);

    // 1990-1994 全部进入 untagged，1995-1996 两类别各半
    assert_eq!(data(&model, "untagged.male")[0], 6000.0);
    assert_eq!(data(&model, "tagged.male")[0], 1000.0);

    let abundance = model.derived_quantity("abundance").expect("派生量不存在");
    assert_eq!(abundance.value(1994), Some(5000.0));
    assert_eq!(abundance.value(1995), Some(6000.0));
    assert_eq!(abundance.value(1996), Some(7000.0));
}

// =============================================================================
// Beverton-Holt 主循环：SSB 偏移与偏差校正斜坡
// =============================================================================

const BEVERTON_HOLT_MAIN: &str = r#"
model:
  start_year: 2000
  final_year: 2004
  min_age: 1
  max_age: 3
  age_plus: true
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
    r0: 1000
    ssb: ssb
    ssb_offset: 1
    steepness: 0.75
    sigma_r: 0.6
    b_max: 0.8
    last_year_with_no_bias: 2000
    first_year_with_bias: 2002
    last_year_with_bias: 2002
    first_recent_year_with_no_bias: 2004
    deviation_values: [0.0, 0.2, -0.1, 0.3, 0.0]
  - type: mortality_constant_rate
    label: mortality
    categories: [stock]
    m: [0.1]
    selectivities: [one]
time_steps:
  - label: step_one
    processes: [ageing, recruitment, mortality]
initialisation_phases:
  - {type: iterative, label: burn_in, years: 300}
derived_quantities:
  - type: biomass
    label: ssb
    time_step: step_one
    categories: [stock]
    selectivities: [one]
"#;

#[test]
fn test_beverton_holt_uses_offset_ssb_and_bias_ramp() {
    use ms_population::processes::RecruitmentBevertonHolt;

    let model = run_model(BEVERTON_HOLT_MAIN);
    let recruitment = model.process::<RecruitmentBevertonHolt<f64>>("recruitment").unwrap();
    let ssb = model.derived_quantity("ssb").unwrap();
    assert_eq!(recruitment.ssb_offset(), 1);

    // b1=2000, b2=b3=2002, b4=2004, b_max=0.8
    let bias = recruitment.bias_adjustments();
    let expected_bias = [0.0, 0.4, 0.8, 0.4, 0.0];
    for (actual, expected) in bias.iter().zip(expected_bias) {
        assert_close(*actual, expected, 1e-12);
    }

    // ycs = exp(dev - bias·σ²/2), σ² = 0.36
    let ycs = recruitment.ycs_values();
    let expected_ycs = [1.0, 0.128f64.exp(), (-0.244f64).exp(), 0.228f64.exp(), 1.0];
    for (year, expected) in (2000..=2004).zip(expected_ycs) {
        assert_close(ycs[&year], expected, 1e-12);
    }

    // 平衡时块前总量 R/(1-s)，块后 R·s/(1-s)，取中点
    let s = (-0.1f64).exp();
    let b0 = 1000.0 * (1.0 + s) / (2.0 * (1.0 - s));
    assert_close(ssb.last_value_from_initialisation(0).unwrap(), b0, 1e-6);

    // 2000 年向前偏移到初始化阶段，SR(1) = 1
    let ssb_used = recruitment.ssb_values();
    assert_close(ssb_used[&2000], b0, 1e-6);
    for year in 2001..=2004 {
        assert_eq!(ssb_used[&year], ssb.value(year - 1).unwrap(), "year {year}");
    }

    let recruits = recruitment.recruitment_values();
    assert_close(recruits[&2000], 1000.0, 1e-6);
    assert_close(recruits[&2001], 1000.0 * 0.128f64.exp(), 1e-6);

    // 2001 年补充多出 1000·(e^0.128 - 1)，SSB 比值为 1 + (1-s)(e^0.128 - 1)
    let ratio = 1.0 + (1.0 - s) * (0.128f64.exp() - 1.0);
    let sr = ratio / (1.0 - (2.75 / 3.0) * (1.0 - ratio));
    assert_close(ssb.value(2001).unwrap() / b0, ratio, 1e-6);
    assert_close(recruits[&2002], 1000.0 * (-0.244f64).exp() * sr, 1e-6);
    assert_close(recruitment.true_ycs_values()[&2002], (-0.244f64).exp() * sr, 1e-6);

    // 最后一年的补充只经历一次死亡
    assert_close(data(&model, "stock")[0], recruits[&2004] * s, 1e-9);
}

// =============================================================================
// DynModel
// =============================================================================

#[test]
fn test_dyn_model_single_precision() {
    let yaml = two_sex_model((1990, 1994), "", STANDARD_PROCESSES, "ageing, recruitment, mortality")
        .replace("  age_plus: true\n", "  age_plus: true\n  precision: f32\n");
    let config = ModelConfig::from_yaml(&yaml).unwrap();
    let mut model = build_dyn_model(&config).unwrap();
    assert_eq!(model.precision(), Precision::F32);

    model.run().unwrap();
    let male = model.category_data("immature.male").unwrap();
    assert_close(male[0], 60000.0 * (-0.065f64).exp(), 1e-5);
    assert!(model.category_data("mature.male").is_none());
}

#[test]
fn test_dyn_model_repeated_runs_identical() {
    let yaml = two_sex_model((1990, 1999), "", STANDARD_PROCESSES, "ageing, recruitment, mortality");
    let config = ModelConfig::from_yaml(&yaml).unwrap();
    let mut model = build_dyn_model(&config).unwrap();

    model.run().unwrap();
    let first = model.partition_totals();
    model.run().unwrap();
    let second = model.partition_totals();

    assert_eq!(first, second);
    let summary = model.summary();
    assert_eq!(summary.years, (1990, 1999));
    assert_eq!(summary.partition_totals.len(), 2);
    assert_eq!(summary.penalty_score, 0.0);
}
