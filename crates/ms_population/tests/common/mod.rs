//! 集成测试公用工具

#![allow(dead_code)]

use ms_config::ModelConfig;
use ms_population::Model;

/// 解析配置、创建并构建模型
pub fn build_model(yaml: &str) -> Model<f64> {
    let config = ModelConfig::from_yaml(yaml).expect("配置解析失败");
    let mut model = Model::<f64>::from_config(&config).expect("模型创建失败");
    model.build().expect("模型构建失败");
    model
}

/// 构建并运行一次
pub fn run_model(yaml: &str) -> Model<f64> {
    let mut model = build_model(yaml);
    model.iterate().expect("模型运行失败");
    model
}

/// 某个类别的年龄向量
pub fn data(model: &Model<f64>, category: &str) -> Vec<f64> {
    model
        .partition()
        .category(category)
        .expect("类别不存在")
        .data()
        .to_vec()
}

/// 相对误差断言
pub fn assert_close(actual: f64, expected: f64, rel: f64) {
    let scale = expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= rel * scale,
        "actual={actual}, expected={expected}, rel={rel}"
    );
}

/// 两类别、年龄 1-20 的模板：`{processes}` 与 `{time_step}` 由调用方填入
pub fn two_sex_model(years: (u32, u32), phases: &str, processes: &str, time_step: &str) -> String {
    format!(
        r#"
model:
  start_year: {start}
  final_year: {end}
  min_age: 1
  max_age: 20
  age_plus: true
  time_steps: [step_one]
  initialisation_phases: [{phases}]
categories:
  format: maturity.sex
  names: [immature.male, immature.female]
selectivities:
  - type: constant
    label: one
    c: 1
{processes}
time_steps:
  - label: step_one
    processes: [{time_step}]
"#,
        start = years.0,
        end = years.1,
    )
}

/// 恒定补充 + 年龄增长 + M=0.065 死亡
pub const STANDARD_PROCESSES: &str = r#"
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
  - type: mortality_constant_rate
    label: mortality
    categories: [immature.male, immature.female]
    m: [0.065]
    selectivities: [one]
"#;

/// 年龄增长、补充、死亡顺序下的平衡状态
pub fn equilibrium(recruits: f64, m: f64, age: u32, max_age: u32) -> f64 {
    let survival = (-m).exp();
    if age < max_age {
        recruits * survival.powi(age as i32)
    } else {
        recruits * survival.powi(max_age as i32) / (1.0 - survival)
    }
}
