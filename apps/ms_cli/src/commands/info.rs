// apps/ms_cli/src/commands/info.rs

//! 信息显示命令

use anyhow::Result;
use clap::Args;
use ms_config::{InitialisationPhaseConfig, ProcessConfig, SelectivityConfig};
use std::path::{Path, PathBuf};

use super::load_config;

/// 信息显示参数
#[derive(Args)]
pub struct InfoArgs {
    /// 配置文件路径（显示模型结构）
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    match &args.config {
        Some(path) => print_model(path),
        None => {
            print_capabilities();
            Ok(())
        }
    }
}

fn print_capabilities() {
    println!("=== MariStock {} ===", env!("CARGO_PKG_VERSION"));
    println!("精度: f32, f64");
    println!("\n过程类型:");
    for name in ProcessConfig::supported_types() {
        println!("  - {name}");
    }
    println!("\n选择性类型:");
    for name in SelectivityConfig::supported_types() {
        println!("  - {name}");
    }
    println!("\n初始化阶段类型:");
    for name in InitialisationPhaseConfig::supported_types() {
        println!("  - {name}");
    }
}

fn print_model(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    let m = &config.model;
    println!("=== {} ===", path.display());
    println!("年份: {}-{} ({} 年)", m.start_year, m.final_year, m.years().len());
    println!(
        "年龄: {}-{}{}",
        m.min_age,
        m.max_age,
        if m.age_plus { " (累积组)" } else { "" }
    );
    println!("精度: {}", m.precision);
    println!("类别 ({}): {}", config.categories.names.len(), config.categories.names.join(", "));

    println!("\n时间步:");
    for label in &m.time_steps {
        let processes = config
            .time_steps
            .iter()
            .find(|t| &t.label == label)
            .map(|t| t.processes.join(" -> "))
            .unwrap_or_default();
        println!("  {label}: {processes}");
    }

    if !m.initialisation_phases.is_empty() {
        println!("\n初始化阶段: {}", m.initialisation_phases.join(", "));
    }
    if !config.derived_quantities.is_empty() {
        println!("\n派生量:");
        for dq in &config.derived_quantities {
            let s = dq.settings();
            println!("  {} @ {} (p={})", s.label, s.time_step, s.time_step_proportion);
        }
    }
    Ok(())
}
