// apps/ms_cli/src/commands/run.rs

//! 运行模型命令
//!
//! 每个重复运行拥有独立的模型实例与分区，由 rayon 并行执行。

use anyhow::{ensure, Context, Result};
use clap::Args;
use ms_config::{DynModel, Precision, RunSummary};
use ms_population::build_dyn_model;
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use super::load_config;

/// 运行参数
#[derive(Args)]
pub struct RunArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 覆盖配置中的精度 (f32, f64)
    #[arg(short, long)]
    pub precision: Option<Precision>,

    /// 独立重复运行次数
    #[arg(short, long, default_value = "1")]
    pub replicates: usize,

    /// 摘要输出文件（JSON），省略时打印到标准输出
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct RunReport {
    replicates: usize,
    elapsed_seconds: f64,
    summary: RunSummary,
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    ensure!(args.replicates > 0, "replicates 必须大于 0");
    info!("=== MariStock 模型运行 ===");

    let mut config = load_config(&args.config)?;
    if let Some(precision) = args.precision {
        config.model.precision = precision;
    }
    info!(
        "模型: {}-{}, 年龄 {}-{}, 精度 {}",
        config.model.start_year,
        config.model.final_year,
        config.model.min_age,
        config.model.max_age,
        config.model.precision
    );

    let start = Instant::now();
    let summaries = (0..args.replicates)
        .into_par_iter()
        .map(|replicate| run_once(&config, replicate))
        .collect::<Result<Vec<_>>>()?;
    let elapsed = start.elapsed().as_secs_f64();
    info!("完成 {} 次运行, 用时 {:.3} s", args.replicates, elapsed);

    let mut summaries = summaries.into_iter();
    let Some(summary) = summaries.next() else {
        return Ok(());
    };
    if summaries.any(|s| s.partition_totals != summary.partition_totals) {
        warn!("重复运行的分区总量不一致");
    }
    if summary.penalty_score > 0.0 {
        warn!("惩罚项总分 {:.6}", summary.penalty_score);
    }

    let report = RunReport {
        replicates: args.replicates,
        elapsed_seconds: elapsed,
        summary,
    };
    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("无法写入 {}", path.display()))?;
            info!("摘要已写入 {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_once(config: &ms_config::ModelConfig, replicate: usize) -> Result<RunSummary> {
    let mut model: Box<dyn DynModel> =
        build_dyn_model(config).with_context(|| format!("第 {replicate} 次运行: 构建模型失败"))?;
    model
        .run()
        .with_context(|| format!("第 {replicate} 次运行: 模型运行失败"))?;
    Ok(model.summary())
}
