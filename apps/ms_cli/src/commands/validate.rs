// apps/ms_cli/src/commands/validate.rs

//! 配置验证命令
//!
//! 先做配置层的结构检查，再创建并构建引擎，检查全部标签能否解析。

use anyhow::{bail, Result};
use clap::Args;
use ms_config::ModelConfig;
use ms_population::build_dyn_model;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{error, info, warn};

use super::load_config;

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 严格模式（警告也视为错误）
    #[arg(long)]
    pub strict: bool,
}

#[derive(Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn is_ok(&self, strict: bool) -> bool {
        self.errors.is_empty() && (!strict || self.warnings.is_empty())
    }
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== MariStock 配置验证 ===");
    let config = load_config(&args.config)?;
    let mut result = ValidationResult::default();

    match config.validate() {
        Ok(()) => {
            check_warnings(&config, &mut result);
            if let Err(e) = build_dyn_model(&config) {
                result.add_error(format!("引擎构建失败: {e}"));
            }
        }
        Err(e) => result.add_error(format!("配置无效: {e}")),
    }

    for warning in &result.warnings {
        warn!("{warning}");
    }
    for err in &result.errors {
        error!("{err}");
    }

    if result.is_ok(args.strict) {
        println!("✓ {} 验证通过", args.config.display());
        Ok(())
    } else {
        bail!(
            "验证失败: {} 个错误, {} 个警告",
            result.errors.len(),
            result.warnings.len()
        )
    }
}

fn check_warnings(config: &ModelConfig, result: &mut ValidationResult) {
    let scheduled: HashSet<&str> = config
        .time_steps
        .iter()
        .flat_map(|t| t.processes.iter().map(String::as_str))
        .collect();
    for process in &config.processes {
        if !scheduled.contains(process.label()) {
            result.add_warning(format!("过程 '{}' 不在任何时间步中", process.label()));
        }
    }
    for time_step in &config.time_steps {
        if !config.model.time_steps.contains(&time_step.label) {
            result.add_warning(format!("时间步 '{}' 未出现在 model.time_steps 中", time_step.label));
        }
    }
    if config.model.initialisation_phases.is_empty() {
        result.add_warning("没有初始化阶段，分区从零开始");
    }
}
