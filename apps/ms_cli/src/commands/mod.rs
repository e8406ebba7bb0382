// apps/ms_cli/src/commands/mod.rs

//! 子命令

pub mod info;
pub mod run;
pub mod validate;

use anyhow::{Context, Result};
use ms_config::ModelConfig;
use std::path::Path;

/// 加载配置文件（YAML 或 JSON）
pub fn load_config(path: &Path) -> Result<ModelConfig> {
    ModelConfig::load(path).with_context(|| format!("无法加载配置文件: {}", path.display()))
}
