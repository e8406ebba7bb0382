// apps/ms_cli/src/main.rs

//! MariStock 命令行界面
//!
//! 加载模型配置、运行种群动态模型并输出摘要。
//!
//! # 架构层级
//!
//! 本模块属于 **Layer 5: Application**：
//! - 只使用 `ModelConfig` 与 `Box<dyn DynModel>`，不出现泛型参数
//! - 通过 `Precision` 枚举选择精度

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// MariStock 种群动态评估引擎命令行工具
#[derive(Parser)]
#[command(name = "ms_cli")]
#[command(author = "MariStock Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MariStock age-structured population dynamics engine", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行模型
    Run(commands::run::RunArgs),
    /// 显示信息
    Info(commands::info::InfoArgs),
    /// 验证配置
    Validate(commands::validate::ValidateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Info(args) => commands::info::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    }
}
