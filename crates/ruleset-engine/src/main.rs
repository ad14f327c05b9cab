//! 录取规则集引擎 CLI
//!
//! 提供规则集校验、计分评估与持久化形态转换。

use admissions_shared::config::AppConfig;
use admissions_shared::observability;
use anyhow::Result;
use clap::Parser;
use ruleset_engine::cli::{Cli, CommandRunner, Commands};
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 统一加载配置：config/{service_name}.toml + ADMISSIONS_ 环境变量
    let config = AppConfig::load("ruleset-engine").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    // 命令行指定的日志级别覆盖配置文件
    let mut obs_config = config.observability();
    if let Some(level) = cli.log_level.clone() {
        obs_config = obs_config.with_log_level(level);
    }
    let _guard = observability::init(&obs_config)?;

    debug!(environment = %config.environment, engine = ?config.engine, "配置已加载");

    let runner = CommandRunner::new(config.engine);

    match cli.command {
        Commands::Validate { file } => runner.run_validate(&file)?,
        Commands::Evaluate {
            ruleset,
            values,
            trace,
            strict,
        } => runner.run_evaluate(&ruleset, &values, trace, strict)?,
        Commands::Flatten { file, output } => runner.run_flatten(&file, output)?,
        Commands::Rehydrate { file, output } => runner.run_rehydrate(&file, output)?,
    }

    Ok(())
}
