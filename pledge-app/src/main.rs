use anyhow::Result;
use clap::Parser;
use pledge_common::observability::init_logging;
use pledge_config::{PledgeConfig, PledgeConfigLoader};

mod cli;
mod commands;
mod tether;

use cli::{Cli, Command};
use tether::{build_from_config, log_config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Config (env wins over file)
    let cfg: PledgeConfig = PledgeConfigLoader::new()
        .with_optional_file(&cli.config)
        .load()?;

    // 2) Logging from the `log` section
    let log_path = init_logging(log_config(&cfg.log)?)?;
    tracing::debug!(log_path=%log_path.display(), "app.logging_ready");

    let migrate = matches!(cli.command, Command::Migrate);
    let tether = build_from_config(&cfg, migrate).await?;

    let result = commands::run(&tether, cli.command).await;
    if let Err(err) = &result {
        tracing::warn!(error=%err, "app.command_failed");
    }
    result
}
