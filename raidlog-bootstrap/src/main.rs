use anyhow::Result;
use clap::Parser;

use raidlog_infrastructure::{AppConfig, CONFIG_ENV};

#[derive(Parser, Debug)]
#[command(name = "raidlog")]
#[command(about = "Raid event attribution and delivery service", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(config) = args.config {
        std::env::set_var(CONFIG_ENV, config);
    }

    // The audit directory comes from the config, so it loads before logging starts.
    let config = AppConfig::load().await?;
    let _audit_guard = raidlog_bootstrap::init_logging(&config.audit_log_dir)?;
    tracing::info!(bind = %config.bind_addr, "configuration loaded");

    raidlog_bootstrap::run(config).await
}
