//! `check-config`: load, validate and print the resolved session.

use anyhow::Result;
use clap::Args;

use intraday_core::{AppConfig, ConfigLoader};

#[derive(Args, Debug)]
pub struct CheckConfigArgs {
    /// Config file path
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: String,
}

pub fn check_config(args: &CheckConfigArgs) -> Result<()> {
    let config = ConfigLoader::load_from(&args.config)?;
    println!("{}", describe(&config)?);
    Ok(())
}

fn describe(config: &AppConfig) -> Result<String> {
    let session = serde_json::to_string_pretty(&config.session)?;
    let telegram = if config.telegram.is_some() {
        "enabled"
    } else {
        "disabled (log only)"
    };
    Ok(format!(
        "Configuration OK\n\nsession = {session}\n\nkite: {} ({:?} mode)\ntelegram: {telegram}",
        config.kite.api_url, config.kite.mode
    ))
}
