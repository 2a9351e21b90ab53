//! `run`: one trading session from entry scan to square-off.

use anyhow::{Context, Result};
use clap::Args;
use tokio::sync::watch;
use tracing::{info, warn};

use intraday_core::config::ExecutionMode;
use intraday_core::ConfigLoader;
use intraday_kite::KiteBroker;
use intraday_session::{ExchangeClock, SessionScheduler, TimeoutBroker};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Config file path
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: String,

    /// Simulate fills locally regardless of `kite.mode`
    #[arg(long)]
    pub paper: bool,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<String>,
}

pub async fn run_session(args: RunArgs) -> Result<()> {
    info!(config = args.config, "Starting intraday session");

    let mut config = ConfigLoader::load_from(&args.config)?;
    if args.paper {
        config.kite.mode = ExecutionMode::Paper;
    }
    if config.kite.mode == ExecutionMode::Live {
        warn!("LIVE mode: orders will be sent to the exchange");
    }

    let tz = config.session.tz()?;
    let broker = KiteBroker::new(&config.kite, config.session.exchange.clone())
        .context("Failed to initialise Kite client")?;
    let broker = TimeoutBroker::new(broker, config.session.broker_timeout());
    let notifier = intraday_notify::from_config(config.telegram.as_ref());

    let scheduler = SessionScheduler::new(config.session, broker, notifier, ExchangeClock::new(tz));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, squaring off before exit");
            let _ = shutdown_tx.send(true);
        }
    });

    let summary = scheduler.run(shutdown_rx).await;

    info!("{summary}");
    for pos in &summary.positions {
        info!(
            symbol = pos.symbol,
            direction = %pos.direction,
            entry = %pos.entry_price,
            exit = ?pos.exit_price,
            reason = ?pos.exit_reason,
            pnl = ?pos.realized_pnl(),
            "Position"
        );
    }
    if summary.still_open > 0 {
        warn!(still_open = summary.still_open, "Session ended with open positions");
    }

    Ok(())
}
