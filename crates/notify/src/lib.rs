//! Trade alert delivery.
//!
//! [`TelegramNotifier`] posts to the Bot API; [`LogNotifier`] only logs and
//! is used when no bot is configured.

pub mod logging;
pub mod telegram;

use std::sync::Arc;

use intraday_core::config::TelegramConfig;
use intraday_core::traits::Notifier;
use tracing::{info, warn};

pub use logging::LogNotifier;
pub use telegram::TelegramNotifier;

/// Picks the notifier for the given configuration.
///
/// Falls back to [`LogNotifier`] when Telegram is absent, incomplete, or the
/// HTTP client cannot be built; alerts are never fatal.
#[must_use]
pub fn from_config(config: Option<&TelegramConfig>) -> Arc<dyn Notifier> {
    let Some(cfg) = config.filter(|c| !c.bot_token.is_empty() && !c.chat_id.is_empty()) else {
        info!("Telegram not configured, alerts go to the log only");
        return Arc::new(LogNotifier);
    };

    match TelegramNotifier::new(cfg) {
        Ok(notifier) => {
            info!(chat_id = cfg.chat_id, "Telegram alerts enabled");
            Arc::new(notifier)
        }
        Err(e) => {
            warn!(error = %e, "Telegram client unavailable, alerts go to the log only");
            Arc::new(LogNotifier)
        }
    }
}
