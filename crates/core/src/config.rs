use crate::error::ConfigError;
use crate::events::ProductKind;
use chrono::NaiveTime;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub kite: KiteConfig,
    /// Alerts are only logged when absent.
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
}

/// Static parameters for one trading session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Instrument universe scanned at entry time.
    pub symbols: Vec<String>,
    pub exchange: String,
    /// Product type orders are placed under and square-off flattens.
    pub product: ProductKind,
    /// Units per order.
    pub quantity: u32,
    /// Stop distance as a fraction of entry (0.02 = 2%).
    pub stop_loss_pct: Decimal,
    /// Target distance as a fraction of entry.
    pub target_pct: Decimal,
    pub fast_window: usize,
    pub slow_window: usize,
    /// Calendar days of history fetched for each detection.
    pub lookback_days: i64,
    /// Broker bar interval name (e.g. `5minute`).
    pub bar_interval: String,
    #[serde(with = "hhmm")]
    pub entry_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub cutoff_time: NaiveTime,
    /// Minutes after `entry_time` during which a late first tick still scans.
    pub entry_window_mins: i64,
    pub tick_interval_secs: u64,
    /// Hard bound on every broker call.
    pub broker_timeout_secs: u64,
    /// IANA zone the entry and cutoff times are expressed in.
    pub timezone: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            symbols: ["INFY", "TCS", "HDFCBANK", "LT"]
                .into_iter()
                .map(String::from)
                .collect(),
            exchange: "NSE".to_string(),
            product: ProductKind::Mis,
            quantity: 1,
            stop_loss_pct: Decimal::new(2, 2),
            target_pct: Decimal::new(4, 2),
            fast_window: 20,
            slow_window: 50,
            lookback_days: 5,
            bar_interval: "5minute".to_string(),
            entry_time: NaiveTime::from_hms_opt(9, 15, 0).unwrap_or_default(),
            cutoff_time: NaiveTime::from_hms_opt(15, 15, 0).unwrap_or_default(),
            entry_window_mins: 5,
            tick_interval_secs: 30,
            broker_timeout_secs: 10,
            timezone: "Asia/Kolkata".to_string(),
        }
    }
}

impl SessionConfig {
    /// Checks every invariant the scheduler relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::EmptyUniverse);
        }
        if self.quantity == 0 {
            return Err(ConfigError::ZeroQuantity);
        }
        check_fraction("stop_loss_pct", self.stop_loss_pct)?;
        check_fraction("target_pct", self.target_pct)?;
        if self.fast_window == 0 || self.fast_window >= self.slow_window {
            return Err(ConfigError::InvalidWindows {
                fast: self.fast_window,
                slow: self.slow_window,
            });
        }
        // Minute-granularity thresholds need at least one tick per minute.
        if !(1..60).contains(&self.tick_interval_secs) {
            return Err(ConfigError::TickInterval(self.tick_interval_secs));
        }
        if self.entry_time >= self.cutoff_time {
            return Err(ConfigError::EntryAfterCutoff {
                entry: self.entry_time.format("%H:%M").to_string(),
                cutoff: self.cutoff_time.format("%H:%M").to_string(),
            });
        }
        if self.entry_window_mins <= 0 {
            return Err(ConfigError::EntryWindow(self.entry_window_mins));
        }
        if self.broker_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        self.tz()?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ConfigError::UnknownTimezone` if the name is not an IANA zone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimezone(self.timezone.clone()))
    }

    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    #[must_use]
    pub const fn broker_timeout(&self) -> Duration {
        Duration::from_secs(self.broker_timeout_secs)
    }

    #[must_use]
    pub fn entry_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.entry_window_mins)
    }
}

fn check_fraction(name: &'static str, value: Decimal) -> Result<(), ConfigError> {
    if value <= Decimal::ZERO || value >= Decimal::ONE {
        return Err(ConfigError::FractionOutOfRange {
            name,
            value: value.to_string(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Live,
    /// Real market data, locally simulated fills.
    #[default]
    Paper,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KiteConfig {
    pub api_url: String,
    pub api_key: String,
    pub access_token: String,
    pub mode: ExecutionMode,
}

impl Default for KiteConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.kite.trade".to_string(),
            api_key: String::new(),
            access_token: String::new(),
            mode: ExecutionMode::Paper,
        }
    }
}

impl std::fmt::Debug for KiteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KiteConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key)
            .field("access_token", &"<redacted>")
            .field("mode", &self.mode)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_telegram_url")]
    pub api_url: String,
    pub bot_token: String,
    pub chat_id: String,
}

fn default_telegram_url() -> String {
    "https://api.telegram.org".to_string()
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_url", &self.api_url)
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// `"HH:MM"` time-of-day (seconds accepted but optional).
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_are_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stop_loss_pct, dec!(0.02));
        assert_eq!(config.target_pct, dec!(0.04));
        assert_eq!(config.tz().unwrap(), chrono_tz::Asia::Kolkata);
    }

    #[test]
    fn rejects_tick_of_a_minute_or_more() {
        let config = SessionConfig {
            tick_interval_secs: 60,
            ..SessionConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::TickInterval(60)));
    }

    #[test]
    fn rejects_empty_entry_window() {
        for mins in [0, -5] {
            let config = SessionConfig {
                entry_window_mins: mins,
                ..SessionConfig::default()
            };
            assert_eq!(config.validate(), Err(ConfigError::EntryWindow(mins)));
        }
    }

    #[test]
    fn rejects_fast_window_not_shorter_than_slow() {
        let config = SessionConfig {
            fast_window: 50,
            ..SessionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWindows { fast: 50, slow: 50 })
        ));
    }

    #[test]
    fn rejects_fraction_of_one() {
        let config = SessionConfig {
            target_pct: dec!(1),
            ..SessionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FractionOutOfRange { name: "target_pct", .. })
        ));
    }

    #[test]
    fn rejects_entry_after_cutoff() {
        let config = SessionConfig {
            entry_time: NaiveTime::from_hms_opt(15, 30, 0).unwrap(),
            ..SessionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EntryAfterCutoff { .. })
        ));
    }

    #[test]
    fn rejects_unknown_timezone() {
        let config = SessionConfig {
            timezone: "Mars/Olympus".to_string(),
            ..SessionConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnknownTimezone("Mars/Olympus".to_string()))
        );
    }

    #[test]
    fn debug_redacts_credentials() {
        let kite = KiteConfig {
            access_token: "secret-token".to_string(),
            ..KiteConfig::default()
        };
        assert!(!format!("{kite:?}").contains("secret-token"));
    }
}
