use crate::rolling::{MaPair, RollingSeries};
use intraday_core::config::SessionConfig;
use intraday_core::error::GatewayError;
use intraday_core::events::{Bar, Signal};
use intraday_core::traits::Broker;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// Outcome of one crossover evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub signal: Signal,
    /// Close of the last bar; set whenever a signal fired.
    pub price: Option<Decimal>,
    /// Averages at the last bar, when history was sufficient.
    pub averages: Option<MaPair>,
}

impl Detection {
    #[must_use]
    pub const fn none() -> Self {
        Self {
            signal: Signal::None,
            price: None,
            averages: None,
        }
    }
}

/// Classifies the transition between two consecutive bars' averages.
#[must_use]
pub fn classify(prev: MaPair, curr: MaPair) -> Signal {
    match (prev.fast_above(), curr.fast_above()) {
        (false, true) => Signal::EnterLong,
        (true, false) => Signal::EnterShort,
        _ => Signal::None,
    }
}

/// Fast/slow SMA crossover detector over a fresh bar history.
pub struct CrossoverDetector {
    fast_period: usize,
    slow_period: usize,
    lookback: chrono::Duration,
    interval: String,
}

impl CrossoverDetector {
    #[must_use]
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        lookback: chrono::Duration,
        interval: impl Into<String>,
    ) -> Self {
        Self {
            fast_period,
            slow_period,
            lookback,
            interval: interval.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            config.fast_window,
            config.slow_window,
            chrono::Duration::days(config.lookback_days),
            config.bar_interval.clone(),
        )
    }

    /// Bars needed before a signal can fire: averages at two consecutive bars.
    #[must_use]
    pub const fn min_bars(&self) -> usize {
        self.slow_period + 1
    }

    /// Evaluates a bar history, oldest first.
    #[must_use]
    pub fn evaluate(&self, bars: &[Bar]) -> Detection {
        if bars.len() < self.min_bars() {
            return Detection::none();
        }

        let mut series = RollingSeries::new(self.fast_period, self.slow_period);
        let mut prev = None;
        let mut curr = None;
        for bar in bars {
            prev = curr;
            curr = series.push(bar);
        }

        let (Some(prev), Some(curr)) = (prev, curr) else {
            return Detection::none();
        };
        let signal = classify(prev, curr);
        let price = bars.last().map(|b| b.close);

        Detection {
            signal,
            price: (signal != Signal::None).then_some(price).flatten(),
            averages: Some(curr),
        }
    }

    /// Fetches the lookback window ending at `now` and evaluates it.
    ///
    /// # Errors
    ///
    /// Returns the gateway error unchanged; callers treat it as no signal.
    pub async fn detect<B: Broker + ?Sized>(
        &self,
        broker: &B,
        symbol: &str,
        now: NaiveDateTime,
    ) -> Result<Detection, GatewayError> {
        let from = now - self.lookback;
        let bars = broker.history(symbol, from, now, &self.interval).await?;

        let detection = self.evaluate(&bars);
        if bars.len() < self.min_bars() {
            tracing::debug!(
                symbol,
                bars = bars.len(),
                required = self.min_bars(),
                "Insufficient history for crossover"
            );
        } else if let Some(ma) = detection.averages {
            tracing::debug!(
                symbol,
                fast = %ma.fast.round_dp(4),
                slow = %ma.slow.round_dp(4),
                signal = ?detection.signal,
                "Crossover evaluated"
            );
        }
        Ok(detection)
    }
}
