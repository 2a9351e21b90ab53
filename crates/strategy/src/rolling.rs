//! Incremental simple moving averages over a bar stream.

use intraday_core::events::Bar;
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Fast and slow averages at one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaPair {
    pub fast: Decimal,
    pub slow: Decimal,
}

impl MaPair {
    #[must_use]
    pub const fn new(fast: Decimal, slow: Decimal) -> Self {
        Self { fast, slow }
    }

    /// Strictly above; equality counts as not above.
    #[must_use]
    pub fn fast_above(&self) -> bool {
        self.fast > self.slow
    }
}

/// Bounded window with a running sum.
#[derive(Debug, Clone)]
struct Sma {
    period: usize,
    window: VecDeque<Decimal>,
    sum: Decimal,
}

impl Sma {
    fn new(period: usize) -> Self {
        Self {
            period,
            window: VecDeque::with_capacity(period + 1),
            sum: Decimal::ZERO,
        }
    }

    fn push(&mut self, value: Decimal) {
        self.window.push_back(value);
        self.sum += value;
        if self.window.len() > self.period {
            if let Some(evicted) = self.window.pop_front() {
                self.sum -= evicted;
            }
        }
    }

    fn value(&self) -> Option<Decimal> {
        (self.period > 0 && self.window.len() == self.period)
            .then(|| self.sum / Decimal::from(self.period))
    }
}

/// Fast/slow SMA pair for one instrument, fed in bar order.
///
/// Averages are undefined until `slow_period` bars have been pushed.
#[derive(Debug, Clone)]
pub struct RollingSeries {
    fast: Sma,
    slow: Sma,
}

impl RollingSeries {
    #[must_use]
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        Self {
            fast: Sma::new(fast_period),
            slow: Sma::new(slow_period),
        }
    }

    /// Appends a bar and returns the averages at that bar, once defined.
    pub fn push(&mut self, bar: &Bar) -> Option<MaPair> {
        self.fast.push(bar.close);
        self.slow.push(bar.close);
        self.current()
    }

    #[must_use]
    pub fn current(&self) -> Option<MaPair> {
        let slow = self.slow.value()?;
        let fast = self.fast.value()?;
        Some(MaPair::new(fast, slow))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn bar(i: u32, close: Decimal) -> Bar {
        let ts = NaiveDate::from_ymd_opt(2025, 1, 6)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap()
            + chrono::Duration::minutes(5 * i64::from(i));
        Bar::new(ts, close)
    }

    #[test]
    fn undefined_until_slow_window_fills() {
        let mut series = RollingSeries::new(2, 4);
        assert!(series.push(&bar(0, dec!(1))).is_none());
        assert!(series.push(&bar(1, dec!(2))).is_none());
        assert!(series.push(&bar(2, dec!(3))).is_none());
        let pair = series.push(&bar(3, dec!(4))).unwrap();
        assert_eq!(pair.fast, dec!(3.5));
        assert_eq!(pair.slow, dec!(2.5));
    }

    #[test]
    fn window_slides_with_running_sum() {
        let mut series = RollingSeries::new(2, 3);
        for (i, close) in [dec!(10), dec!(20), dec!(30), dec!(40)].into_iter().enumerate() {
            series.push(&bar(i as u32, close));
        }
        let pair = series.current().unwrap();
        assert_eq!(pair.fast, dec!(35));
        assert_eq!(pair.slow, dec!(30));
    }

    #[test]
    fn equality_is_not_above() {
        assert!(!MaPair::new(dec!(10), dec!(10)).fast_above());
        assert!(MaPair::new(dec!(10.01), dec!(10)).fast_above());
    }
}
