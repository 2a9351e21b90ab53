//! Exchange-local wall clock used to gate session transitions.

use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;

pub trait Clock: Send + Sync {
    /// Current wall time in the exchange's timezone.
    fn now(&self) -> NaiveDateTime;
}

/// System clock projected into the exchange timezone.
#[derive(Debug, Clone, Copy)]
pub struct ExchangeClock {
    tz: Tz,
}

impl ExchangeClock {
    #[must_use]
    pub const fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Clock for ExchangeClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }
}
