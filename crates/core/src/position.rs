use crate::events::Direction;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    Open,
    Closed,
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    Target,
    StopLoss,
    /// Flattened by the forced end-of-session square-off.
    SquareOff,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Target => write!(f, "target"),
            Self::StopLoss => write!(f, "stop_loss"),
            Self::SquareOff => write!(f, "square_off"),
        }
    }
}

/// A position opened by this session. Owned by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub exchange: String,
    pub direction: Direction,
    pub quantity: u32,
    pub entry_price: Decimal,
    pub stop_price: Decimal,
    pub target_price: Decimal,
    pub status: PositionStatus,
    pub entry_order_id: String,
    pub opened_at: NaiveDateTime,
    pub exit_price: Option<Decimal>,
    pub exit_order_id: Option<String>,
    pub exit_reason: Option<ExitReason>,
}

impl Position {
    /// Stop and target for an entry at `price`, rounded to currency minor units.
    ///
    /// Returns `(stop, target)`.
    #[must_use]
    pub fn bracket(
        direction: Direction,
        price: Decimal,
        stop_loss_pct: Decimal,
        target_pct: Decimal,
    ) -> (Decimal, Decimal) {
        let (stop, target) = match direction {
            Direction::Long => (
                price * (Decimal::ONE - stop_loss_pct),
                price * (Decimal::ONE + target_pct),
            ),
            Direction::Short => (
                price * (Decimal::ONE + stop_loss_pct),
                price * (Decimal::ONE - target_pct),
            ),
        };
        (stop.round_dp(2), target.round_dp(2))
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// Realized P&L once closed with a known exit price.
    #[must_use]
    pub fn realized_pnl(&self) -> Option<Decimal> {
        let exit = self.exit_price?;
        let per_unit = match self.direction {
            Direction::Long => exit - self.entry_price,
            Direction::Short => self.entry_price - exit,
        };
        Some(per_unit * Decimal::from(self.quantity))
    }
}
