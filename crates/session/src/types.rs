//! Types shared across the session loop.

use intraday_core::position::{ExitReason, Position};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Scheduler phase. Transitions are linear and never revisit an earlier phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for the entry time.
    PreEntry,
    /// Entry scan done; monitoring exits until cutoff.
    EntryDone,
    /// Square-off done (or aborted). Terminal.
    SessionEnded,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PreEntry => write!(f, "pre_entry"),
            Self::EntryDone => write!(f, "entry_done"),
            Self::SessionEnded => write!(f, "session_ended"),
        }
    }
}

/// End-of-session report built from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub opened: usize,
    pub closed_target: usize,
    pub closed_stop: usize,
    pub closed_square_off: usize,
    pub still_open: usize,
    /// Sum over positions with a known exit price.
    pub realized_pnl: Decimal,
    pub positions: Vec<Position>,
}

impl SessionSummary {
    #[must_use]
    pub fn from_positions<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Self {
        let positions: Vec<Position> = positions.into_iter().cloned().collect();
        let count = |reason: ExitReason| {
            positions
                .iter()
                .filter(|p| p.exit_reason == Some(reason))
                .count()
        };

        Self {
            opened: positions.len(),
            closed_target: count(ExitReason::Target),
            closed_stop: count(ExitReason::StopLoss),
            closed_square_off: count(ExitReason::SquareOff),
            still_open: positions.iter().filter(|p| p.is_open()).count(),
            realized_pnl: positions.iter().filter_map(Position::realized_pnl).sum(),
            positions,
        }
    }
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Session summary: opened {}, target {}, stop {}, square-off {}, still open {}, realized P&L {}",
            self.opened,
            self.closed_target,
            self.closed_stop,
            self.closed_square_off,
            self.still_open,
            self.realized_pnl.round_dp(2)
        )
    }
}
