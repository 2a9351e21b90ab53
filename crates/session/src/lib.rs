//! Intraday session control.
//!
//! Runs one trading day as a polling loop that:
//! - Scans the universe once at entry time for fast/slow SMA crossovers
//! - Opens at most one bracketed position per symbol
//! - Closes positions on stop-loss or target every tick
//! - Flattens every managed-product position at the cutoff time
//!
//! All rules are deterministic; the broker and notifier are injected.

pub mod clock;
pub mod exits;
pub mod guard;
pub mod ledger;
pub mod scheduler;
pub mod square_off;
pub mod types;

pub use clock::{Clock, ExchangeClock};
pub use guard::TimeoutBroker;
pub use ledger::PositionLedger;
pub use scheduler::SessionScheduler;
pub use square_off::{SquareOff, SquareOffReport, MAX_SQUARE_OFF_ATTEMPTS};
pub use types::{Phase, SessionSummary};
