//! Kite Connect integration for intraday equity trading.
//!
//! Provides the REST client (quotes, historical candles, order placement,
//! positions), a local paper book for simulated fills, and [`KiteBroker`],
//! the `Broker` implementation used by the session loop.

pub mod account;
pub mod broker;
pub mod client;
pub mod error;
pub mod execution;
pub mod market_data;
pub mod paper;
pub mod types;

pub use broker::KiteBroker;
pub use client::KiteClient;
pub use error::KiteError;
pub use paper::PaperBook;
