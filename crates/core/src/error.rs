//! Error taxonomy for gateway calls and configuration.
//!
//! Insufficient bar history is deliberately absent: it is an expected input
//! state and surfaces as `Signal::None`, not as an error.

use std::time::Duration;

use thiserror::Error;

/// Transient failure on a read-side gateway call (quote, history, positions).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Network or connection failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Session token missing, expired, or rejected.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The call did not complete within the configured bound.
    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout {
        /// Gateway operation that timed out.
        operation: &'static str,
        /// Bound that elapsed.
        after: Duration,
    },

    /// The gateway returned an error envelope.
    #[error("API error: {0}")]
    Api(String),

    /// Response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The gateway does not know the instrument.
    #[error("Unknown instrument: {0}")]
    UnknownSymbol(String),
}

impl GatewayError {
    #[must_use]
    pub const fn timeout(operation: &'static str, after: Duration) -> Self {
        Self::Timeout { operation, after }
    }

    /// Returns true if retrying on a later tick may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout { .. } | Self::Api(_))
    }
}

/// Order submission failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// The broker rejected the order.
    #[error("Order rejected: {reason}")]
    Rejected {
        /// Rejection reason reported by the broker.
        reason: String,
    },

    /// Not enough margin to place the order.
    #[error("Insufficient margin: {0}")]
    InsufficientMargin(String),

    /// Trading in the instrument is halted or blocked.
    #[error("Instrument halted: {0}")]
    Halted(String),

    /// The order never reached the broker.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl OrderError {
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Returns true if resubmitting on a later tick may succeed.
    ///
    /// A halted instrument stays halted for the session.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Rejected { .. } | Self::InsufficientMargin(_) => true,
            Self::Halted(_) => false,
            Self::Gateway(e) => e.is_retryable(),
        }
    }
}

/// Invalid session configuration, detected before the session starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("instrument universe is empty")]
    EmptyUniverse,

    #[error("order quantity must be positive")]
    ZeroQuantity,

    #[error("{name} must be strictly between 0 and 1, got {value}")]
    FractionOutOfRange { name: &'static str, value: String },

    #[error("fast window ({fast}) must be positive and shorter than slow window ({slow})")]
    InvalidWindows { fast: usize, slow: usize },

    #[error("tick interval must be 1..=59 seconds, got {0}")]
    TickInterval(u64),

    #[error("entry time {entry} must be before cutoff time {cutoff}")]
    EntryAfterCutoff { entry: String, cutoff: String },

    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("entry window must be at least one minute, got {0}")]
    EntryWindow(i64),

    #[error("broker timeout must be positive")]
    ZeroTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_names_operation() {
        let err = GatewayError::timeout("quote", Duration::from_secs(10));
        assert_eq!(err.to_string(), "quote timed out after 10s");
        assert!(err.is_retryable());
    }

    #[test]
    fn auth_is_not_retryable() {
        assert!(!GatewayError::Auth("expired".into()).is_retryable());
    }

    #[test]
    fn halted_orders_are_not_retried() {
        assert!(!OrderError::Halted("ABC".into()).is_retryable());
        assert!(OrderError::rejected("RMS busy").is_retryable());
        assert!(!OrderError::from(GatewayError::Auth("expired".into())).is_retryable());
        assert!(OrderError::from(GatewayError::Network("reset".into())).is_retryable());
    }

    #[test]
    fn order_error_wraps_gateway_error() {
        let err: OrderError = GatewayError::Network("reset".into()).into();
        assert_eq!(err.to_string(), "Network error: reset");
    }
}
