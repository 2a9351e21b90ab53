//! Error types for Kite Connect integration.

use intraday_core::error::{GatewayError, OrderError};
use thiserror::Error;

/// Errors returned by the Kite REST client.
#[derive(Debug, Error)]
pub enum KiteError {
    /// Transport failure before a response was received.
    #[error("network error: {0}")]
    Network(String),

    /// Error envelope returned by Kite.
    #[error("API error: {status_code} {error_type} - {message}")]
    Api {
        status_code: u16,
        /// Kite exception class, e.g. `TokenException`.
        error_type: String,
        message: String,
    },

    /// Response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl KiteError {
    pub fn api(status_code: u16, error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// Kite exception class, if this is an API error.
    #[must_use]
    pub fn error_type(&self) -> Option<&str> {
        match self {
            Self::Api { error_type, .. } => Some(error_type),
            _ => None,
        }
    }

    /// Maps an order placement failure onto the broker-neutral order error.
    #[must_use]
    pub fn into_order_error(self) -> OrderError {
        match self {
            Self::Api {
                error_type,
                message,
                ..
            } => match error_type.as_str() {
                "MarginException" => OrderError::InsufficientMargin(message),
                "OrderException" if is_halt(&message) => OrderError::Halted(message),
                "OrderException" | "InputException" => OrderError::rejected(message),
                "TokenException" => OrderError::Gateway(GatewayError::Auth(message)),
                _ => OrderError::Gateway(GatewayError::Api(format!("{error_type}: {message}"))),
            },
            other => OrderError::Gateway(other.into()),
        }
    }
}

/// Circuit limits, trade bans and blocked or suspended scrips.
fn is_halt(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    ["circuit", "blocked", "suspended", "ban period"]
        .iter()
        .any(|needle| message.contains(needle))
}

impl From<KiteError> for GatewayError {
    fn from(err: KiteError) -> Self {
        match err {
            KiteError::Network(msg) => Self::Network(msg),
            KiteError::Api {
                error_type,
                message,
                ..
            } if error_type == "TokenException" => Self::Auth(message),
            KiteError::Api {
                status_code,
                error_type,
                message,
            } => Self::Api(format!("{status_code} {error_type}: {message}")),
            KiteError::Decode(msg) => Self::Decode(msg),
            KiteError::UnknownInstrument(symbol) => Self::UnknownSymbol(symbol),
            KiteError::Configuration(msg) => Self::Api(msg),
        }
    }
}

impl From<reqwest::Error> for KiteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for KiteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
