//! Kite Connect wire types.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Deserialize;

use intraday_core::events::{Bar, BrokerPosition, ProductKind};

use crate::error::KiteError;

/// Every Kite response is wrapped in `{"status": ..., "data": ...}`; failures
/// carry `message` and `error_type` instead of `data`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    pub data: Option<T>,
    pub message: Option<String>,
    pub error_type: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwraps the payload, turning error envelopes into [`KiteError::Api`].
    pub fn into_data(self, status_code: u16) -> Result<T, KiteError> {
        if self.status == "success" && (200..300).contains(&status_code) {
            return self
                .data
                .ok_or_else(|| KiteError::Decode("success envelope without data".to_string()));
        }
        Err(KiteError::api(
            status_code,
            self.error_type.unwrap_or_else(|| "GeneralException".to_string()),
            self.message.unwrap_or_else(|| format!("status {}", self.status)),
        ))
    }
}

/// Decodes a raw response body.
///
/// # Errors
/// Returns [`KiteError::Api`] for error envelopes and [`KiteError::Decode`]
/// when the body is not an envelope at all.
pub fn decode<T: serde::de::DeserializeOwned>(status_code: u16, body: &str) -> Result<T, KiteError> {
    match serde_json::from_str::<Envelope<T>>(body) {
        Ok(envelope) => envelope.into_data(status_code),
        Err(_) if !(200..300).contains(&status_code) => Err(KiteError::api(
            status_code,
            "HttpError",
            body.chars().take(200).collect::<String>(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// `GET /quote/ltp` payload, keyed by `EXCHANGE:SYMBOL`.
pub type LtpResponse = HashMap<String, LtpEntry>;

#[derive(Debug, Clone, Deserialize)]
pub struct LtpEntry {
    pub instrument_token: u64,
    pub last_price: Decimal,
}

/// `GET /instruments/historical/...` payload.
#[derive(Debug, Deserialize)]
pub struct HistoricalData {
    pub candles: Vec<Candle>,
}

/// `[timestamp, open, high, low, close, volume]`.
#[derive(Debug, Deserialize)]
pub struct Candle(
    pub String,
    pub Decimal,
    pub Decimal,
    pub Decimal,
    pub Decimal,
    pub Decimal,
);

impl Candle {
    /// Candle timestamps carry the exchange offset (`+0530`); bars keep the
    /// exchange-local wall time.
    pub fn timestamp(&self) -> Result<NaiveDateTime, KiteError> {
        DateTime::parse_from_str(&self.0, "%Y-%m-%dT%H:%M:%S%z")
            .map(|dt| dt.naive_local())
            .map_err(|e| KiteError::Decode(format!("candle timestamp {:?}: {e}", self.0)))
    }

    pub fn to_bar(&self) -> Result<Bar, KiteError> {
        Ok(Bar::new(self.timestamp()?, self.4))
    }
}

/// `POST /orders/{variety}` payload.
#[derive(Debug, Deserialize)]
pub struct OrderResponse {
    pub order_id: String,
}

/// `GET /portfolio/positions` payload.
#[derive(Debug, Deserialize)]
pub struct PositionsResponse {
    pub net: Vec<NetPosition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetPosition {
    pub tradingsymbol: String,
    pub exchange: String,
    pub product: String,
    pub quantity: i64,
}

impl NetPosition {
    /// Open under `product`, i.e. same product and a non-zero net quantity.
    #[must_use]
    pub fn is_open_under(&self, product: ProductKind) -> bool {
        self.quantity != 0 && self.product.eq_ignore_ascii_case(product.as_str())
    }
}

impl From<NetPosition> for BrokerPosition {
    fn from(p: NetPosition) -> Self {
        Self {
            symbol: p.tradingsymbol,
            exchange: p.exchange,
            quantity: p.quantity,
        }
    }
}
