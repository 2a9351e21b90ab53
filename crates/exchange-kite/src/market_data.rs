//! Market data: last traded price and historical candles.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::debug;

use intraday_core::events::Bar;

use crate::client::{Bucket, KiteClient};
use crate::error::KiteError;
use crate::types::{HistoricalData, LtpResponse};

const KITE_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

/// Last traded price snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ltp {
    pub instrument_token: u64,
    pub last_price: Decimal,
}

fn instrument_key(exchange: &str, symbol: &str) -> String {
    format!("{exchange}:{symbol}")
}

impl KiteClient {
    /// Fetches the last traded price and caches the instrument token.
    ///
    /// # Errors
    /// Returns error on transport failure or if Kite does not know the instrument.
    pub async fn ltp(&self, exchange: &str, symbol: &str) -> Result<Ltp, KiteError> {
        let key = instrument_key(exchange, symbol);
        let mut data: LtpResponse = self
            .get("/quote/ltp", &[("i", key.clone())], Bucket::General)
            .await?;

        let entry = data
            .remove(&key)
            .ok_or_else(|| KiteError::UnknownInstrument(key.clone()))?;
        self.tokens.write().await.insert(key, entry.instrument_token);

        debug!(symbol, price = %entry.last_price, "LTP");
        Ok(Ltp {
            instrument_token: entry.instrument_token,
            last_price: entry.last_price,
        })
    }

    /// Instrument token for `exchange:symbol`, resolved through LTP on first use.
    ///
    /// # Errors
    /// Returns error if the token is not cached and the LTP lookup fails.
    pub async fn instrument_token(&self, exchange: &str, symbol: &str) -> Result<u64, KiteError> {
        let key = instrument_key(exchange, symbol);
        if let Some(token) = self.tokens.read().await.get(&key) {
            return Ok(*token);
        }
        Ok(self.ltp(exchange, symbol).await?.instrument_token)
    }

    /// Fetches historical candles for `[from, to]`, oldest first.
    ///
    /// `interval` is a Kite interval name such as `minute` or `5minute`.
    ///
    /// # Errors
    /// Returns error on transport failure or malformed candles.
    pub async fn historical(
        &self,
        exchange: &str,
        symbol: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
        interval: &str,
    ) -> Result<Vec<Bar>, KiteError> {
        let token = self.instrument_token(exchange, symbol).await?;
        let path = format!("/instruments/historical/{token}/{interval}");
        let query = [
            ("from", from.format(KITE_DATETIME).to_string()),
            ("to", to.format(KITE_DATETIME).to_string()),
        ];

        let data: HistoricalData = self.get(&path, &query, Bucket::History).await?;
        let bars = data
            .candles
            .iter()
            .map(|c| c.to_bar())
            .collect::<Result<Vec<_>, _>>()?;

        debug!(symbol, interval, bars = bars.len(), "Historical candles");
        Ok(bars)
    }
}
