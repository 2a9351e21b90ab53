//! [`Broker`] implementation over Kite Connect.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tracing::info;

use intraday_core::config::{ExecutionMode, KiteConfig};
use intraday_core::error::{GatewayError, OrderError};
use intraday_core::events::{Bar, BrokerPosition, OrderRequest, ProductKind, Quote};
use intraday_core::traits::Broker;

use crate::client::KiteClient;
use crate::error::KiteError;
use crate::paper::PaperBook;

/// Kite-backed broker for one exchange.
///
/// Market data always comes from Kite. In [`ExecutionMode::Paper`] orders
/// and positions stay in a local [`PaperBook`].
#[derive(Debug)]
pub struct KiteBroker {
    client: KiteClient,
    exchange: String,
    mode: ExecutionMode,
    paper: PaperBook,
}

impl KiteBroker {
    /// # Errors
    /// Returns error if the Kite client cannot be built.
    pub fn new(config: &KiteConfig, exchange: impl Into<String>) -> Result<Self, KiteError> {
        let client = KiteClient::new(config)?;
        let exchange = exchange.into();
        info!(
            base_url = client.base_url(),
            exchange = %exchange,
            mode = ?config.mode,
            "Kite broker ready"
        );
        Ok(Self {
            client,
            exchange,
            mode: config.mode,
            paper: PaperBook::new(),
        })
    }

    #[must_use]
    pub const fn mode(&self) -> ExecutionMode {
        self.mode
    }
}

#[async_trait]
impl Broker for KiteBroker {
    async fn quote(&self, symbol: &str) -> Result<Quote, GatewayError> {
        let ltp = self.client.ltp(&self.exchange, symbol).await?;
        Ok(Quote {
            symbol: symbol.to_string(),
            last_price: ltp.last_price,
        })
    }

    async fn history(
        &self,
        symbol: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
        interval: &str,
    ) -> Result<Vec<Bar>, GatewayError> {
        Ok(self
            .client
            .historical(&self.exchange, symbol, from, to, interval)
            .await?)
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<String, OrderError> {
        match self.mode {
            ExecutionMode::Paper => Ok(self.paper.fill(order).await),
            ExecutionMode::Live => self
                .client
                .place_order(order)
                .await
                .map_err(KiteError::into_order_error),
        }
    }

    async fn list_open_positions(
        &self,
        product: ProductKind,
    ) -> Result<Vec<BrokerPosition>, GatewayError> {
        match self.mode {
            ExecutionMode::Paper => Ok(self.paper.open_positions(product).await),
            ExecutionMode::Live => Ok(self.client.open_positions(product).await?),
        }
    }
}
