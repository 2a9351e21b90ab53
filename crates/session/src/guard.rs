//! Hard timeout around every broker call.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use intraday_core::error::{GatewayError, OrderError};
use intraday_core::events::{Bar, BrokerPosition, OrderRequest, ProductKind, Quote};
use intraday_core::traits::Broker;

/// Wraps a broker so no call can stall the session loop past `timeout`.
pub struct TimeoutBroker<B> {
    inner: B,
    timeout: Duration,
}

impl<B: Broker> TimeoutBroker<B> {
    #[must_use]
    pub const fn new(inner: B, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T, E, F>(&self, operation: &'static str, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>> + Send,
        E: From<GatewayError>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, timeout_secs = self.timeout.as_secs(), "Broker call timed out");
                Err(GatewayError::timeout(operation, self.timeout).into())
            }
        }
    }
}

#[async_trait]
impl<B: Broker> Broker for TimeoutBroker<B> {
    async fn quote(&self, symbol: &str) -> Result<Quote, GatewayError> {
        self.bounded("quote", self.inner.quote(symbol)).await
    }

    async fn history(
        &self,
        symbol: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
        interval: &str,
    ) -> Result<Vec<Bar>, GatewayError> {
        self.bounded("history", self.inner.history(symbol, from, to, interval))
            .await
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<String, OrderError> {
        self.bounded("submit_order", self.inner.submit_order(order))
            .await
    }

    async fn list_open_positions(
        &self,
        product: ProductKind,
    ) -> Result<Vec<BrokerPosition>, GatewayError> {
        self.bounded("list_open_positions", self.inner.list_open_positions(product))
            .await
    }
}
