use crate::error::{GatewayError, OrderError};
use crate::events::{Bar, BrokerPosition, OrderRequest, ProductKind, Quote};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Arc;

/// Market-data and order gateway consumed by the session.
///
/// Implementations do not dedupe orders; the ledger guards against double entry.
#[async_trait]
pub trait Broker: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<Quote, GatewayError>;

    /// Bars between `from` and `to` (exchange-local). May return fewer bars
    /// than the window holds; only transport failures are errors.
    async fn history(
        &self,
        symbol: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
        interval: &str,
    ) -> Result<Vec<Bar>, GatewayError>;

    /// Submits an order and returns the broker's order id.
    async fn submit_order(&self, order: &OrderRequest) -> Result<String, OrderError>;

    async fn list_open_positions(
        &self,
        product: ProductKind,
    ) -> Result<Vec<BrokerPosition>, GatewayError>;
}

/// Best-effort alert channel. Callers log and drop failures.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> anyhow::Result<()>;
}

#[async_trait]
impl<B: Broker + ?Sized> Broker for Arc<B> {
    async fn quote(&self, symbol: &str) -> Result<Quote, GatewayError> {
        (**self).quote(symbol).await
    }

    async fn history(
        &self,
        symbol: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
        interval: &str,
    ) -> Result<Vec<Bar>, GatewayError> {
        (**self).history(symbol, from, to, interval).await
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<String, OrderError> {
        (**self).submit_order(order).await
    }

    async fn list_open_positions(
        &self,
        product: ProductKind,
    ) -> Result<Vec<BrokerPosition>, GatewayError> {
        (**self).list_open_positions(product).await
    }
}

#[async_trait]
impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    async fn send(&self, text: &str) -> anyhow::Result<()> {
        (**self).send(text).await
    }
}
