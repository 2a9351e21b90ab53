//! Paper trading book.
//!
//! Fills every order immediately against a local net-position book so the
//! session's square-off sees the same positions it would see live. Prices are
//! not tracked; the session records its own entry and exit prices.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::info;

use intraday_core::events::{BrokerPosition, OrderRequest, ProductKind, Side};

type BookKey = (String, String, ProductKind);

#[derive(Debug, Default)]
pub struct PaperBook {
    next_id: AtomicU64,
    /// (exchange, symbol, product) to signed net quantity.
    net: Mutex<BTreeMap<BookKey, i64>>,
}

impl PaperBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates an immediate fill and returns a synthetic `PAPER-n` order id.
    pub async fn fill(&self, order: &OrderRequest) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let order_id = format!("PAPER-{id}");

        let signed = match order.side {
            Side::Buy => i64::from(order.quantity),
            Side::Sell => -i64::from(order.quantity),
        };
        let key = (order.exchange.clone(), order.symbol.clone(), order.product);
        let mut net = self.net.lock().await;
        let position = net.entry(key).or_default();
        *position += signed;

        info!(
            order_id,
            symbol = order.symbol,
            side = %order.side,
            quantity = order.quantity,
            net = *position,
            "Paper fill simulated"
        );
        order_id
    }

    /// Non-zero net positions under `product`.
    pub async fn open_positions(&self, product: ProductKind) -> Vec<BrokerPosition> {
        self.net
            .lock()
            .await
            .iter()
            .filter(|((_, _, p), qty)| *p == product && **qty != 0)
            .map(|((exchange, symbol, _), qty)| BrokerPosition {
                symbol: symbol.clone(),
                exchange: exchange.clone(),
                quantity: *qty,
            })
            .collect()
    }
}
