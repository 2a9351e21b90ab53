//! Order placement.

use tracing::info;

use intraday_core::events::OrderRequest;

use crate::client::KiteClient;
use crate::error::KiteError;
use crate::types::OrderResponse;

/// Only plain exchange orders are placed; no AMO/cover/iceberg.
const VARIETY: &str = "regular";

/// Form fields for `POST /orders/regular`.
pub(crate) fn order_form(order: &OrderRequest) -> Vec<(&'static str, String)> {
    vec![
        ("tradingsymbol", order.symbol.clone()),
        ("exchange", order.exchange.clone()),
        ("transaction_type", order.side.as_str().to_string()),
        ("order_type", order.kind.as_str().to_string()),
        ("quantity", order.quantity.to_string()),
        ("product", order.product.as_str().to_string()),
        ("validity", "DAY".to_string()),
    ]
}

impl KiteClient {
    /// Places a market order and returns Kite's order id.
    ///
    /// Acceptance means the order reached the exchange book, not that it filled.
    ///
    /// # Errors
    /// Returns the Kite error envelope on rejection.
    pub async fn place_order(&self, order: &OrderRequest) -> Result<String, KiteError> {
        info!(
            symbol = order.symbol,
            exchange = order.exchange,
            side = %order.side,
            quantity = order.quantity,
            product = %order.product,
            "Placing order"
        );

        let response: OrderResponse = self
            .post_form(&format!("/orders/{VARIETY}"), &order_form(order))
            .await?;

        info!(symbol = order.symbol, order_id = response.order_id, "Order placed");
        Ok(response.order_id)
    }
}
