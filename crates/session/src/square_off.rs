//! Forced end-of-session square-off of every brokerage position under the
//! managed product, whether or not this session opened it.

use std::collections::HashSet;

use tracing::{error, info, warn};

use intraday_core::error::{GatewayError, OrderError};
use intraday_core::events::{BrokerPosition, OrderRequest, ProductKind};
use intraday_core::traits::Broker;

/// Attempts before the session gives up on residual positions.
pub const MAX_SQUARE_OFF_ATTEMPTS: u32 = 3;

/// Outcome of one flatten pass.
#[derive(Debug, Default)]
pub struct SquareOffReport {
    /// Positions that received an offsetting order, with its order id.
    pub flattened: Vec<(BrokerPosition, String)>,
    pub failed: Vec<(BrokerPosition, OrderError)>,
}

impl SquareOffReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Symbols whose offsetting order failed and are still held.
    #[must_use]
    pub fn still_held(&self) -> HashSet<String> {
        self.failed.iter().map(|(p, _)| p.symbol.clone()).collect()
    }
}

/// Flattens brokerage positions, remembering which ones already got an order
/// so a retry pass never offsets the same position twice.
#[derive(Debug)]
pub struct SquareOff {
    product: ProductKind,
    offset: HashSet<(String, String)>,
    attempts: u32,
}

impl SquareOff {
    #[must_use]
    pub fn new(product: ProductKind) -> Self {
        Self {
            product,
            offset: HashSet::new(),
            attempts: 0,
        }
    }

    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub const fn exhausted(&self) -> bool {
        self.attempts >= MAX_SQUARE_OFF_ATTEMPTS
    }

    /// Lists open positions and submits one offsetting market order per
    /// non-zero position not already offset.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if positions cannot be listed; nothing was submitted.
    pub async fn flatten_all<B: Broker + ?Sized>(
        &mut self,
        broker: &B,
    ) -> Result<SquareOffReport, GatewayError> {
        self.attempts += 1;
        let positions = broker.list_open_positions(self.product).await?;
        let mut report = SquareOffReport::default();

        for pos in positions {
            let Some(side) = pos.offset_side() else {
                continue;
            };
            let key = (pos.exchange.clone(), pos.symbol.clone());
            if self.offset.contains(&key) {
                warn!(
                    symbol = pos.symbol,
                    quantity = pos.quantity,
                    "Position still reported after offset order, not resubmitting"
                );
                continue;
            }

            let Ok(quantity) = u32::try_from(pos.quantity.unsigned_abs()) else {
                error!(symbol = pos.symbol, quantity = pos.quantity, "Quantity out of range");
                report
                    .failed
                    .push((pos, OrderError::rejected("quantity out of range")));
                continue;
            };

            let order = OrderRequest::market(
                pos.symbol.clone(),
                pos.exchange.clone(),
                side,
                quantity,
                self.product,
            );
            match broker.submit_order(&order).await {
                Ok(order_id) => {
                    info!(
                        symbol = pos.symbol,
                        exchange = pos.exchange,
                        side = %side,
                        quantity,
                        order_id,
                        "Square-off order placed"
                    );
                    self.offset.insert(key);
                    report.flattened.push((pos, order_id));
                }
                Err(e) => {
                    error!(symbol = pos.symbol, error = %e, "Square-off order failed");
                    report.failed.push((pos, e));
                }
            }
        }

        Ok(report)
    }
}
