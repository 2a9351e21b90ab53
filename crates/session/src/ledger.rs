//! Session position ledger: one entry per symbol per session, close on confirmed exit.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::{debug, info};

use intraday_core::config::SessionConfig;
use intraday_core::error::OrderError;
use intraday_core::events::{OrderRequest, ProductKind, Signal};
use intraday_core::position::{ExitReason, Position, PositionStatus};
use intraday_core::traits::Broker;

use crate::types::SessionSummary;

/// Owns every position opened this session.
///
/// A symbol is marked traded only after its entry order is accepted, so a
/// rejected entry stays eligible. Methods take `&mut self`; the scheduler is
/// the single writer.
#[derive(Debug)]
pub struct PositionLedger {
    exchange: String,
    product: ProductKind,
    quantity: u32,
    stop_loss_pct: Decimal,
    target_pct: Decimal,
    positions: BTreeMap<String, Position>,
    traded: HashSet<String>,
}

impl PositionLedger {
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            exchange: config.exchange.clone(),
            product: config.product,
            quantity: config.quantity,
            stop_loss_pct: config.stop_loss_pct,
            target_pct: config.target_pct,
            positions: BTreeMap::new(),
            traded: HashSet::new(),
        }
    }

    #[must_use]
    pub fn is_traded(&self, symbol: &str) -> bool {
        self.traded.contains(symbol)
    }

    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Symbols with an OPEN position, in symbol order.
    #[must_use]
    pub fn open_symbols(&self) -> Vec<String> {
        self.positions
            .values()
            .filter(|p| p.is_open())
            .map(|p| p.symbol.clone())
            .collect()
    }

    #[must_use]
    pub fn has_open(&self) -> bool {
        self.positions.values().any(Position::is_open)
    }

    /// Opens a position for a fired signal unless the symbol already traded today.
    ///
    /// Returns `Ok(None)` for `Signal::None` or an already-traded symbol; no order
    /// is submitted in either case.
    ///
    /// # Errors
    ///
    /// Returns the order error when submission fails. The symbol stays eligible.
    pub async fn open_if_eligible<B: Broker + ?Sized>(
        &mut self,
        broker: &B,
        symbol: &str,
        signal: Signal,
        price: Decimal,
        now: NaiveDateTime,
    ) -> Result<Option<Position>, OrderError> {
        let Some(direction) = signal.direction() else {
            return Ok(None);
        };
        if self.is_traded(symbol) {
            debug!(symbol, "Already traded this session, skipping entry");
            return Ok(None);
        }

        let (stop_price, target_price) =
            Position::bracket(direction, price, self.stop_loss_pct, self.target_pct);

        let order = OrderRequest::market(
            symbol,
            self.exchange.clone(),
            direction.entry_side(),
            self.quantity,
            self.product,
        );
        let order_id = broker.submit_order(&order).await?;

        let position = Position {
            symbol: symbol.to_string(),
            exchange: self.exchange.clone(),
            direction,
            quantity: self.quantity,
            entry_price: price,
            stop_price,
            target_price,
            status: PositionStatus::Open,
            entry_order_id: order_id,
            opened_at: now,
            exit_price: None,
            exit_order_id: None,
            exit_reason: None,
        };

        info!(
            symbol,
            direction = %direction,
            entry = %price,
            stop = %stop_price,
            target = %target_price,
            order_id = position.entry_order_id,
            "Position opened"
        );

        self.traded.insert(symbol.to_string());
        self.positions.insert(symbol.to_string(), position.clone());
        Ok(Some(position))
    }

    /// Submits the offsetting order for an open position and marks it closed.
    ///
    /// Unknown or already-closed symbols are a no-op (`Ok(None)`).
    ///
    /// # Errors
    ///
    /// Returns the order error when submission fails; the position stays OPEN.
    pub async fn close<B: Broker + ?Sized>(
        &mut self,
        broker: &B,
        symbol: &str,
        exit_price: Decimal,
        reason: ExitReason,
    ) -> Result<Option<Position>, OrderError> {
        let Some(pos) = self.positions.get_mut(symbol).filter(|p| p.is_open()) else {
            return Ok(None);
        };

        let order = OrderRequest::market(
            symbol,
            pos.exchange.clone(),
            pos.direction.exit_side(),
            pos.quantity,
            self.product,
        );
        let order_id = broker.submit_order(&order).await?;

        pos.status = PositionStatus::Closed;
        pos.exit_price = Some(exit_price);
        pos.exit_order_id = Some(order_id);
        pos.exit_reason = Some(reason);

        info!(
            symbol,
            exit = %exit_price,
            reason = %reason,
            pnl = ?pos.realized_pnl(),
            "Position closed"
        );
        Ok(Some(pos.clone()))
    }

    /// Marks open positions as closed by the broker-side square-off.
    ///
    /// Symbols in `still_held` stay OPEN. Returns the symbols marked.
    pub fn mark_flattened(&mut self, still_held: &HashSet<String>) -> Vec<String> {
        let mut marked = Vec::new();
        for pos in self.positions.values_mut() {
            if pos.is_open() && !still_held.contains(&pos.symbol) {
                pos.status = PositionStatus::Closed;
                pos.exit_reason = Some(ExitReason::SquareOff);
                marked.push(pos.symbol.clone());
            }
        }
        marked
    }

    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary::from_positions(self.positions.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use intraday_core::error::GatewayError;
    use intraday_core::events::{Bar, BrokerPosition, Direction, Quote, Side};
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    /// Records orders; fails the next `fail_next` submissions.
    #[derive(Default)]
    struct OrderLog {
        orders: Mutex<Vec<OrderRequest>>,
        fail_next: Mutex<u32>,
    }

    impl OrderLog {
        fn failing(times: u32) -> Self {
            Self {
                orders: Mutex::default(),
                fail_next: Mutex::new(times),
            }
        }

        fn orders(&self) -> Vec<OrderRequest> {
            self.orders.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Broker for OrderLog {
        async fn quote(&self, symbol: &str) -> Result<Quote, GatewayError> {
            Err(GatewayError::UnknownSymbol(symbol.to_string()))
        }

        async fn history(
            &self,
            _symbol: &str,
            _from: NaiveDateTime,
            _to: NaiveDateTime,
            _interval: &str,
        ) -> Result<Vec<Bar>, GatewayError> {
            Ok(vec![])
        }

        async fn submit_order(&self, order: &OrderRequest) -> Result<String, OrderError> {
            let mut fail = self.fail_next.lock().unwrap();
            if *fail > 0 {
                *fail -= 1;
                return Err(OrderError::InsufficientMargin("margin".to_string()));
            }
            let mut orders = self.orders.lock().unwrap();
            orders.push(order.clone());
            Ok(format!("ORD-{}", orders.len()))
        }

        async fn list_open_positions(
            &self,
            _product: ProductKind,
        ) -> Result<Vec<BrokerPosition>, GatewayError> {
            Ok(vec![])
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 6)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap()
    }

    fn ledger() -> PositionLedger {
        PositionLedger::new(&SessionConfig::default())
    }

    #[tokio::test]
    async fn opens_long_with_bracket_and_buy_order() {
        let broker = OrderLog::default();
        let mut ledger = ledger();

        let pos = ledger
            .open_if_eligible(&broker, "ABC", Signal::EnterLong, dec!(100), now())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(pos.direction, Direction::Long);
        assert_eq!(pos.stop_price, dec!(98.0));
        assert_eq!(pos.target_price, dec!(104.0));
        assert_eq!(pos.status, PositionStatus::Open);
        assert_eq!(pos.entry_order_id, "ORD-1");

        let orders = broker.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].side, Side::Buy);
        assert_eq!(orders[0].product, ProductKind::Mis);
        assert_eq!(orders[0].exchange, "NSE");
        assert!(ledger.is_traded("ABC"));
    }

    #[tokio::test]
    async fn second_entry_same_session_is_noop() {
        let broker = OrderLog::default();
        let mut ledger = ledger();

        let first = ledger
            .open_if_eligible(&broker, "ABC", Signal::EnterLong, dec!(100), now())
            .await
            .unwrap();
        let second = ledger
            .open_if_eligible(&broker, "ABC", Signal::EnterShort, dec!(90), now())
            .await
            .unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(broker.orders().len(), 1);
        assert_eq!(ledger.positions().count(), 1);
        assert_eq!(ledger.get("ABC").unwrap().direction, Direction::Long);
    }

    #[tokio::test]
    async fn no_signal_submits_nothing() {
        let broker = OrderLog::default();
        let mut ledger = ledger();

        let result = ledger
            .open_if_eligible(&broker, "ABC", Signal::None, dec!(100), now())
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(broker.orders().is_empty());
        assert!(!ledger.is_traded("ABC"));
    }

    #[tokio::test]
    async fn failed_entry_leaves_symbol_eligible() {
        let broker = OrderLog::failing(1);
        let mut ledger = ledger();

        let err = ledger
            .open_if_eligible(&broker, "ABC", Signal::EnterShort, dec!(100), now())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InsufficientMargin(_)));
        assert!(!ledger.is_traded("ABC"));
        assert!(ledger.get("ABC").is_none());

        let retried = ledger
            .open_if_eligible(&broker, "ABC", Signal::EnterShort, dec!(100), now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(retried.stop_price, dec!(102));
        assert_eq!(broker.orders().len(), 1);
        assert_eq!(broker.orders()[0].side, Side::Sell);
    }

    #[tokio::test]
    async fn close_submits_offsetting_order_once() {
        let broker = OrderLog::default();
        let mut ledger = ledger();
        ledger
            .open_if_eligible(&broker, "ABC", Signal::EnterLong, dec!(100), now())
            .await
            .unwrap();

        let closed = ledger
            .close(&broker, "ABC", dec!(105), ExitReason::Target)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(closed.status, PositionStatus::Closed);
        assert_eq!(closed.exit_order_id.as_deref(), Some("ORD-2"));
        assert_eq!(closed.realized_pnl(), Some(dec!(5)));

        let again = ledger
            .close(&broker, "ABC", dec!(106), ExitReason::Target)
            .await
            .unwrap();
        assert!(again.is_none());

        let orders = broker.orders();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[1].side, Side::Sell);
        assert!(!ledger.has_open());
    }

    #[tokio::test]
    async fn failed_close_keeps_position_open() {
        let broker = OrderLog::default();
        let mut ledger = ledger();
        ledger
            .open_if_eligible(&broker, "ABC", Signal::EnterLong, dec!(100), now())
            .await
            .unwrap();
        *broker.fail_next.lock().unwrap() = 1;

        let result = ledger
            .close(&broker, "ABC", dec!(97), ExitReason::StopLoss)
            .await;
        assert!(result.is_err());
        assert!(ledger.get("ABC").unwrap().is_open());
        assert_eq!(ledger.open_symbols(), vec!["ABC".to_string()]);

        ledger
            .close(&broker, "ABC", dec!(97), ExitReason::StopLoss)
            .await
            .unwrap();
        assert!(!ledger.has_open());
    }

    #[tokio::test]
    async fn close_unknown_symbol_is_noop() {
        let broker = OrderLog::default();
        let mut ledger = ledger();
        let result = ledger
            .close(&broker, "XYZ", dec!(10), ExitReason::Target)
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(broker.orders().is_empty());
    }

    #[tokio::test]
    async fn mark_flattened_skips_symbols_still_held() {
        let broker = OrderLog::default();
        let mut ledger = ledger();
        for symbol in ["AAA", "BBB"] {
            ledger
                .open_if_eligible(&broker, symbol, Signal::EnterLong, dec!(100), now())
                .await
                .unwrap();
        }

        let held: HashSet<String> = ["BBB".to_string()].into_iter().collect();
        let marked = ledger.mark_flattened(&held);

        assert_eq!(marked, vec!["AAA".to_string()]);
        assert_eq!(ledger.open_symbols(), vec!["BBB".to_string()]);
        let summary = ledger.summary();
        assert_eq!(summary.opened, 2);
        assert_eq!(summary.closed_square_off, 1);
        assert_eq!(summary.still_open, 1);
    }
}
