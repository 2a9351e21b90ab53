//! Stop-loss and target exit rules.

use intraday_core::events::Direction;
use intraday_core::position::{ExitReason, Position};
use rust_decimal::Decimal;

/// Checks an open position against its stop/target band.
///
/// Target is checked first; a closed position never triggers.
pub fn evaluate(pos: &Position, price: Decimal) -> Option<ExitReason> {
    if !pos.is_open() {
        return None;
    }

    let (target_hit, stop_hit) = match pos.direction {
        Direction::Long => (price >= pos.target_price, price <= pos.stop_price),
        Direction::Short => (price <= pos.target_price, price >= pos.stop_price),
    };

    if target_hit {
        tracing::info!(
            symbol = pos.symbol,
            price = %price,
            target = %pos.target_price,
            "Target reached"
        );
        Some(ExitReason::Target)
    } else if stop_hit {
        tracing::warn!(
            symbol = pos.symbol,
            price = %price,
            stop = %pos.stop_price,
            "Stop-loss triggered"
        );
        Some(ExitReason::StopLoss)
    } else {
        None
    }
}

/// True when `price` touches either band of an open position.
pub fn should_close(pos: &Position, price: Decimal) -> bool {
    evaluate(pos, price).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use intraday_core::position::PositionStatus;
    use rust_decimal_macros::dec;

    fn make_position(direction: Direction, entry: Decimal) -> Position {
        let (stop_price, target_price) = Position::bracket(direction, entry, dec!(0.02), dec!(0.04));
        Position {
            symbol: "ABC".to_string(),
            exchange: "NSE".to_string(),
            direction,
            quantity: 1,
            entry_price: entry,
            stop_price,
            target_price,
            status: PositionStatus::Open,
            entry_order_id: "1".to_string(),
            opened_at: NaiveDate::from_ymd_opt(2025, 1, 6)
                .unwrap()
                .and_hms_opt(9, 15, 0)
                .unwrap(),
            exit_price: None,
            exit_order_id: None,
            exit_reason: None,
        }
    }

    #[test]
    fn long_closes_at_either_band() {
        let pos = make_position(Direction::Long, dec!(100));
        assert_eq!(pos.stop_price, dec!(98.0));
        assert_eq!(pos.target_price, dec!(104.0));
        assert!(should_close(&pos, dec!(104.0)));
        assert!(should_close(&pos, dec!(98.0)));
        assert!(!should_close(&pos, dec!(101.0)));
        assert_eq!(evaluate(&pos, dec!(110)), Some(ExitReason::Target));
        assert_eq!(evaluate(&pos, dec!(90)), Some(ExitReason::StopLoss));
    }

    #[test]
    fn short_bands_are_mirrored() {
        let pos = make_position(Direction::Short, dec!(100));
        assert_eq!(evaluate(&pos, dec!(96)), Some(ExitReason::Target));
        assert_eq!(evaluate(&pos, dec!(102)), Some(ExitReason::StopLoss));
        assert!(!should_close(&pos, dec!(99)));
        assert!(!should_close(&pos, dec!(101.99)));
    }

    #[test]
    fn closed_position_is_skipped() {
        let mut pos = make_position(Direction::Long, dec!(100));
        pos.status = PositionStatus::Closed;
        assert!(!should_close(&pos, dec!(150)));
        assert!(!should_close(&pos, dec!(50)));
    }
}
