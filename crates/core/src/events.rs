use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A closed price bar. Timestamps are exchange-local wall time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub close: Decimal,
}

impl Bar {
    #[must_use]
    pub const fn new(timestamp: NaiveDateTime, close: Decimal) -> Self {
        Self { timestamp, close }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub last_price: Decimal,
}

/// Entry signal produced by a crossover evaluation. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    None,
    EnterLong,
    EnterShort,
}

impl Signal {
    /// Direction of the position this signal would open.
    #[must_use]
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::None => None,
            Self::EnterLong => Some(Direction::Long),
            Self::EnterShort => Some(Direction::Short),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Order side that opens a position in this direction.
    #[must_use]
    pub const fn entry_side(self) -> Side {
        match self {
            Self::Long => Side::Buy,
            Self::Short => Side::Sell,
        }
    }

    /// Order side that offsets a position in this direction.
    #[must_use]
    pub const fn exit_side(self) -> Side {
        match self {
            Self::Long => Side::Sell,
            Self::Short => Side::Buy,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderKind {
    Market,
}

impl OrderKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Market => "MARKET",
        }
    }
}

/// Broker product type a position is carried under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProductKind {
    /// Intraday margin product; auto-squared-off by the broker at day end.
    Mis,
    /// Cash and carry (delivery).
    Cnc,
    /// Normal F&O margin.
    Nrml,
}

impl ProductKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mis => "MIS",
            Self::Cnc => "CNC",
            Self::Nrml => "NRML",
        }
    }
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub exchange: String,
    pub side: Side,
    pub quantity: u32,
    pub kind: OrderKind,
    pub product: ProductKind,
}

impl OrderRequest {
    /// Creates a market order, the only kind the session submits.
    #[must_use]
    pub fn market(
        symbol: impl Into<String>,
        exchange: impl Into<String>,
        side: Side,
        quantity: u32,
        product: ProductKind,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            exchange: exchange.into(),
            side,
            quantity,
            kind: OrderKind::Market,
            product,
        }
    }
}

/// A net position as reported by the brokerage. Positive quantity is long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerPosition {
    pub symbol: String,
    pub exchange: String,
    pub quantity: i64,
}

impl BrokerPosition {
    /// Order side that flattens this position, or `None` when already flat.
    #[must_use]
    pub const fn offset_side(&self) -> Option<Side> {
        match self.quantity {
            0 => None,
            q if q > 0 => Some(Side::Sell),
            _ => Some(Side::Buy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_maps_to_direction() {
        assert_eq!(Signal::None.direction(), None);
        assert_eq!(Signal::EnterLong.direction(), Some(Direction::Long));
        assert_eq!(Signal::EnterShort.direction(), Some(Direction::Short));
    }

    #[test]
    fn exit_side_inverts_entry_side() {
        assert_eq!(Direction::Long.entry_side(), Side::Buy);
        assert_eq!(Direction::Long.exit_side(), Side::Sell);
        assert_eq!(Direction::Short.entry_side(), Side::Sell);
        assert_eq!(Direction::Short.exit_side(), Side::Buy);
    }

    #[test]
    fn broker_position_offset_side() {
        let mut pos = BrokerPosition {
            symbol: "INFY".to_string(),
            exchange: "NSE".to_string(),
            quantity: 3,
        };
        assert_eq!(pos.offset_side(), Some(Side::Sell));
        pos.quantity = -2;
        assert_eq!(pos.offset_side(), Some(Side::Buy));
        pos.quantity = 0;
        assert_eq!(pos.offset_side(), None);
    }

    #[test]
    fn product_kind_serializes_uppercase() {
        let json = serde_json::to_string(&ProductKind::Mis).unwrap();
        assert_eq!(json, "\"MIS\"");
    }
}
