//! `KiteBroker` in live mode against a mock Kite REST server.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal_macros::dec;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use intraday_core::config::{ExecutionMode, KiteConfig};
use intraday_core::error::{GatewayError, OrderError};
use intraday_core::events::{OrderRequest, ProductKind, Side};
use intraday_core::traits::Broker;
use intraday_kite::KiteBroker;

fn live_broker(server: &MockServer) -> KiteBroker {
    let config = KiteConfig {
        api_url: server.uri(),
        api_key: "key".to_string(),
        access_token: "secret".to_string(),
        mode: ExecutionMode::Live,
    };
    KiteBroker::new(&config, "NSE").unwrap()
}

fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 6)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn ltp_body(price: f64) -> serde_json::Value {
    serde_json::json!({
        "status": "success",
        "data": {"NSE:INFY": {"instrument_token": 408065, "last_price": price}}
    })
}

#[tokio::test]
async fn quote_sends_kite_auth_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote/ltp"))
        .and(query_param("i", "NSE:INFY"))
        .and(header("Authorization", "token key:secret"))
        .and(header("X-Kite-Version", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ltp_body(1523.35)))
        .mount(&server)
        .await;

    let quote = live_broker(&server).quote("INFY").await.unwrap();

    assert_eq!(quote.symbol, "INFY");
    assert_eq!(quote.last_price, dec!(1523.35));
}

#[tokio::test]
async fn history_resolves_token_once_and_parses_candles() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote/ltp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ltp_body(1520.0)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/instruments/historical/408065/5minute"))
        .and(query_param("from", "2025-01-01 09:15:00"))
        .and(query_param("to", "2025-01-06 09:15:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "data": {"candles": [
                ["2025-01-03T15:20:00+0530", 1510.0, 1512.5, 1509.0, 1511.2, 1200],
                ["2025-01-03T15:25:00+0530", 1511.2, 1515.0, 1511.0, 1514.9, 900]
            ]}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let broker = live_broker(&server);
    let from = at(9, 15) - chrono::Duration::days(5);
    let bars = broker.history("INFY", from, at(9, 15), "5minute").await.unwrap();
    broker.history("INFY", from, at(9, 15), "5minute").await.unwrap();

    assert_eq!(bars.len(), 2);
    assert_eq!(bars[1].close, dec!(1514.9));
    assert_eq!(
        bars[0].timestamp,
        NaiveDate::from_ymd_opt(2025, 1, 3)
            .unwrap()
            .and_hms_opt(15, 20, 0)
            .unwrap()
    );
}

#[tokio::test]
async fn expired_token_is_an_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote/ltp"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "status": "error",
            "message": "Incorrect `api_key` or `access_token`.",
            "data": null,
            "error_type": "TokenException"
        })))
        .mount(&server)
        .await;

    let err = live_broker(&server).quote("INFY").await.unwrap_err();

    assert!(matches!(err, GatewayError::Auth(_)));
}

#[tokio::test]
async fn live_order_posts_market_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders/regular"))
        .and(body_string_contains("tradingsymbol=INFY"))
        .and(body_string_contains("transaction_type=BUY"))
        .and(body_string_contains("order_type=MARKET"))
        .and(body_string_contains("product=MIS"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "data": {"order_id": "250106000123456"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let order = OrderRequest::market("INFY", "NSE", Side::Buy, 1, ProductKind::Mis);
    let order_id = live_broker(&server).submit_order(&order).await.unwrap();

    assert_eq!(order_id, "250106000123456");
}

#[tokio::test]
async fn margin_shortfall_is_an_order_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders/regular"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "status": "error",
            "message": "Insufficient funds. Required margin is 1523.35 but available margin is 12.00.",
            "data": null,
            "error_type": "MarginException"
        })))
        .mount(&server)
        .await;

    let order = OrderRequest::market("INFY", "NSE", Side::Sell, 1, ProductKind::Mis);
    let err = live_broker(&server).submit_order(&order).await.unwrap_err();

    assert!(matches!(err, OrderError::InsufficientMargin(_)));
}

#[tokio::test]
async fn lists_only_open_positions_under_the_product() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/portfolio/positions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "data": {
                "net": [
                    {"tradingsymbol": "INFY", "exchange": "NSE", "product": "MIS", "quantity": -1},
                    {"tradingsymbol": "TCS", "exchange": "NSE", "product": "MIS", "quantity": 0},
                    {"tradingsymbol": "LT", "exchange": "NSE", "product": "CNC", "quantity": 4}
                ],
                "day": []
            }
        })))
        .mount(&server)
        .await;

    let open = live_broker(&server)
        .list_open_positions(ProductKind::Mis)
        .await
        .unwrap();

    assert_eq!(open.len(), 1);
    assert_eq!((open[0].symbol.as_str(), open[0].quantity), ("INFY", -1));
}
