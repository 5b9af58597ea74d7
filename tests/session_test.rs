//! WebSocket session integration tests
//!
//! Drives a bound server end to end with a real client connection.

use chrono::{TimeZone, Utc};
use futures_util::{SinkExt, StreamExt};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tickshift::config::SessionConfig;
use tickshift::replay::{Bar, HistoricalData, ReplaySource};
use tickshift::server::protocol::ServerMessage;
use tickshift::server::ReplayServer;
use tickshift::store::MemoryTradeStore;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type WsClient = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

fn fast_session_config() -> SessionConfig {
    SessionConfig {
        base_interval_ms: 10,
        ..SessionConfig::default()
    }
}

async fn spawn_server(source: ReplaySource) -> (WsClient, MemoryTradeStore) {
    let store = MemoryTradeStore::new();
    let server = ReplayServer::bind(
        "127.0.0.1:0",
        source,
        Arc::new(store.clone()),
        fast_session_config(),
    )
    .await
    .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());

    let (ws, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
    (ws, store)
}

async fn next_message(ws: &mut WsClient) -> ServerMessage {
    let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("timed out waiting for server message")
        .expect("stream ended")
        .unwrap();

    match frame {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected text frame, got {:?}", other),
    }
}

#[tokio::test]
async fn test_start_streams_batches_over_websocket() {
    let (mut ws, _) = spawn_server(ReplaySource::synthetic("DEMO", 60)).await;

    ws.send(Message::Text(
        r#"{"command": "START", "speed": 100}"#.into(),
    ))
    .await
    .unwrap();

    match next_message(&mut ws).await {
        ServerMessage::Batch(ticks) => {
            assert_eq!(ticks.len(), 10);
            assert_eq!(ticks[0].symbol, "DEMO");
            assert_eq!(ticks[0].price, dec!(21500.00));
        }
        other => panic!("expected batch, got {:?}", other),
    }

    // Batches keep flowing
    assert!(matches!(
        next_message(&mut ws).await,
        ServerMessage::Batch(_)
    ));

    ws.close(None).await.unwrap();
}

#[tokio::test]
async fn test_unknown_date_yields_error_then_recovers() {
    let bars = vec![Bar {
        open: dec!(100),
        high: dec!(105),
        low: dec!(95),
        close: dec!(102),
        timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 9, 15, 0).unwrap(),
    }];
    let data = HistoricalData::from_bars("NIFTY 50", bars);
    let (mut ws, _) = spawn_server(ReplaySource::historical(Arc::new(data))).await;

    ws.send(Message::Text(
        r#"{"command": "START", "date": "2030-06-01", "speed": 100}"#.into(),
    ))
    .await
    .unwrap();

    match next_message(&mut ws).await {
        ServerMessage::Error { message } => assert!(message.contains("2030-06-01")),
        other => panic!("expected error, got {:?}", other),
    }

    // The session stayed alive; a valid START begins streaming
    ws.send(Message::Text(r#"{"command": "START", "speed": 100}"#.into()))
        .await
        .unwrap();

    match next_message(&mut ws).await {
        ServerMessage::Batch(ticks) => assert_eq!(ticks[0].price, dec!(100.00)),
        other => panic!("expected batch, got {:?}", other),
    }

    ws.close(None).await.unwrap();
}

#[tokio::test]
async fn test_buy_sell_round_trip_reaches_store() {
    let (mut ws, store) = spawn_server(ReplaySource::synthetic("DEMO", 60)).await;

    ws.send(Message::Text(
        r#"{"command": "START", "speed": 100}"#.into(),
    ))
    .await
    .unwrap();

    // Wait for a price to be streamed before trading
    assert!(matches!(
        next_message(&mut ws).await,
        ServerMessage::Batch(_)
    ));

    ws.send(Message::Text(r#"{"command": "BUY", "quantity": 10}"#.into()))
        .await
        .unwrap();
    ws.send(Message::Text(r#"{"command": "SELL", "quantity": 10}"#.into()))
        .await
        .unwrap();

    // The close is applied between batches; poll the store until it lands
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if store.len().await == 1 {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "trade never reached the store"
        );
        // Keep draining frames so the session is not backpressured
        let _ = next_message(&mut ws).await;
    }

    let trades = store.trades().await;
    assert_eq!(trades[0].symbol, "DEMO");
    assert_eq!(trades[0].quantity, 10);
    assert_eq!(trades[0].trade_seq, 1);

    ws.close(None).await.unwrap();
}
