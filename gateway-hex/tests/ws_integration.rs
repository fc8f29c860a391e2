//! End-to-end tests for the websocket surface against a live listener.

mod common;

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use common::{ScriptedProcessor, server};

type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

async fn next_event(ws: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn send(ws: &mut Client, value: Value) {
    ws.send(Message::Text(value.to_string())).await.unwrap();
}

#[tokio::test]
async fn test_subscribe_then_receive_payment_update() {
    let (server, _) = server(ScriptedProcessor::default().respond(json!({
        "id": "pay-2",
        "status": "PENDING"
    })));
    let bus = server.bus().clone();
    let app = server.router();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let (mut ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();

    // Garbage does not close the connection
    ws.send(Message::Text("not json".into())).await.unwrap();
    let error = next_event(&mut ws).await;
    assert_eq!(error["event"], "error");
    assert_eq!(error["data"]["status"], "error");

    send(&mut ws, json!({"event": "subscribe_payment", "data": {"payment_id": ""}})).await;
    let rejected = next_event(&mut ws).await;
    assert_eq!(
        rejected,
        json!({
            "event": "payment_subscribed",
            "data": {"status": "error", "message": "payment_id is required"}
        })
    );

    send(&mut ws, json!({"event": "subscribe_payment", "data": {"payment_id": "pay-2"}})).await;
    let ack = next_event(&mut ws).await;
    assert_eq!(ack["event"], "payment_subscribed");
    assert_eq!(ack["data"]["status"], "success");
    assert_eq!(ack["data"]["payment_id"], "pay-2");

    let response = reqwest::Client::new()
        .post(format!("http://{}/payments", addr))
        .json(&json!({
            "reference_id": "ref-2",
            "amount": 10000,
            "currency": "IDR",
            "payment_method_id": "pm-1"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let update = next_event(&mut ws).await;
    assert_eq!(update["event"], "payment_update");
    assert_eq!(update["data"]["payment_id"], "pay-2");
    assert_eq!(update["data"]["status"], "PENDING");

    ws.close(None).await.unwrap();

    // The session unregisters once the socket is gone
    let mut remaining = bus.registry().connection_count();
    for _ in 0..50 {
        if remaining == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        remaining = bus.registry().connection_count();
    }
    assert_eq!(remaining, 0);
    assert_eq!(bus.registry().topic_count(), 0);
}
