//! Websocket transport for the real-time surface.
//!
//! Each socket owns one `Connection`. A writer task drains the connection's
//! outbox in order; the reader feeds text frames to the bus. When either side
//! stops, the connection is dropped and unregistered.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};

use gateway_types::PaymentProcessor;

use super::handlers::AppState;
use crate::notify::{Connection, NotificationBus};

pub async fn ws_handler<P: PaymentProcessor>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState<P>>>,
) -> Response {
    let bus = Arc::clone(&state.bus);
    ws.on_upgrade(move |socket| session(socket, bus))
}

#[tracing::instrument(skip_all, fields(connection_id = tracing::field::Empty))]
async fn session(socket: WebSocket, bus: Arc<NotificationBus>) {
    let (connection, mut outbox) = Connection::open();
    let connection_id = connection.id();
    tracing::Span::current().record("connection_id", tracing::field::display(connection_id));

    bus.connect(&connection);
    tracing::info!("Websocket connection established");

    let (mut sink, mut stream) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(message) = outbox.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(event = %message.event, error = %e, "Failed to serialize message");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_bus = Arc::clone(&bus);
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(frame)) = stream.next().await {
            match frame {
                Message::Text(text) => recv_bus.handle_client_message(&connection, text.as_str()),
                Message::Close(_) => break,
                Message::Binary(_) => tracing::debug!("Ignoring binary frame"),
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    bus.disconnect(connection_id);
    tracing::info!("Websocket connection closed");
}
