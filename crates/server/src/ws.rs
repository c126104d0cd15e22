use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use shared::protocol::UiEvent;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{app_state::AppState, bridge::InboundEvent};

const CLIENT_QUEUE_CAPACITY: usize = 256;

pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: Arc<AppState>, socket: WebSocket) {
    let conn = state.next_connection_id();
    let (mut sender, mut receiver) = socket.split();
    let (outbound, mut outbound_rx) = mpsc::channel::<UiEvent>(CLIENT_QUEUE_CAPACITY);

    if state
        .events
        .send(InboundEvent::Connected { conn, outbound })
        .await
        .is_err()
    {
        return;
    }

    let send_task = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<UiEvent>(&text) {
                Ok(event) => {
                    if state
                        .events
                        .send(InboundEvent::Ui { conn, event })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(error) => warn!(conn, %error, "dropping malformed ui frame"),
            },
            Message::Close(_) => break,
            other => debug!(conn, ?other, "ignoring non-text ui frame"),
        }
    }

    let _ = state.events.send(InboundEvent::Disconnected { conn }).await;
    send_task.abort();
}
