use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use raidlog_application::AppState;

use crate::error::HttpError;
use crate::middleware::authorize;

/// Streams every broadcast line as a JSON text frame until the client goes away.
pub async fn broadcast_stream(
    State(state): State<AppState>,
    headers: HeaderMap,
    upgrade: WebSocketUpgrade,
) -> Result<Response, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    Ok(upgrade.on_upgrade(move |socket| forward_broadcasts(state, socket)))
}

async fn forward_broadcasts(state: AppState, socket: WebSocket) {
    let mut receiver = state.broadcast_hub.subscribe();
    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            message = receiver.recv() => match message {
                Ok(message) => {
                    let Ok(text) = serde_json::to_string(&message) else {
                        continue;
                    };
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "broadcast subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }
    debug!("broadcast stream closed");
}
