//! # Push Channels
//!
//! WebSocket and SSE feeds of [`AssistantEvent`]s.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use futures::{
    stream::{self, Stream},
    SinkExt, StreamExt,
};
use omnicart_core::swarm::AssistantEvent;
use std::{convert::Infallible, time::Duration};
use tokio::sync::broadcast::error::RecvError;
use tokio_stream::wrappers::BroadcastStream;

use super::SharedState;

const HEARTBEAT: Duration = Duration::from_secs(15);

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// One JSON text frame per event until the client goes away
async fn handle_socket(socket: WebSocket, state: SharedState) {
    tracing::info!("Client connected");
    let (mut sender, mut receiver) = socket.split();
    let mut events = BroadcastStream::new(state.session.subscribe());

    let mut send_task = tokio::spawn(async move {
        while let Some(item) = events.next().await {
            let event = match item {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("WebSocket client lagged: {}", e);
                    continue;
                }
            };
            let Some(frame) = ws_frame(&event) else {
                continue;
            };
            if sender.send(frame).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    tracing::info!("Client disconnected");
}

/// `{"event": name, "data": payload}` as a text frame
fn ws_frame(event: &AssistantEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            tracing::warn!("Failed to encode event: {}", e);
            None
        }
    }
}

fn sse_event(event: &AssistantEvent) -> Event {
    let data = serde_json::to_string(&event.data()).unwrap_or_default();
    Event::default().event(event.name()).data(data)
}

/// SSE endpoint for real-time events with heartbeat
pub async fn events(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.session.subscribe();

    let stream = stream::unfold(rx, |mut rx| async move {
        loop {
            match tokio::time::timeout(HEARTBEAT, rx.recv()).await {
                Ok(Ok(event)) => return Some((Ok(sse_event(&event)), rx)),
                Ok(Err(RecvError::Lagged(skipped))) => {
                    tracing::warn!(skipped, "SSE client lagged");
                }
                Ok(Err(RecvError::Closed)) => return None,
                Err(_) => return Some((Ok(Event::default().comment("heartbeat")), rx)),
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
