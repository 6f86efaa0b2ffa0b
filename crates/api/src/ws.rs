use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use crate::state::{AppState, RuntimeEvent};

#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    pub symbol: Option<String>,
}

impl EventFilter {
    fn admits(&self, event: &RuntimeEvent) -> bool {
        match (&self.symbol, event) {
            (Some(wanted), RuntimeEvent::DivergenceDetected { symbol, .. }) => {
                symbol.eq_ignore_ascii_case(wanted)
            }
            _ => true,
        }
    }
}

pub async fn events_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> Response {
    ws.on_upgrade(move |socket| stream_events(socket, state, filter))
}

async fn stream_events(mut socket: WebSocket, state: AppState, filter: EventFilter) {
    let mut events = state.subscribe_events();
    if send_event(&mut socket, &RuntimeEvent::connected()).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | None => return,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => return,
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) if filter.admits(&event) => {
                        if send_event(&mut socket, &event).await.is_err() {
                            return;
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "websocket subscriber lagged");
                    }
                    Err(RecvError::Closed) => return,
                }
            }
        }
    }
}

async fn send_event(socket: &mut WebSocket, event: &RuntimeEvent) -> Result<(), ()> {
    let payload = serde_json::to_string(event).map_err(|_| ())?;
    socket.send(Message::Text(payload)).await.map_err(|_| ())
}
