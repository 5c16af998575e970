use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{State, WebSocketUpgrade, ws::{Message, WebSocket}},
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use lw_common::protocol::{FrontendCommand, MovementEvent};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::state::AppState;

/// Typed envelope for messages sent to the frontend.
#[derive(Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
enum FrontendMessage {
    Movement(MovementEvent),
}

pub async fn handle(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_frontend_socket(socket, state))
}

/// An empty lane set means the client wants every lane.
fn wants(lanes: &HashSet<String>, event: &MovementEvent) -> bool {
    lanes.is_empty() || lanes.contains(&event.lane)
}

fn apply_command(lanes: &mut HashSet<String>, cmd: FrontendCommand) {
    match cmd {
        FrontendCommand::Subscribe { lanes: added } => {
            tracing::info!(lanes = ?added, "Frontend subscribed to lanes");
            lanes.extend(added);
        }
        FrontendCommand::Unsubscribe { lanes: removed } => {
            for lane in removed {
                lanes.remove(&lane);
            }
        }
    }
}

async fn handle_frontend_socket(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let mut live_rx = state.live_tx.subscribe();

    let subscriptions: Arc<RwLock<HashSet<String>>> = Arc::new(RwLock::new(HashSet::new()));
    let subs_clone = subscriptions.clone();

    tracing::info!("Frontend WebSocket client connected");

    // Writer task: forward matching movements to this frontend
    let writer = tokio::spawn(async move {
        loop {
            match live_rx.recv().await {
                Ok(event) => {
                    if !wants(&*subs_clone.read().await, &event) {
                        continue;
                    }
                    let json = match serde_json::to_string(&FrontendMessage::Movement(event)) {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::warn!("Failed to encode movement: {}", e);
                            continue;
                        }
                    };
                    if ws_tx.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Frontend WS lagged by {} messages", n);
                }
                Err(_) => break,
            }
        }
    });

    // Reader loop: handle subscription commands
    while let Some(Ok(msg)) = ws_rx.next().await {
        if let Message::Text(text) = msg {
            match serde_json::from_str::<FrontendCommand>(&text) {
                Ok(cmd) => apply_command(&mut *subscriptions.write().await, cmd),
                Err(e) => tracing::debug!("Ignoring frontend message: {}", e),
            }
        }
    }

    tracing::info!("Frontend WebSocket client disconnected");
    writer.abort();
}

#[cfg(test)]
mod tests {
    use super::*;
    use lw_common::protocol::MovementSource;

    fn event(lane: &str) -> MovementEvent {
        MovementEvent {
            rfid: "RFID001".into(),
            cpid: format!("{lane}_CP1"),
            lane: lane.into(),
            checkpoint: Some(1),
            timestamp: chrono::Utc::now(),
            source: MovementSource::Manual,
        }
    }

    #[test]
    fn subscriptions_filter_by_lane() {
        let mut lanes = HashSet::new();
        assert!(wants(&lanes, &event("L3")));

        let cmd: FrontendCommand =
            serde_json::from_str(r#"{"type":"Subscribe","data":{"lanes":["L1","L2"]}}"#).unwrap();
        apply_command(&mut lanes, cmd);
        assert!(wants(&lanes, &event("L1")));
        assert!(!wants(&lanes, &event("L3")));

        apply_command(&mut lanes, FrontendCommand::Unsubscribe { lanes: vec!["L1".into(), "L2".into()] });
        assert!(wants(&lanes, &event("L3")));
    }

    #[test]
    fn movement_envelope_shape() {
        let json = serde_json::to_value(FrontendMessage::Movement(event("L2"))).unwrap();
        assert_eq!(json["type"], "movement");
        assert_eq!(json["data"]["lane"], "L2");
        assert_eq!(json["data"]["source"], "manual");
    }
}
