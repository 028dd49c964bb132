//! Live stats stream over WebSocket.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::{Router, routing::get};
use swapflow_stats::StatsSnapshot;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::state::AppState;

/// GET /ws
async fn stats_stream(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let snapshots = state.stats.subscribe();
    ws.on_upgrade(move |socket| forward_snapshots(socket, snapshots))
}

/// Relays snapshots to the client until either side goes away. The stream
/// also ends when the publisher drops this subscriber for lagging.
async fn forward_snapshots(
    mut socket: WebSocket,
    mut snapshots: mpsc::Receiver<Arc<StatsSnapshot>>,
) {
    info!("stats subscriber connected");
    loop {
        tokio::select! {
            snapshot = snapshots.recv() => {
                let Some(snapshot) = snapshot else {
                    debug!("subscription closed by publisher");
                    break;
                };
                let text = match serde_json::to_string(snapshot.as_ref()) {
                    Ok(text) => text,
                    Err(e) => {
                        error!(error = %e, "failed to encode stats snapshot");
                        continue;
                    }
                };
                if let Err(e) = socket.send(Message::Text(text.into())).await {
                    debug!(error = %e, "stats subscriber write failed");
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                None | Some(Err(_) | Ok(Message::Close(_))) => break,
                Some(Ok(_)) => {}
            },
        }
    }
    info!("stats subscriber disconnected");
}

/// Returns the stats stream router.
pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(stats_stream))
}
