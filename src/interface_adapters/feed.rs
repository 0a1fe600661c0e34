// Renderer feed: WebSocket clients subscribe to the serialized per-tick
// world updates. Feed clients are pure spectators; there is no handshake.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{
        State,
        ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::sink::SinkExt;
use tokio::sync::{broadcast, watch};
use tracing::{error, info, warn};

use crate::interface_adapters::protocol::{FeedMessage, WorldUpdateDto};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::tracking::should_log;
use crate::use_cases::{SceneState, WorldUpdate};

pub async fn world_update_serializer(
    mut world_rx: broadcast::Receiver<WorldUpdate>,
    world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    world_latest_tx: watch::Sender<Utf8Bytes>,
) {
    // Serialize each world update once and broadcast the shared bytes.
    loop {
        match world_rx.recv().await {
            Ok(update) => {
                let msg = FeedMessage::WorldUpdate(WorldUpdateDto::from(update));
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize world update");
                        continue;
                    }
                };

                // Convert once and broadcast shared UTF-8 bytes to all clients.
                let bytes = Utf8Bytes::from(txt);
                // Store the latest bytes for lag recovery; send_replace keeps
                // the snapshot fresh even with zero subscribers.
                world_latest_tx.send_replace(bytes.clone());
                let _ = world_bytes_tx.send(bytes);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    missed = n,
                    "world serializer lagged; skipping to latest update"
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("world updates channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // Subscribe before the upgrade completes so no update is missed.
    let world_bytes_rx = state.world_bytes_tx.subscribe();
    let world_latest_rx = state.world_latest_tx.subscribe();
    let scene_rx = state.scene_tx.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, world_bytes_rx, world_latest_rx, scene_rx))
}

async fn handle_socket(
    mut socket: WebSocket,
    mut world_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    world_latest_rx: watch::Receiver<Utf8Bytes>,
    mut scene_rx: watch::Receiver<SceneState>,
) {
    info!("feed client connected");

    // Current scene first, so the renderer can set itself up before the
    // first snapshot lands.
    let scene = *scene_rx.borrow();
    if send_message(&mut socket, &FeedMessage::SceneState(scene.into()))
        .await
        .is_err()
    {
        return;
    }

    let mut last_lag_log = Instant::now() - Duration::from_secs(2);

    loop {
        let disconnect = tokio::select! {
            incoming = socket.recv() => match incoming {
                // Spectators have nothing to say; drop whatever arrives.
                Some(Ok(Message::Close(_))) | None => true,
                Some(Ok(_)) => false,
                Some(Err(e)) => {
                    warn!(error = %e, "feed socket recv error");
                    true
                }
            },

            world = world_bytes_rx.recv() => match world {
                Ok(bytes) => forward(&mut socket, bytes).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    if should_log(&mut last_lag_log) {
                        warn!(missed = n, "feed client lagged; sending snapshot");
                    }
                    // Resync strategy: send the latest world snapshot.
                    let latest = world_latest_rx.borrow().clone();
                    if latest.is_empty() {
                        false
                    } else {
                        forward(&mut socket, latest).await
                    }
                }
                Err(broadcast::error::RecvError::Closed) => {
                    warn!("world updates channel closed; disconnecting feed client");
                    true
                }
            },

            changed = scene_rx.changed() => match changed {
                Ok(()) => {
                    let scene = *scene_rx.borrow_and_update();
                    send_message(&mut socket, &FeedMessage::SceneState(scene.into()))
                        .await
                        .is_err()
                }
                Err(_) => true,
            },
        };

        if disconnect {
            let _ = socket.close().await;
            break;
        }
    }

    info!("feed client disconnected");
}

async fn forward(socket: &mut WebSocket, bytes: Utf8Bytes) -> bool {
    match socket.send(Message::Text(bytes)).await {
        Ok(()) => false,
        Err(e) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = %e, "failed to send world update");
            true
        }
    }
}

async fn send_message(socket: &mut WebSocket, msg: &FeedMessage) -> Result<(), axum::Error> {
    let txt = match serde_json::to_string(msg) {
        Ok(txt) => txt,
        Err(e) => {
            error!(error = ?e, "failed to serialize feed message");
            return Ok(());
        }
    };
    socket.send(Message::Text(txt.into())).await
}
