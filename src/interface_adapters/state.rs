use axum::extract::ws::Utf8Bytes;
use tokio::sync::{broadcast, mpsc, watch};

use crate::use_cases::{SceneState, StageEvent, StageStatus};

#[derive(Clone)]
pub struct AppState {
    // Inputs flowing from the network into the stage loop.
    pub input_tx: mpsc::Sender<StageEvent>,
    // Serialized world updates, shared across all feed connections.
    pub world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    // Latest serialized world update for lag recovery.
    pub world_latest_tx: watch::Sender<Utf8Bytes>,
    // Scene changes, pushed to feed clients.
    pub scene_tx: watch::Sender<SceneState>,
    // Per-tick stats for the control surface.
    pub status_tx: watch::Sender<StageStatus>,
}
