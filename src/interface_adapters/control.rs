// Control surface: small HTTP routes for venue operators.

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::domain::scenes::SceneKind;
use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::protocol::{SceneRequest, StatusDto};
use crate::interface_adapters::state::AppState;
use crate::use_cases::StageEvent;

pub async fn status_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = *state.status_tx.subscribe().borrow();
    Json(StatusDto::from(status))
}

pub async fn set_scene_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SceneRequest>,
) -> impl IntoResponse {
    let Some(scene) = SceneKind::parse(&payload.scene) else {
        // Keep bad-request responses consistent with the JSON error schema.
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("unknown scene: {}", payload.scene),
            }),
        )
            .into_response();
    };

    match state.input_tx.try_send(StageEvent::SetScene { scene }) {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "scene": scene.name() })),
        )
            .into_response(),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "stage is not accepting commands".to_string(),
            }),
        )
            .into_response(),
    }
}
