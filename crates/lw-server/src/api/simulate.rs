use axum::{Json, Router, extract::State, routing::post};
use lw_common::models::{SimulateRequest, SimulationOutcome};

use crate::engine::simulator;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/simulate", post(simulate_movement))
}

async fn simulate_movement(
    State(state): State<AppState>,
    Json(input): Json<SimulateRequest>,
) -> Result<Json<SimulationOutcome>, ApiError> {
    let rfid = input
        .rfid
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing RFID".to_string()))?;

    simulator::advance(&state, &rfid).await.map(Json)
}
