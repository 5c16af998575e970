use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use lw_common::checkpoint::checkpoint_number;
use lw_common::models::{RecordMovement, RecordedMovement, VehicleHistory, VehiclesOverview};
use lw_common::protocol::{MovementEvent, MovementSource};

use crate::db;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/vehicles", get(list_vehicles).post(record_movement))
        .route("/vehicles/{rfid}/history", get(vehicle_history))
}

async fn list_vehicles(State(state): State<AppState>) -> Result<Json<VehiclesOverview>, ApiError> {
    let vehicles = db::vehicles::list_with_positions(&state.pool)
        .await
        .map_err(ApiError::internal("Failed to fetch vehicles"))?;
    let lane_stats = db::vehicles::lane_counts(&state.pool)
        .await
        .map_err(ApiError::internal("Failed to fetch vehicles"))?;
    let category_stats = db::vehicles::category_counts(&state.pool)
        .await
        .map_err(ApiError::internal("Failed to fetch vehicles"))?;

    Ok(Json(VehiclesOverview {
        success: true,
        vehicles,
        lane_stats,
        category_stats,
    }))
}

async fn record_movement(
    State(state): State<AppState>,
    Json(input): Json<RecordMovement>,
) -> Result<(StatusCode, Json<RecordedMovement>), ApiError> {
    let (rfid, cpid) = match (input.rfid, input.cpid) {
        (Some(rfid), Some(cpid)) if !rfid.trim().is_empty() && !cpid.trim().is_empty() => {
            (rfid.trim().to_string(), cpid.trim().to_string())
        }
        _ => return Err(ApiError::BadRequest("RFID and CPID required".to_string())),
    };

    if db::vehicles::get_by_rfid(&state.pool, &rfid)
        .await
        .map_err(ApiError::internal("Failed to record movement"))?
        .is_none()
    {
        return Err(ApiError::NotFound("Invalid RFID".to_string()));
    }
    let checkpoint = db::checkpoints::get_by_id(&state.pool, &cpid)
        .await
        .map_err(ApiError::internal("Failed to record movement"))?
        .ok_or_else(|| ApiError::NotFound("Invalid CPID".to_string()))?;

    let timestamp = db::now();
    db::logs::record_pass(&state.pool, &rfid, &cpid, timestamp)
        .await
        .map_err(ApiError::internal("Failed to record movement"))?;

    tracing::info!(rfid = %rfid, cpid = %cpid, "Checkpoint pass recorded");

    state.publish(MovementEvent {
        rfid: rfid.clone(),
        cpid: cpid.clone(),
        lane: checkpoint.lane,
        checkpoint: checkpoint_number(&cpid),
        timestamp,
        source: MovementSource::Manual,
    });

    Ok((
        StatusCode::CREATED,
        Json(RecordedMovement {
            success: true,
            message: format!("RFID {rfid} logged at {cpid}"),
            rfid,
            cpid,
            timestamp,
        }),
    ))
}

async fn vehicle_history(
    State(state): State<AppState>,
    Path(rfid): Path<String>,
) -> Result<Json<VehicleHistory>, ApiError> {
    let vehicle = db::vehicles::get_by_rfid(&state.pool, &rfid)
        .await
        .map_err(ApiError::internal("Failed to fetch vehicle history"))?
        .ok_or_else(|| ApiError::NotFound(format!("RFID {rfid} not found")))?;
    let logs = db::logs::history(&state.pool, &rfid)
        .await
        .map_err(ApiError::internal("Failed to fetch vehicle history"))?;

    Ok(Json(VehicleHistory { vehicle, logs }))
}
