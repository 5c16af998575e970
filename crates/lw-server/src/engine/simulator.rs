use lw_common::checkpoint::{
    FINAL_CHECKPOINT, VehicleCategory, checkpoint_id, checkpoint_number,
};
use lw_common::models::{SimulationOutcome, SimulationStatus};
use lw_common::protocol::{MovementEvent, MovementSource};

use crate::db;
use crate::error::ApiError;
use crate::state::AppState;

/// Moves a vehicle to the next checkpoint of its lane, timestamped a
/// category-dependent random delay into the future.
pub async fn advance(state: &AppState, rfid: &str) -> Result<SimulationOutcome, ApiError> {
    let vehicle = db::vehicles::get_by_rfid(&state.pool, rfid)
        .await
        .map_err(ApiError::internal("Failed to load vehicle"))?
        .ok_or_else(|| ApiError::NotFound(format!("RFID {rfid} not found")))?;

    let latest = db::logs::latest_for_vehicle(&state.pool, rfid)
        .await
        .map_err(ApiError::internal("Failed to load latest log"))?;

    let current = latest
        .as_ref()
        .and_then(|log| checkpoint_number(&log.cpid))
        .unwrap_or(0);

    let lane = match vehicle.lane.clone() {
        Some(lane) => lane,
        None => match &latest {
            Some(log) => db::checkpoints::get_by_id(&state.pool, &log.cpid)
                .await
                .map_err(ApiError::internal("Failed to load checkpoint"))?
                .map(|cp| cp.lane)
                .ok_or_else(|| ApiError::BadRequest(format!("Vehicle {rfid} has no lane")))?,
            None => return Err(ApiError::BadRequest(format!("Vehicle {rfid} has no lane"))),
        },
    };

    if current >= FINAL_CHECKPOINT {
        return Ok(SimulationOutcome {
            success: true,
            status: SimulationStatus::Completed,
            message: "Vehicle has completed all checkpoints".to_string(),
            rfid: rfid.to_string(),
            lane,
            current_checkpoint: current,
            timestamp: None,
            delay_minutes: None,
        });
    }

    let next = current + 1;
    let next_cpid = checkpoint_id(&lane, next);
    if db::checkpoints::get_by_id(&state.pool, &next_cpid)
        .await
        .map_err(ApiError::internal("Failed to load checkpoint"))?
        .is_none()
    {
        return Err(ApiError::BadRequest(format!("Checkpoint {next_cpid} does not exist")));
    }

    let category = vehicle.category.parse().unwrap_or(VehicleCategory::B);
    let delay = category.simulated_delay(&mut rand::thread_rng());
    let timestamp = db::now() + delay.as_duration();

    db::logs::record_pass(&state.pool, rfid, &next_cpid, timestamp)
        .await
        .map_err(ApiError::internal("Failed to simulate movement"))?;

    tracing::info!(rfid, cpid = %next_cpid, delay_minutes = delay.minutes, "Simulated checkpoint pass");

    state.publish(MovementEvent {
        rfid: rfid.to_string(),
        cpid: next_cpid.clone(),
        lane: lane.clone(),
        checkpoint: Some(next),
        timestamp,
        source: MovementSource::Simulated,
    });

    Ok(SimulationOutcome {
        success: true,
        status: SimulationStatus::Moved,
        message: format!("Vehicle {rfid} moved to {next_cpid}"),
        rfid: rfid.to_string(),
        lane,
        current_checkpoint: next,
        timestamp: Some(timestamp),
        delay_minutes: Some(delay.minutes),
    })
}
