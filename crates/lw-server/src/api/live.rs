use std::collections::BTreeMap;

use axum::{Json, Router, extract::State, routing::get};
use chrono::Duration;
use lw_common::checkpoint::{checkpoint_number, lane_display_name};
use lw_common::models::{LaneOverview, LaneVehicle, LanesResponse, LiveSnapshot};

use crate::db;
use crate::db::live::LanePosition;
use crate::error::ApiError;
use crate::state::AppState;

const RECENT_ACTIVITY: i64 = 20;
const LIVE_FAILED: &str = "Failed to fetch live tracking data";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/live", get(snapshot))
        .route("/lanes/overview", get(lane_overview))
}

async fn snapshot(State(state): State<AppState>) -> Result<Json<LiveSnapshot>, ApiError> {
    let now = db::now();
    let since = now - Duration::seconds(state.config.live_window_secs);

    let current_positions = db::live::current_positions(&state.pool)
        .await
        .map_err(ApiError::internal(LIVE_FAILED))?;
    let recent_activity = db::analytics::recent_logs(&state.pool, RECENT_ACTIVITY)
        .await
        .map_err(ApiError::internal(LIVE_FAILED))?;
    let lane_status = db::live::lane_activity(&state.pool, since)
        .await
        .map_err(ApiError::internal(LIVE_FAILED))?;

    Ok(Json(LiveSnapshot {
        success: true,
        current_positions,
        recent_activity,
        lane_status,
        timestamp: now,
    }))
}

fn group_by_lane(rows: Vec<LanePosition>) -> Vec<LaneOverview> {
    let mut grouped: BTreeMap<String, Vec<LaneVehicle>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.lane).or_default().push(LaneVehicle {
            checkpoint: checkpoint_number(&row.cpid).unwrap_or(0),
            id: row.rfid,
            category: row.category,
        });
    }

    grouped
        .into_iter()
        .map(|(lane, vehicles)| LaneOverview {
            name: lane_display_name(&lane),
            id: lane,
            status: "active".to_string(),
            vehicles,
        })
        .collect()
}

async fn lane_overview(State(state): State<AppState>) -> Result<Json<LanesResponse>, ApiError> {
    let rows = db::live::lane_positions(&state.pool)
        .await
        .map_err(ApiError::internal("Failed to fetch lane overview"))?;
    Ok(Json(LanesResponse {
        lanes: group_by_lane(rows),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(rfid: &str, cpid: &str, lane: &str) -> LanePosition {
        LanePosition {
            rfid: rfid.into(),
            cpid: cpid.into(),
            lane: lane.into(),
            category: "A".into(),
        }
    }

    #[test]
    fn groups_vehicles_under_their_lane() {
        let lanes = group_by_lane(vec![
            position("RFID001", "L1_CP4", "L1"),
            position("RFID005", "L1_CP2", "L1"),
            position("RFID003", "L3_CP9", "L3"),
        ]);

        assert_eq!(lanes.len(), 2);
        assert_eq!(lanes[0].id, "L1");
        assert_eq!(lanes[0].name, "Lane 1");
        assert_eq!(lanes[0].vehicles.len(), 2);
        assert_eq!(lanes[0].vehicles[0].checkpoint, 4);
        assert_eq!(lanes[1].vehicles[0].id, "RFID003");
        assert_eq!(lanes[1].status, "active");
    }
}
