use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use lw_common::checkpoint::percentage;
use lw_common::models::{AnalyticsReport, CategoryCount, CategoryShare, CheckpointCount, LaneCount, LaneShare};

use crate::db;
use crate::error::ApiError;
use crate::state::AppState;

const RECENT_LOGS: i64 = 50;
const REPORT_FAILED: &str = "Failed to build analytics";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analytics", get(report))
        .route("/analytics/transit-lanes", get(transit_lanes))
        .route("/analytics/lanes/{lane}/checkpoints", get(lane_checkpoints))
        .route("/analytics/categories", get(categories))
}

fn lane_shares(counts: Vec<LaneCount>) -> Vec<LaneShare> {
    let total: i64 = counts.iter().map(|c| c.vehicle_count).sum();
    counts
        .into_iter()
        .map(|c| LaneShare {
            percentage: percentage(c.vehicle_count, total),
            lane: c.lane,
            vehicle_count: c.vehicle_count,
        })
        .collect()
}

fn category_shares(counts: Vec<CategoryCount>) -> Vec<CategoryShare> {
    let total: i64 = counts.iter().map(|c| c.count).sum();
    counts
        .into_iter()
        .map(|c| CategoryShare {
            percentage: percentage(c.count, total),
            category: c.category,
            count: c.count,
        })
        .collect()
}

async fn report(State(state): State<AppState>) -> Result<Json<AnalyticsReport>, ApiError> {
    let lane_counts = db::vehicles::lane_counts(&state.pool)
        .await
        .map_err(ApiError::internal(REPORT_FAILED))?;
    let lanes = db::checkpoints::lanes(&state.pool)
        .await
        .map_err(ApiError::internal(REPORT_FAILED))?;
    let checkpoint_counts = db::analytics::checkpoint_counts(&state.pool)
        .await
        .map_err(ApiError::internal(REPORT_FAILED))?;
    let category_counts = db::vehicles::category_counts(&state.pool)
        .await
        .map_err(ApiError::internal(REPORT_FAILED))?;
    let recent_logs = db::analytics::recent_logs(&state.pool, RECENT_LOGS)
        .await
        .map_err(ApiError::internal(REPORT_FAILED))?;

    Ok(Json(AnalyticsReport {
        success: true,
        lane_distribution: lane_shares(lane_counts),
        checkpoint_matrix: db::analytics::checkpoint_matrix(&lanes, &checkpoint_counts),
        category_distribution: category_shares(category_counts),
        recent_logs,
    }))
}

async fn transit_lanes(State(state): State<AppState>) -> Result<Json<Vec<LaneCount>>, ApiError> {
    db::analytics::transit_lane_counts(&state.pool)
        .await
        .map(Json)
        .map_err(ApiError::internal("Failed to fetch transit lanes"))
}

async fn lane_checkpoints(
    State(state): State<AppState>,
    Path(lane): Path<String>,
) -> Result<Json<Vec<CheckpointCount>>, ApiError> {
    db::analytics::lane_checkpoint_counts(&state.pool, &lane)
        .await
        .map(Json)
        .map_err(ApiError::internal("Failed to fetch lane checkpoints"))
}

async fn categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryCount>>, ApiError> {
    db::vehicles::category_counts(&state.pool)
        .await
        .map(Json)
        .map_err(ApiError::internal("Failed to fetch categories"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shares_sum_from_counts() {
        let shares = lane_shares(vec![
            LaneCount { lane: "L1".into(), vehicle_count: 3 },
            LaneCount { lane: "L2".into(), vehicle_count: 1 },
        ]);
        assert_eq!(shares[0].percentage, 75);
        assert_eq!(shares[1].percentage, 25);

        assert!(category_shares(Vec::new()).is_empty());
    }
}
