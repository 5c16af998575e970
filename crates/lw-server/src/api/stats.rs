use axum::{Json, Router, extract::State, routing::get};
use lw_common::models::{StatsResponse, StatsSummary};

use crate::db;
use crate::error::ApiError;
use crate::state::AppState;

const STATS_FAILED: &str = "Failed to fetch stats";

pub fn router() -> Router<AppState> {
    Router::new().route("/stats", get(stats))
}

async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let counts = db::stats::table_counts(&state.pool)
        .await
        .map_err(ApiError::internal(STATS_FAILED))?;
    let lanes = db::stats::logged_lanes(&state.pool)
        .await
        .map_err(ApiError::internal(STATS_FAILED))?;
    let categories = db::vehicles::category_counts(&state.pool)
        .await
        .map_err(ApiError::internal(STATS_FAILED))?;
    let recent_logs = db::analytics::recent_logs(&state.pool, 5)
        .await
        .map_err(ApiError::internal(STATS_FAILED))?;

    Ok(Json(StatsResponse {
        success: true,
        stats: StatsSummary {
            counts,
            lanes,
            categories,
            recent_logs,
        },
        timestamp: db::now(),
    }))
}
