use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use lw_common::models::{FilterOptions, LogFilter, LogSearchResult};

use crate::db;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/filters/options", get(options))
        .route("/logs/search", post(search))
}

async fn options(State(state): State<AppState>) -> Result<Json<FilterOptions>, ApiError> {
    db::filters::options(&state.pool)
        .await
        .map(Json)
        .map_err(ApiError::internal("Failed to fetch filter options"))
}

async fn search(
    State(state): State<AppState>,
    Json(filter): Json<LogFilter>,
) -> Result<Json<LogSearchResult>, ApiError> {
    let filter = filter.normalized();
    tracing::debug!(?filter, "Searching logs");

    let logs = db::filters::search(&state.pool, &filter)
        .await
        .map_err(ApiError::internal("Failed to fetch filtered logs"))?;
    Ok(Json(LogSearchResult { logs }))
}
