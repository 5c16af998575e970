use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ─── Vehicle ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub rfid: String,
    pub sno: Option<i64>,
    pub ba_no: Option<String>,
    pub category: String,
    pub unit: Option<String>,
    pub formation: Option<String>,
    pub lane: Option<String>,
    pub troops: Option<i64>,
    pub purpose: Option<String>,
}

/// A vehicle joined with its most recent log row, if it has one.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VehiclePosition {
    pub rfid: String,
    pub ba_no: Option<String>,
    pub category: String,
    pub unit: Option<String>,
    pub formation: Option<String>,
    pub lane: Option<String>,
    pub troops: Option<i64>,
    pub purpose: Option<String>,
    pub cpid: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub current_lane: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehiclesOverview {
    pub success: bool,
    pub vehicles: Vec<VehiclePosition>,
    pub lane_stats: Vec<LaneCount>,
    pub category_stats: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleHistory {
    pub vehicle: Vehicle,
    pub logs: Vec<MovementLog>,
}

// ─── Checkpoint / Log ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Checkpoint {
    pub cpid: String,
    pub lane: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MovementLog {
    pub id: i64,
    pub rfid: String,
    pub cpid: String,
    pub timestamp: DateTime<Utc>,
}

/// A log row joined with its vehicle and checkpoint lane.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LogDetail {
    pub rfid: String,
    pub cpid: String,
    pub timestamp: DateTime<Utc>,
    pub lane: String,
    pub category: String,
    pub ba_no: Option<String>,
    pub unit: Option<String>,
    pub formation: Option<String>,
    pub purpose: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordMovement {
    #[serde(default)]
    pub rfid: Option<String>,
    #[serde(default)]
    pub cpid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedMovement {
    pub success: bool,
    pub message: String,
    pub rfid: String,
    pub cpid: String,
    pub timestamp: DateTime<Utc>,
}

// ─── Simulation ───────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulateRequest {
    #[serde(default)]
    pub rfid: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationStatus {
    Moved,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub success: bool,
    pub status: SimulationStatus,
    pub message: String,
    pub rfid: String,
    pub lane: String,
    pub current_checkpoint: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_minutes: Option<i64>,
}

// ─── Aggregates ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LaneCount {
    pub lane: String,
    pub vehicle_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CheckpointCount {
    pub cpid: String,
    pub vehicle_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneShare {
    pub lane: String,
    pub vehicle_count: i64,
    pub percentage: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: String,
    pub count: i64,
    pub percentage: i64,
}

/// One row of the checkpoint-by-lane matrix: `{"checkpoint": "CP3", "L1": 2, "L2": 0, ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointRow {
    pub checkpoint: String,
    #[serde(flatten)]
    pub lanes: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub success: bool,
    pub lane_distribution: Vec<LaneShare>,
    pub checkpoint_matrix: Vec<CheckpointRow>,
    pub category_distribution: Vec<CategoryShare>,
    pub recent_logs: Vec<LogDetail>,
}

// ─── Live ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LaneActivity {
    pub lane: String,
    pub active_vehicles: i64,
    pub last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveSnapshot {
    pub success: bool,
    pub current_positions: Vec<LogDetail>,
    pub recent_activity: Vec<LogDetail>,
    pub lane_status: Vec<LaneActivity>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneVehicle {
    pub id: String,
    pub checkpoint: u32,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneOverview {
    pub id: String,
    pub name: String,
    pub status: String,
    pub vehicles: Vec<LaneVehicle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanesResponse {
    pub lanes: Vec<LaneOverview>,
}

// ─── Filtering ────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterOptions {
    pub units: Vec<String>,
    pub formations: Vec<String>,
    pub categories: Vec<String>,
    pub purposes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilter {
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub formation: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
}

impl LogFilter {
    /// Blank filter values mean "any".
    pub fn normalized(self) -> Self {
        fn keep(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }
        Self {
            unit: keep(self.unit),
            formation: keep(self.formation),
            category: keep(self.category),
            purpose: keep(self.purpose),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSearchResult {
    pub logs: Vec<LogDetail>,
}

// ─── Stats ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCounts {
    pub vehicle_count: i64,
    pub log_count: i64,
    pub checkpoint_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSummary {
    #[serde(flatten)]
    pub counts: TableCounts,
    pub lanes: Vec<String>,
    pub categories: Vec<CategoryCount>,
    pub recent_logs: Vec<LogDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: StatsSummary,
    pub timestamp: DateTime<Utc>,
}

// ─── Upload ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSummary {
    pub message: String,
    pub inserted: u64,
    pub skipped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_filters_are_dropped() {
        let filter = LogFilter {
            unit: Some("  ".into()),
            formation: Some(" Formation1 ".into()),
            category: None,
            purpose: Some(String::new()),
        }
        .normalized();

        assert_eq!(
            filter,
            LogFilter {
                formation: Some("Formation1".into()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn checkpoint_row_flattens_lanes() {
        let row = CheckpointRow {
            checkpoint: "CP1".into(),
            lanes: BTreeMap::from([("L1".to_string(), 2), ("L2".to_string(), 0)]),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json, serde_json::json!({"checkpoint": "CP1", "L1": 2, "L2": 0}));
    }
}
