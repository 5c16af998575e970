use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Live Feed (Server -> Frontend) ──────────────────────

/// Where a movement log row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementSource {
    Manual,
    Simulated,
    Upload,
}

/// Emitted whenever a log row is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementEvent {
    pub rfid: String,
    pub cpid: String,
    pub lane: String,
    pub checkpoint: Option<u32>,
    pub timestamp: DateTime<Utc>,
    pub source: MovementSource,
}

// ─── Frontend WS Commands ────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum FrontendCommand {
    Subscribe { lanes: Vec<String> },
    Unsubscribe { lanes: Vec<String> },
}
