use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub log_level: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub static_dir: String,
    /// How far back `/live` looks when reporting lane activity.
    pub live_window_secs: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
            database_url: "sqlite://data/lanewatch.db?mode=rwc".to_string(),
            db_max_connections: 5,
            static_dir: "./frontend/dist".to_string(),
            live_window_secs: 3600,
        }
    }
}
