use anyhow::Result;
use lw_common::config::ServerConfig;

pub fn load() -> Result<ServerConfig> {
    let mut config = ServerConfig::default();

    // Override from environment variables
    if let Ok(v) = std::env::var("LW_LISTEN_ADDR") {
        config.listen_addr = v;
    }
    if let Ok(v) = std::env::var("LW_LOG_LEVEL") {
        config.log_level = v;
    }
    if let Ok(v) = std::env::var("DATABASE_URL") {
        config.database_url = v;
    }
    if let Ok(v) = std::env::var("LW_DB_MAX_CONNECTIONS") {
        config.db_max_connections = v.parse().unwrap_or(5);
    }
    if let Ok(v) = std::env::var("LW_STATIC_DIR") {
        config.static_dir = v;
    }
    if let Ok(v) = std::env::var("LW_LIVE_WINDOW_SECS") {
        config.live_window_secs = v.parse().unwrap_or(3600);
    }

    Ok(config)
}
