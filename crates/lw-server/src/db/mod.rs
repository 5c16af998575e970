use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, SubsecRound, Utc};
use lw_common::config::ServerConfig;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub mod analytics;
pub mod checkpoints;
pub mod filters;
pub mod live;
pub mod logs;
pub mod stats;
pub mod vehicles;

/// Log timestamps are stored at whole-second precision so their text
/// encoding sorts chronologically.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

pub async fn connect(config: &ServerConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);

    if let Some(parent) = Path::new(options.get_filename()).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("migrations apply");
    pool
}
