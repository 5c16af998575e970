use std::sync::Arc;

use lw_common::config::ServerConfig;
use lw_common::protocol::MovementEvent;
use sqlx::SqlitePool;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub live_tx: broadcast::Sender<MovementEvent>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: ServerConfig) -> Self {
        let (live_tx, _) = broadcast::channel(1_000);
        Self {
            pool,
            live_tx,
            config: Arc::new(config),
        }
    }

    /// Fan a movement out to every connected live client. Having no
    /// subscribers is not an error.
    pub fn publish(&self, event: MovementEvent) {
        let _ = self.live_tx.send(event);
    }
}
