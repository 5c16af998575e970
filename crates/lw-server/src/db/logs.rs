use chrono::{DateTime, Utc};
use lw_common::checkpoint::FINAL_CHECKPOINT;
use lw_common::models::MovementLog;
use sqlx::{SqliteExecutor, SqlitePool};

pub async fn insert<'e, E: SqliteExecutor<'e>>(
    executor: E,
    rfid: &str,
    cpid: &str,
    timestamp: DateTime<Utc>,
) -> anyhow::Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO logs (rfid, cpid, timestamp) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(rfid)
    .bind(cpid)
    .bind(timestamp)
    .fetch_one(executor)
    .await?;
    Ok(id)
}

pub async fn insert_transit<'e, E: SqliteExecutor<'e>>(
    executor: E,
    rfid: &str,
    cpid: &str,
    timestamp: DateTime<Utc>,
) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO transit_logs (rfid, cpid, timestamp) VALUES ($1, $2, $3)")
        .bind(rfid)
        .bind(cpid)
        .bind(timestamp)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn has_reached_final<'e, E: SqliteExecutor<'e>>(
    executor: E,
    rfid: &str,
) -> anyhow::Result<bool> {
    let reached = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM logs WHERE rfid = $1 AND cpid LIKE $2)",
    )
    .bind(rfid)
    .bind(format!("%CP{FINAL_CHECKPOINT}"))
    .fetch_one(executor)
    .await?;
    Ok(reached)
}

/// Writes a checkpoint pass and, while the vehicle has not reached the final
/// checkpoint, mirrors it into `transit_logs`. Both rows commit together.
pub async fn record_pass(
    pool: &SqlitePool,
    rfid: &str,
    cpid: &str,
    timestamp: DateTime<Utc>,
) -> anyhow::Result<i64> {
    let mut tx = pool.begin().await?;
    let id = insert(&mut *tx, rfid, cpid, timestamp).await?;
    if !has_reached_final(&mut *tx, rfid).await? {
        insert_transit(&mut *tx, rfid, cpid, timestamp).await?;
    }
    tx.commit().await?;
    Ok(id)
}

pub async fn latest_for_vehicle(pool: &SqlitePool, rfid: &str) -> anyhow::Result<Option<MovementLog>> {
    let log = sqlx::query_as::<_, MovementLog>(
        r#"SELECT id, rfid, cpid, timestamp FROM logs
           WHERE rfid = $1
           ORDER BY timestamp DESC, id DESC
           LIMIT 1"#,
    )
    .bind(rfid)
    .fetch_optional(pool)
    .await?;
    Ok(log)
}

pub async fn history(pool: &SqlitePool, rfid: &str) -> anyhow::Result<Vec<MovementLog>> {
    let logs = sqlx::query_as::<_, MovementLog>(
        r#"SELECT id, rfid, cpid, timestamp FROM logs
           WHERE rfid = $1
           ORDER BY timestamp, id"#,
    )
    .bind(rfid)
    .fetch_all(pool)
    .await?;
    Ok(logs)
}

#[cfg(test)]
pub async fn transit_count(pool: &SqlitePool, rfid: &str) -> anyhow::Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM transit_logs WHERE rfid = $1")
        .bind(rfid)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
