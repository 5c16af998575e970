use lw_common::models::TableCounts;
use sqlx::SqlitePool;

pub async fn table_counts(pool: &SqlitePool) -> anyhow::Result<TableCounts> {
    let vehicle_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM vehicles")
        .fetch_one(pool)
        .await?;
    let log_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM logs")
        .fetch_one(pool)
        .await?;
    let checkpoint_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM checkpoints")
        .fetch_one(pool)
        .await?;

    Ok(TableCounts {
        vehicle_count,
        log_count,
        checkpoint_count,
    })
}

/// Lanes that have at least one log row.
pub async fn logged_lanes(pool: &SqlitePool) -> anyhow::Result<Vec<String>> {
    let lanes = sqlx::query_scalar::<_, String>(
        r#"SELECT DISTINCT c.lane
           FROM logs l
           JOIN checkpoints c ON l.cpid = c.cpid
           ORDER BY c.lane"#,
    )
    .fetch_all(pool)
    .await?;
    Ok(lanes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{logs, now, test_pool};

    #[tokio::test]
    async fn counts_reflect_seed_and_logs() {
        let pool = test_pool().await;
        logs::insert(&pool, "RFID004", "L4_CP1", now()).await.unwrap();

        let counts = table_counts(&pool).await.unwrap();
        assert_eq!(counts.vehicle_count, 5);
        assert_eq!(counts.log_count, 1);
        assert_eq!(counts.checkpoint_count, 40);

        assert_eq!(logged_lanes(&pool).await.unwrap(), ["L4"]);
    }
}
