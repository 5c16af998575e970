use lw_common::models::Checkpoint;
use sqlx::{SqliteExecutor, SqlitePool};

pub async fn get_by_id<'e, E: SqliteExecutor<'e>>(
    executor: E,
    cpid: &str,
) -> anyhow::Result<Option<Checkpoint>> {
    let checkpoint =
        sqlx::query_as::<_, Checkpoint>("SELECT cpid, lane FROM checkpoints WHERE cpid = $1")
            .bind(cpid)
            .fetch_optional(executor)
            .await?;
    Ok(checkpoint)
}

pub async fn list<'e, E: SqliteExecutor<'e>>(executor: E) -> anyhow::Result<Vec<Checkpoint>> {
    let checkpoints =
        sqlx::query_as::<_, Checkpoint>("SELECT cpid, lane FROM checkpoints ORDER BY lane, cpid")
            .fetch_all(executor)
            .await?;
    Ok(checkpoints)
}

pub async fn lanes(pool: &SqlitePool) -> anyhow::Result<Vec<String>> {
    let lanes =
        sqlx::query_scalar::<_, String>("SELECT DISTINCT lane FROM checkpoints ORDER BY lane")
            .fetch_all(pool)
            .await?;
    Ok(lanes)
}
