use lw_common::models::{FilterOptions, LogDetail, LogFilter};
use sqlx::SqlitePool;

const SEARCH_LIMIT: i64 = 50;

async fn distinct_values(pool: &SqlitePool, column: &'static str) -> anyhow::Result<Vec<String>> {
    let sql = format!(
        "SELECT DISTINCT {column} FROM vehicles WHERE {column} IS NOT NULL ORDER BY {column}"
    );
    let values = sqlx::query_scalar::<_, String>(&sql).fetch_all(pool).await?;
    Ok(values)
}

pub async fn options(pool: &SqlitePool) -> anyhow::Result<FilterOptions> {
    Ok(FilterOptions {
        units: distinct_values(pool, "unit").await?,
        formations: distinct_values(pool, "formation").await?,
        categories: distinct_values(pool, "category").await?,
        purposes: distinct_values(pool, "purpose").await?,
    })
}

/// Latest logs whose vehicle matches every filter that is set.
pub async fn search(pool: &SqlitePool, filter: &LogFilter) -> anyhow::Result<Vec<LogDetail>> {
    let rows = sqlx::query_as::<_, LogDetail>(
        r#"SELECT l.rfid, l.cpid, l.timestamp, c.lane,
                  v.category, v.ba_no, v.unit, v.formation, v.purpose
           FROM logs l
           JOIN vehicles v ON l.rfid = v.rfid
           JOIN checkpoints c ON l.cpid = c.cpid
           WHERE ($1 IS NULL OR v.unit = $1)
             AND ($2 IS NULL OR v.formation = $2)
             AND ($3 IS NULL OR v.category = $3)
             AND ($4 IS NULL OR v.purpose = $4)
           ORDER BY l.timestamp DESC, l.id DESC
           LIMIT $5"#,
    )
    .bind(&filter.unit)
    .bind(&filter.formation)
    .bind(&filter.category)
    .bind(&filter.purpose)
    .bind(SEARCH_LIMIT)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
