use lw_common::models::{CategoryCount, LaneCount, Vehicle, VehiclePosition};
use sqlx::{SqliteExecutor, SqlitePool};

pub async fn get_by_rfid<'e, E: SqliteExecutor<'e>>(
    executor: E,
    rfid: &str,
) -> anyhow::Result<Option<Vehicle>> {
    let vehicle = sqlx::query_as::<_, Vehicle>(
        r#"SELECT rfid, sno, ba_no, category, unit, formation, lane, troops, purpose
           FROM vehicles WHERE rfid = $1"#,
    )
    .bind(rfid)
    .fetch_optional(executor)
    .await?;
    Ok(vehicle)
}

pub async fn list<'e, E: SqliteExecutor<'e>>(executor: E) -> anyhow::Result<Vec<Vehicle>> {
    let vehicles = sqlx::query_as::<_, Vehicle>(
        r#"SELECT rfid, sno, ba_no, category, unit, formation, lane, troops, purpose
           FROM vehicles ORDER BY sno, rfid"#,
    )
    .fetch_all(executor)
    .await?;
    Ok(vehicles)
}

/// Every vehicle with its latest log row. Vehicles that were never logged
/// come last with an empty position.
pub async fn list_with_positions(pool: &SqlitePool) -> anyhow::Result<Vec<VehiclePosition>> {
    let rows = sqlx::query_as::<_, VehiclePosition>(
        r#"SELECT v.rfid, v.ba_no, v.category, v.unit, v.formation, v.lane, v.troops, v.purpose,
                  l.cpid, l.timestamp, c.lane AS current_lane
           FROM vehicles v
           LEFT JOIN (
               SELECT l1.rfid, l1.cpid, l1.timestamp
               FROM logs l1
               WHERE l1.timestamp = (SELECT MAX(l2.timestamp) FROM logs l2 WHERE l2.rfid = l1.rfid)
                 AND l1.id = (SELECT MAX(l3.id) FROM logs l3
                              WHERE l3.rfid = l1.rfid AND l3.timestamp = l1.timestamp)
           ) l ON v.rfid = l.rfid
           LEFT JOIN checkpoints c ON l.cpid = c.cpid
           ORDER BY l.timestamp DESC, v.rfid"#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Distinct vehicles seen per lane across all logs.
pub async fn lane_counts(pool: &SqlitePool) -> anyhow::Result<Vec<LaneCount>> {
    let rows = sqlx::query_as::<_, LaneCount>(
        r#"SELECT c.lane, COUNT(DISTINCT l.rfid) AS vehicle_count
           FROM logs l
           JOIN checkpoints c ON l.cpid = c.cpid
           GROUP BY c.lane
           ORDER BY c.lane"#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn category_counts(pool: &SqlitePool) -> anyhow::Result<Vec<CategoryCount>> {
    let rows = sqlx::query_as::<_, CategoryCount>(
        r#"SELECT category, COUNT(*) AS count
           FROM vehicles
           GROUP BY category
           ORDER BY category"#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn update_category<'e, E: SqliteExecutor<'e>>(
    executor: E,
    rfid: &str,
    category: &str,
) -> anyhow::Result<()> {
    sqlx::query("UPDATE vehicles SET category = $2 WHERE rfid = $1")
        .bind(rfid)
        .bind(category)
        .execute(executor)
        .await?;
    Ok(())
}
