use chrono::{DateTime, Utc};
use lw_common::models::{LaneActivity, LogDetail};
use sqlx::{FromRow, SqlitePool};

/// Latest log per vehicle, joined with vehicle details and lane.
pub async fn current_positions(pool: &SqlitePool) -> anyhow::Result<Vec<LogDetail>> {
    let rows = sqlx::query_as::<_, LogDetail>(
        r#"SELECT l.rfid, l.cpid, l.timestamp, c.lane,
                  v.category, v.ba_no, v.unit, v.formation, v.purpose
           FROM logs l
           JOIN (
               SELECT rfid, MAX(timestamp) AS max_time
               FROM logs
               GROUP BY rfid
           ) latest ON l.rfid = latest.rfid AND l.timestamp = latest.max_time
           JOIN checkpoints c ON l.cpid = c.cpid
           JOIN vehicles v ON v.rfid = l.rfid
           WHERE l.id = (SELECT MAX(t.id) FROM logs t
                         WHERE t.rfid = l.rfid AND t.timestamp = l.timestamp)
           ORDER BY l.timestamp DESC, l.rfid"#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Per-lane distinct vehicles and latest log since `since`.
pub async fn lane_activity(pool: &SqlitePool, since: DateTime<Utc>) -> anyhow::Result<Vec<LaneActivity>> {
    let rows = sqlx::query_as::<_, LaneActivity>(
        r#"SELECT c.lane,
                  COUNT(DISTINCT l.rfid) AS active_vehicles,
                  MAX(l.timestamp) AS last_activity
           FROM logs l
           JOIN checkpoints c ON l.cpid = c.cpid
           WHERE l.timestamp >= $1
           GROUP BY c.lane
           ORDER BY c.lane"#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[derive(Debug, FromRow)]
pub struct LanePosition {
    pub rfid: String,
    pub cpid: String,
    pub lane: String,
    pub category: String,
}

/// Latest checkpoint of every vehicle within each lane it has visited.
pub async fn lane_positions(pool: &SqlitePool) -> anyhow::Result<Vec<LanePosition>> {
    let rows = sqlx::query_as::<_, LanePosition>(
        r#"SELECT l.rfid, l.cpid, c.lane, v.category
           FROM logs l
           JOIN checkpoints c ON l.cpid = c.cpid
           JOIN vehicles v ON l.rfid = v.rfid
           JOIN (
               SELECT l.rfid, c.lane, MAX(l.timestamp) AS max_time
               FROM logs l
               JOIN checkpoints c ON l.cpid = c.cpid
               GROUP BY l.rfid, c.lane
           ) latest_per_lane
             ON l.rfid = latest_per_lane.rfid
            AND c.lane = latest_per_lane.lane
            AND l.timestamp = latest_per_lane.max_time
           WHERE l.id = (
               SELECT MAX(t.id)
               FROM logs t
               JOIN checkpoints tc ON t.cpid = tc.cpid
               WHERE t.rfid = l.rfid AND tc.lane = c.lane AND t.timestamp = l.timestamp
           )
           ORDER BY c.lane, l.rfid"#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{logs, now, test_pool};
    use chrono::Duration;

    #[tokio::test]
    async fn positions_and_lane_activity() {
        let pool = test_pool().await;
        let t = now();

        logs::insert(&pool, "RFID001", "L1_CP1", t - Duration::hours(3)).await.unwrap();
        logs::insert(&pool, "RFID001", "L1_CP2", t - Duration::minutes(5)).await.unwrap();
        logs::insert(&pool, "RFID002", "L2_CP1", t - Duration::hours(2)).await.unwrap();

        let positions = current_positions(&pool).await.unwrap();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].rfid, "RFID001");
        assert_eq!(positions[0].cpid, "L1_CP2");
        assert_eq!(positions[1].cpid, "L2_CP1");

        let active = lane_activity(&pool, t - Duration::hours(1)).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].lane, "L1");
        assert_eq!(active[0].active_vehicles, 1);
        assert_eq!(active[0].last_activity, Some(t - Duration::minutes(5)));
    }

    #[tokio::test]
    async fn lane_positions_keep_one_row_per_lane_visit() {
        let pool = test_pool().await;
        let t = now();

        logs::insert(&pool, "RFID001", "L1_CP3", t).await.unwrap();
        logs::insert(&pool, "RFID001", "L1_CP4", t + Duration::minutes(2)).await.unwrap();
        logs::insert(&pool, "RFID001", "L2_CP1", t + Duration::minutes(4)).await.unwrap();

        let rows = lane_positions(&pool).await.unwrap();
        let summary: Vec<_> = rows.iter().map(|r| (r.lane.as_str(), r.cpid.as_str())).collect();
        assert_eq!(summary, [("L1", "L1_CP4"), ("L2", "L2_CP1")]);
    }

    #[tokio::test]
    async fn lane_positions_break_timestamp_ties() {
        let pool = test_pool().await;
        let t = now();

        logs::insert(&pool, "RFID001", "L1_CP1", t).await.unwrap();
        logs::insert(&pool, "RFID001", "L1_CP2", t).await.unwrap();

        let rows = lane_positions(&pool).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cpid, "L1_CP2");
    }
}
