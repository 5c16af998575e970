use std::collections::BTreeMap;

use lw_common::checkpoint::{FINAL_CHECKPOINT, checkpoint_id, checkpoint_number};
use lw_common::models::{CheckpointCount, CheckpointRow, LaneCount, LogDetail};
use sqlx::{FromRow, SqlitePool};

#[derive(FromRow)]
pub struct LaneCheckpointCount {
    pub lane: String,
    pub cpid: String,
    pub vehicle_count: i64,
}

pub async fn checkpoint_counts(pool: &SqlitePool) -> anyhow::Result<Vec<LaneCheckpointCount>> {
    let rows = sqlx::query_as::<_, LaneCheckpointCount>(
        r#"SELECT c.lane, c.cpid, COUNT(DISTINCT l.rfid) AS vehicle_count
           FROM logs l
           JOIN checkpoints c ON l.cpid = c.cpid
           GROUP BY c.lane, c.cpid"#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Distinct vehicles per checkpoint of one lane, in checkpoint order.
pub async fn lane_checkpoint_counts(
    pool: &SqlitePool,
    lane: &str,
) -> anyhow::Result<Vec<CheckpointCount>> {
    let mut rows = sqlx::query_as::<_, CheckpointCount>(
        r#"SELECT c.cpid, COUNT(DISTINCT l.rfid) AS vehicle_count
           FROM logs l
           JOIN checkpoints c ON l.cpid = c.cpid
           WHERE c.lane = $1
           GROUP BY c.cpid"#,
    )
    .bind(lane)
    .fetch_all(pool)
    .await?;
    rows.sort_by_key(|r| checkpoint_number(&r.cpid).unwrap_or(u32::MAX));
    Ok(rows)
}

/// Rows in `transit_logs` per lane.
pub async fn transit_lane_counts(pool: &SqlitePool) -> anyhow::Result<Vec<LaneCount>> {
    let rows = sqlx::query_as::<_, LaneCount>(
        r#"SELECT c.lane, COUNT(*) AS vehicle_count
           FROM transit_logs t
           JOIN checkpoints c ON t.cpid = c.cpid
           GROUP BY c.lane
           ORDER BY c.lane"#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn recent_logs(pool: &SqlitePool, limit: i64) -> anyhow::Result<Vec<LogDetail>> {
    let rows = sqlx::query_as::<_, LogDetail>(
        r#"SELECT l.rfid, l.cpid, l.timestamp, c.lane,
                  v.category, v.ba_no, v.unit, v.formation, v.purpose
           FROM logs l
           JOIN vehicles v ON l.rfid = v.rfid
           JOIN checkpoints c ON l.cpid = c.cpid
           ORDER BY l.timestamp DESC, l.id DESC
           LIMIT $1"#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// One row per checkpoint number `CP1..CP10`, with a count column for every lane.
pub fn checkpoint_matrix(lanes: &[String], counts: &[LaneCheckpointCount]) -> Vec<CheckpointRow> {
    let by_cpid: BTreeMap<&str, i64> = counts
        .iter()
        .map(|c| (c.cpid.as_str(), c.vehicle_count))
        .collect();

    (1..=FINAL_CHECKPOINT)
        .map(|n| CheckpointRow {
            checkpoint: format!("CP{n}"),
            lanes: lanes
                .iter()
                .map(|lane| {
                    let count = by_cpid
                        .get(checkpoint_id(lane, n).as_str())
                        .copied()
                        .unwrap_or(0);
                    (lane.clone(), count)
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{logs, now, test_pool};
    use chrono::Duration;

    #[test]
    fn matrix_fills_missing_cells_with_zero() {
        let lanes = vec!["L1".to_string(), "L2".to_string()];
        let counts = vec![
            LaneCheckpointCount { lane: "L1".into(), cpid: "L1_CP1".into(), vehicle_count: 3 },
            LaneCheckpointCount { lane: "L2".into(), cpid: "L2_CP10".into(), vehicle_count: 1 },
        ];

        let matrix = checkpoint_matrix(&lanes, &counts);
        assert_eq!(matrix.len(), 10);
        assert_eq!(matrix[0].checkpoint, "CP1");
        assert_eq!(matrix[0].lanes["L1"], 3);
        assert_eq!(matrix[0].lanes["L2"], 0);
        assert_eq!(matrix[9].lanes["L2"], 1);
    }

    #[tokio::test]
    async fn lane_checkpoints_sort_numerically() {
        let pool = test_pool().await;
        let t = now();
        for (i, cp) in ["L1_CP2", "L1_CP10", "L1_CP1"].iter().enumerate() {
            logs::insert(&pool, "RFID001", cp, t + Duration::minutes(i as i64)).await.unwrap();
        }
        logs::insert(&pool, "RFID005", "L1_CP1", t).await.unwrap();

        let rows = lane_checkpoint_counts(&pool, "L1").await.unwrap();
        let cpids: Vec<_> = rows.iter().map(|r| r.cpid.as_str()).collect();
        assert_eq!(cpids, ["L1_CP1", "L1_CP2", "L1_CP10"]);
        assert_eq!(rows[0].vehicle_count, 2);

        assert!(lane_checkpoint_counts(&pool, "L3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn recent_logs_are_newest_first_and_limited() {
        let pool = test_pool().await;
        let t = now();
        for n in 1..=4 {
            logs::insert(&pool, "RFID003", &format!("L3_CP{n}"), t + Duration::minutes(n)).await.unwrap();
        }

        let rows = recent_logs(&pool, 2).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cpid, "L3_CP4");
        assert_eq!(rows[0].lane, "L3");
        assert_eq!(rows[0].ba_no.as_deref(), Some("BA003"));
        assert_eq!(rows[1].cpid, "L3_CP3");
    }
}
