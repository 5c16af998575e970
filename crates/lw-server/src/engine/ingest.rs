use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, Utc};
use lw_common::checkpoint::{VehicleCategory, checkpoint_number, is_final_checkpoint};
use lw_common::models::UploadSummary;
use lw_common::protocol::{MovementEvent, MovementSource};
use thiserror::Error;

use crate::db;
use crate::state::AppState;

const REQUIRED_COLUMNS: [&str; 3] = ["rfid", "cpid", "timestamp"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SheetError {
    #[error("Sheet is empty")]
    Empty,

    #[error("Missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub rfid: String,
    pub cpid: String,
    pub timestamp: DateTime<Utc>,
}

/// Parsed upload: `None` marks a data row whose fields could not be read.
#[derive(Debug)]
pub struct Sheet {
    pub rows: Vec<Option<SheetRow>>,
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc).trunc_subsecs(0));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%d/%m/%Y %H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts.and_utc().trunc_subsecs(0));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
}

fn sheet_row(record: &csv::StringRecord, rfid_idx: usize, cpid_idx: usize, ts_idx: usize) -> Option<SheetRow> {
    let rfid = record.get(rfid_idx).filter(|s| !s.is_empty())?.to_string();
    let cpid = record.get(cpid_idx).filter(|s| !s.is_empty())?.to_string();
    let timestamp = parse_timestamp(record.get(ts_idx)?)?;
    Some(SheetRow { rfid, cpid, timestamp })
}

/// Reads a CSV movement sheet with `rfid`, `cpid` and `timestamp` header
/// columns in any order. Extra columns are ignored and quoted fields may
/// contain commas.
pub fn parse_sheet(text: &str) -> Result<Sheet, SheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.trim_start_matches('\u{feff}').as_bytes());

    let header = reader.headers().map_err(|_| SheetError::Empty)?;
    if header.iter().all(str::is_empty) {
        return Err(SheetError::Empty);
    }
    let columns: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_ascii_lowercase(), i))
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !columns.contains_key(**c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SheetError::MissingColumns(missing));
    }
    let (rfid_idx, cpid_idx, ts_idx) = (columns["rfid"], columns["cpid"], columns["timestamp"]);

    let mut rows = Vec::new();
    for record in reader.records() {
        match record {
            Ok(record) if record.iter().all(str::is_empty) => continue,
            Ok(record) => rows.push(sheet_row(&record, rfid_idx, cpid_idx, ts_idx)),
            Err(_) => rows.push(None),
        }
    }

    Ok(Sheet { rows })
}

/// Writes every acceptable sheet row in one transaction. Vehicles whose
/// uploaded rows never reach the final checkpoint also get those rows in
/// `transit_logs`. Rows naming an unknown checkpoint, an unknown vehicle or a
/// vehicle without a BA number are counted as skipped.
pub async fn ingest(state: &AppState, sheet: Sheet) -> anyhow::Result<UploadSummary> {
    let mut tx = state.pool.begin().await?;

    let vehicles: HashMap<String, Option<String>> = db::vehicles::list(&mut *tx)
        .await?
        .into_iter()
        .map(|v| (v.rfid, v.ba_no))
        .collect();
    let checkpoints: HashMap<String, String> = db::checkpoints::list(&mut *tx)
        .await?
        .into_iter()
        .map(|c| (c.cpid, c.lane))
        .collect();

    let mut inserted = 0u64;
    let mut skipped = 0u64;
    let mut recategorized = HashSet::new();
    let mut accepted: BTreeMap<String, Vec<SheetRow>> = BTreeMap::new();

    for row in sheet.rows {
        let Some(row) = row else {
            skipped += 1;
            continue;
        };
        // Category is derived from the BA number; rows without one are skipped.
        let Some(Some(ba_no)) = vehicles.get(&row.rfid) else {
            skipped += 1;
            continue;
        };
        if !checkpoints.contains_key(&row.cpid) {
            skipped += 1;
            continue;
        }

        if recategorized.insert(row.rfid.clone()) {
            let category = VehicleCategory::from_ba_no(ba_no);
            db::vehicles::update_category(&mut *tx, &row.rfid, category.as_str()).await?;
        }

        db::logs::insert(&mut *tx, &row.rfid, &row.cpid, row.timestamp).await?;
        accepted.entry(row.rfid.clone()).or_default().push(row);
        inserted += 1;
    }

    for rows in accepted.values() {
        if rows.iter().any(|r| is_final_checkpoint(&r.cpid)) {
            continue;
        }
        for row in rows {
            db::logs::insert_transit(&mut *tx, &row.rfid, &row.cpid, row.timestamp).await?;
        }
    }

    tx.commit().await?;

    tracing::info!(inserted, skipped, "Movement sheet ingested");

    for row in accepted.into_values().flatten() {
        state.publish(MovementEvent {
            lane: checkpoints.get(&row.cpid).cloned().unwrap_or_default(),
            checkpoint: checkpoint_number(&row.cpid),
            rfid: row.rfid,
            cpid: row.cpid,
            timestamp: row.timestamp,
            source: MovementSource::Upload,
        });
    }

    Ok(UploadSummary {
        message: "Upload Complete".to_string(),
        inserted,
        skipped,
    })
}
