// 📤 Result-row export - one flat row per (athlete, result)
//
// Rows carry a content hash uid so a downstream table can upsert them
// idempotently across runs.

use crate::deduplication::ResultKey;
use crate::model::{Athlete, ResultRecord};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub result_uid: String,
    pub fis_code: String,
    pub date: Option<String>,
    pub place: Option<String>,
    pub category: Option<String>,
    pub category_code: String,
    pub discipline: Option<String>,
    pub rank: Option<u32>,
    pub result_code: Option<String>,
    pub fis_points: f64,
    pub cup_points: f64,
}

/// Stable uid: SHA-256 over the athlete code and the result identity key
pub fn result_uid(fis_code: &str, result: &ResultRecord) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}|{}", fis_code, ResultKey::of(result).joined()));
    format!("{:x}", hasher.finalize())
}

pub fn result_rows(athletes: &[Athlete]) -> Vec<ResultRow> {
    athletes
        .iter()
        .filter(|a| !a.fis_code.is_empty())
        .flat_map(|a| {
            a.recent_results.iter().map(move |r| ResultRow {
                result_uid: result_uid(&a.fis_code, r),
                fis_code: a.fis_code.clone(),
                date: r.date.clone(),
                place: r.place.clone(),
                category: r.category.clone(),
                category_code: r.category_code.clone(),
                discipline: r.discipline.clone(),
                rank: r.rank,
                result_code: r.result_code.clone(),
                fis_points: r.fis_points,
                cup_points: r.cup_points,
            })
        })
        .collect()
}

pub fn write_csv<W: Write>(rows: &[ResultRow], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row).context("Failed to write result row")?;
    }
    wtr.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

/// Write every result row of a set to a CSV file, returns the row count
pub fn export_csv<P: AsRef<Path>>(athletes: &[Athlete], path: P) -> Result<usize> {
    let rows = result_rows(athletes);
    let file = File::create(path.as_ref())
        .with_context(|| format!("Failed to create export file: {:?}", path.as_ref()))?;
    write_csv(&rows, file)?;
    Ok(rows.len())
}
