//! CSV archive of past days' meals.
//!
//! On rollover, entries from earlier days move out of the JSONL meal log
//! into an append-only CSV history. The CSV is fsynced before the log is
//! rewritten, so a crash in between duplicates rows rather than losing
//! them.

use crate::meal_log::MealLog;
use crate::{MealEntry, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV archive
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    id: String,
    day: NaiveDate,
    meal_type: String,
    food_label: Option<String>,
    calories: f64,
    logged_at: String,
}

impl From<&MealEntry> for CsvRow {
    fn from(entry: &MealEntry) -> Self {
        CsvRow {
            id: entry.id.to_string(),
            day: entry.day,
            meal_type: entry.meal_type.to_string(),
            food_label: entry.food_label.clone(),
            calories: entry.calories,
            logged_at: entry.logged_at.to_rfc3339(),
        }
    }
}

/// Move meals logged before `day` from `log` into the CSV at `csv_path`
///
/// Returns the number of meals archived.
pub fn archive_days_before(log: &MealLog, csv_path: &Path, day: NaiveDate) -> Result<usize> {
    let meals = log.read_meals()?;
    let (past, current): (Vec<_>, Vec<_>) = meals.into_iter().partition(|m| m.day < day);

    if past.is_empty() {
        tracing::debug!("No meals before {} to archive", day);
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for entry in &past {
        writer.serialize(CsvRow::from(entry))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    log.replace_all(&current)?;

    tracing::info!(
        "Archived {} meals from before {} to {:?}",
        past.len(),
        day,
        csv_path
    );
    Ok(past.len())
}

/// Total calories per day recorded in the archive
///
/// Rows that fail to parse are skipped with a warning. Rows duplicated by
/// an interrupted archive run are counted once.
pub fn daily_totals(csv_path: &Path) -> Result<BTreeMap<NaiveDate, f64>> {
    let mut totals = BTreeMap::new();
    if !csv_path.exists() {
        return Ok(totals);
    }

    let mut reader = ReaderBuilder::new().has_headers(true).from_path(csv_path)?;
    let mut seen = std::collections::HashSet::new();

    for result in reader.deserialize::<CsvRow>() {
        match result {
            Ok(row) => {
                if seen.insert(row.id.clone()) {
                    *totals.entry(row.day).or_insert(0.0) += row.calories;
                }
            }
            Err(e) => {
                tracing::warn!("Failed to deserialize archive row: {}", e);
            }
        }
    }

    Ok(totals)
}
