//! Append-only meal log.
//!
//! Meals are appended to a JSONL (JSON Lines) file with file locking.
//! The log is the durable record the consumed total can be re-derived
//! from after a meal is deleted.

use crate::{Error, MealEntry, Result};
use chrono::NaiveDate;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// JSONL meal log with file locking
pub struct MealLog {
    path: PathBuf,
}

impl MealLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append one meal as a line
    ///
    /// A torn last line (no trailing newline) is terminated first so the
    /// new entry starts on a line of its own.
    pub fn append(&self, entry: &MealEntry) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let torn = ends_without_newline(&file)?;
        let mut writer = std::io::BufWriter::new(&file);
        if torn {
            tracing::warn!("Meal log {:?} ends in a partial line", self.path);
            writer.write_all(b"\n")?;
        }
        let line = serde_json::to_string(entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;

        tracing::debug!("Appended meal {} to log", entry.id);
        Ok(())
    }

    /// Read all meals; unparsable lines are skipped with a warning
    pub fn read_meals(&self) -> Result<Vec<MealEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let reader = BufReader::new(&file);
        let mut meals = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<MealEntry>(&line) {
                Ok(entry) => meals.push(entry),
                Err(e) => {
                    tracing::warn!("Failed to parse meal at line {}: {}", line_num + 1, e);
                }
            }
        }

        file.unlock()?;
        tracing::debug!("Read {} meals from log", meals.len());
        Ok(meals)
    }

    pub fn meals_for_day(&self, day: NaiveDate) -> Result<Vec<MealEntry>> {
        Ok(self
            .read_meals()?
            .into_iter()
            .filter(|m| m.day == day)
            .collect())
    }

    /// Sum of calories logged for `day`
    pub fn total_for_day(&self, day: NaiveDate) -> Result<f64> {
        Ok(self.meals_for_day(day)?.iter().map(|m| m.calories).sum())
    }

    /// Remove the meal with `id`, rewriting the log atomically
    pub fn remove_meal(&self, id: Uuid) -> Result<MealEntry> {
        let meals = self.read_meals()?;
        let (removed, kept): (Vec<_>, Vec<_>) = meals.into_iter().partition(|m| m.id == id);

        let removed = removed
            .into_iter()
            .next()
            .ok_or_else(|| Error::Other(format!("No meal with id {}", id)))?;

        self.replace_all(&kept)?;
        tracing::info!("Removed meal {} from log", id);
        Ok(removed)
    }

    /// Replace the log contents with `meals`
    pub(crate) fn replace_all(&self, meals: &[MealEntry]) -> Result<()> {
        self.ensure_parent_dir()?;
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::State(format!("meal log {:?} has no parent", self.path)))?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            for meal in meals {
                serde_json::to_writer(&mut writer, meal)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

/// True if the file is non-empty and its last byte is not a newline
fn ends_without_newline(mut file: &File) -> Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MealType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_append_and_read_single_meal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log = MealLog::new(temp_dir.path().join("meals.jsonl"));

        let entry = MealEntry::new(date(2024, 6, 1), 420.0, MealType::Breakfast);
        let id = entry.id;
        log.append(&entry).unwrap();

        let meals = log.read_meals().unwrap();
        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0].id, id);
        assert_eq!(meals[0].meal_type, MealType::Breakfast);
    }

    #[test]
    fn test_total_for_day_only_counts_that_day() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log = MealLog::new(temp_dir.path().join("meals.jsonl"));

        log.append(&MealEntry::new(date(2024, 6, 1), 400.0, MealType::Breakfast))
            .unwrap();
        log.append(&MealEntry::new(date(2024, 6, 1), 650.0, MealType::Lunch))
            .unwrap();
        log.append(&MealEntry::new(date(2024, 6, 2), 300.0, MealType::Breakfast))
            .unwrap();

        assert_eq!(log.total_for_day(date(2024, 6, 1)).unwrap(), 1050.0);
        assert_eq!(log.total_for_day(date(2024, 6, 2)).unwrap(), 300.0);
        assert_eq!(log.total_for_day(date(2024, 6, 3)).unwrap(), 0.0);
    }

    #[test]
    fn test_remove_meal_rewrites_log() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log = MealLog::new(temp_dir.path().join("meals.jsonl"));

        let keep = MealEntry::new(date(2024, 6, 1), 400.0, MealType::Breakfast);
        let dropped = MealEntry::new(date(2024, 6, 1), 650.0, MealType::Other("snack".into()));
        log.append(&keep).unwrap();
        log.append(&dropped).unwrap();

        let removed = log.remove_meal(dropped.id).unwrap();

        assert_eq!(removed.calories, 650.0);
        let meals = log.read_meals().unwrap();
        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0].id, keep.id);
        assert!(log.remove_meal(dropped.id).is_err());
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("meals.jsonl");
        let log = MealLog::new(&path);

        log.append(&MealEntry::new(date(2024, 6, 1), 100.0, MealType::Lunch))
            .unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{ not a meal").unwrap();
        drop(file);
        log.append(&MealEntry::new(date(2024, 6, 1), 200.0, MealType::Dinner))
            .unwrap();

        assert_eq!(log.read_meals().unwrap().len(), 2);
    }

    #[test]
    fn test_append_after_partial_line_keeps_new_meal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("meals.jsonl");
        let log = MealLog::new(&path);

        log.append(&MealEntry::new(date(2024, 6, 1), 250.0, MealType::Lunch))
            .unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        write!(file, "{{\"id\":\"partial").unwrap();
        drop(file);
        log.append(&MealEntry::new(date(2024, 6, 1), 400.0, MealType::Dinner))
            .unwrap();

        assert_eq!(log.read_meals().unwrap().len(), 2);
        assert_eq!(log.total_for_day(date(2024, 6, 1)).unwrap(), 650.0);
    }

    #[test]
    fn test_read_missing_log_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log = MealLog::new(temp_dir.path().join("nope.jsonl"));
        assert!(log.read_meals().unwrap().is_empty());
    }
}
