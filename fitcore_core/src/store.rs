//! Consumed-total persistence with file locking.
//!
//! The snapshot is the durable copy of the ledger's `(day, consumed)`
//! pair. It is the source of truth on startup: drivers load it and feed
//! it back through `CalorieLedger::set_consumed`.

use crate::ledger::ConsumedSink;
use crate::{ConsumedRecord, Error, Result};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Last persisted consumed total
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LedgerSnapshot {
    pub day: NaiveDate,
    pub consumed: f64,
}

impl From<&ConsumedRecord> for LedgerSnapshot {
    fn from(record: &ConsumedRecord) -> Self {
        Self {
            day: record.day,
            consumed: record.consumed,
        }
    }
}

impl LedgerSnapshot {
    /// Load the snapshot with a shared lock
    ///
    /// Returns `None` if the file doesn't exist or can't be read/parsed;
    /// problems are logged, not raised.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            tracing::info!("No ledger snapshot found at {:?}", path);
            return Ok(None);
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open snapshot {:?}: {}. Ignoring it.", path, e);
                return Ok(None);
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock snapshot {:?}: {}. Ignoring it.", path, e);
            return Ok(None);
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read snapshot {:?}: {}. Ignoring it.", path, e);
            return Ok(None);
        }

        file.unlock()?;

        match serde_json::from_str::<LedgerSnapshot>(&contents) {
            Ok(snapshot) if snapshot.consumed.is_finite() && snapshot.consumed >= 0.0 => {
                tracing::debug!("Loaded ledger snapshot from {:?}", path);
                Ok(Some(snapshot))
            }
            Ok(snapshot) => {
                tracing::warn!(
                    "Snapshot {:?} has invalid consumed total {}. Ignoring it.",
                    path,
                    snapshot.consumed
                );
                Ok(None)
            }
            Err(e) => {
                tracing::warn!("Failed to parse snapshot {:?}: {}. Ignoring it.", path, e);
                Ok(None)
            }
        }
    }

    /// Save the snapshot atomically (temp file, fsync, rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::State(format!("snapshot path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved ledger snapshot to {:?}", path);
        Ok(())
    }
}

/// [`ConsumedSink`] that writes every record as the snapshot file
pub struct SnapshotSink {
    path: PathBuf,
}

impl SnapshotSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConsumedSink for SnapshotSink {
    fn persist(&mut self, record: &ConsumedRecord) -> Result<()> {
        LedgerSnapshot::from(record).save(&self.path)
    }
}
