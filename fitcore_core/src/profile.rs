//! Profile document handling.
//!
//! The profile store keeps a flat string-keyed document per user
//! (`dateOfBirth`, `gender`, `height`, `weight`, `activityLevel`) with
//! display-formatted values such as `"182 cm"` or `"05/14/2004"`. This
//! module converts that document into a typed [`UserProfile`] and back,
//! and reads/writes it as a JSON file.

use crate::{ActivityLevel, BiologicalSex, Result, UserProfile};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const KEY_DATE_OF_BIRTH: &str = "dateOfBirth";
pub const KEY_GENDER: &str = "gender";
pub const KEY_HEIGHT: &str = "height";
pub const KEY_WEIGHT: &str = "weight";
pub const KEY_ACTIVITY_LEVEL: &str = "activityLevel";

const DATE_OF_BIRTH_FORMAT: &str = "%m/%d/%Y";

/// Raw profile document as stored remotely
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ProfileDocument(pub HashMap<String, String>);

impl ProfileDocument {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Render a typed profile in the store's display format
    pub fn from_profile(profile: &UserProfile) -> Self {
        let mut doc = Self::default();
        if let Some(dob) = profile.date_of_birth {
            doc.set(KEY_DATE_OF_BIRTH, dob.format(DATE_OF_BIRTH_FORMAT).to_string());
        }
        doc.set(KEY_GENDER, profile.sex.label());
        if let Some(height) = profile.height_cm {
            doc.set(KEY_HEIGHT, format!("{} cm", height));
        }
        if let Some(weight) = profile.weight_kg {
            doc.set(KEY_WEIGHT, format!("{} kg", weight));
        }
        if profile.activity_level != ActivityLevel::Unrecognized {
            doc.set(KEY_ACTIVITY_LEVEL, profile.activity_level.label());
        }
        doc
    }
}

impl UserProfile {
    /// Convert a profile document into a typed profile
    ///
    /// Missing or unparsable numeric fields become `None`; the budget
    /// calculator then reports the profile as invalid.
    pub fn from_document(doc: &ProfileDocument) -> Self {
        let date_of_birth = doc.get(KEY_DATE_OF_BIRTH).and_then(|raw| {
            let parsed = parse_date_of_birth(raw);
            if parsed.is_none() {
                tracing::warn!("Unrecognized date of birth {:?}", raw);
            }
            parsed
        });

        UserProfile {
            date_of_birth,
            sex: doc
                .get(KEY_GENDER)
                .map(BiologicalSex::parse)
                .unwrap_or_default(),
            height_cm: doc.get(KEY_HEIGHT).and_then(parse_measurement),
            weight_kg: doc.get(KEY_WEIGHT).and_then(parse_measurement),
            activity_level: doc
                .get(KEY_ACTIVITY_LEVEL)
                .map(ActivityLevel::parse)
                .unwrap_or_default(),
        }
    }
}

/// Extract the leading number from a measurement such as `"182 cm"` or `"78.5kg"`
pub fn parse_measurement(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let end = trimmed
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());

    trimmed[..end].parse::<f64>().ok()
}

/// Parse a date of birth in `MM/DD/YYYY` or ISO `YYYY-MM-DD` form
pub fn parse_date_of_birth(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_OF_BIRTH_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

/// Load a profile document from a JSON file
///
/// Returns an empty document if the file doesn't exist or is corrupted;
/// the budget then falls back to the configured default.
pub fn load_profile(path: &Path) -> Result<ProfileDocument> {
    if !path.exists() {
        tracing::info!("No profile found at {:?}, using empty profile", path);
        return Ok(ProfileDocument::default());
    }

    let contents = std::fs::read_to_string(path)?;
    match serde_json::from_str::<ProfileDocument>(&contents) {
        Ok(doc) => {
            tracing::debug!("Loaded profile from {:?}", path);
            Ok(doc)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse profile {:?}: {}. Using empty profile.",
                path,
                e
            );
            Ok(ProfileDocument::default())
        }
    }
}

/// Save a profile document as pretty JSON
pub fn save_profile(path: &Path, doc: &ProfileDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(doc)?;
    std::fs::write(path, contents)?;
    tracing::debug!("Saved profile to {:?}", path);
    Ok(())
}
