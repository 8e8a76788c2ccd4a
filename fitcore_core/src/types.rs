//! Core domain types for FitCore.
//!
//! This module defines the fundamental types used throughout the system:
//! - The user's biometric profile
//! - Meal entries fed into the ledger
//! - Records the ledger hands to its persistence sink

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Profile Types
// ============================================================================

/// Biological sex used to select the BMR formula
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BiologicalSex {
    Male,
    Female,
    #[default]
    #[serde(other)]
    Other,
}

impl BiologicalSex {
    /// Parse a free-form label ("Male", "female", ...). Anything else is `Other`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "male" | "m" => BiologicalSex::Male,
            "female" | "f" => BiologicalSex::Female,
            _ => BiologicalSex::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BiologicalSex::Male => "Male",
            BiologicalSex::Female => "Female",
            BiologicalSex::Other => "Other",
        }
    }
}

/// Self-reported activity level
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    NotActive,
    ModeratelyActive,
    ExtremelyActive,
    /// Level the calculator has no multiplier for (uses 1.0)
    #[default]
    #[serde(other)]
    Unrecognized,
}

impl ActivityLevel {
    /// Parse labels such as "Not active", "moderately-active" or "extremely_active".
    pub fn parse(label: &str) -> Self {
        let normalized: String = label
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == '_' { ' ' } else { c })
            .collect();

        match normalized.split_whitespace().collect::<Vec<_>>().join(" ").as_str() {
            "not active" | "sedentary" => ActivityLevel::NotActive,
            "moderately active" | "moderate" => ActivityLevel::ModeratelyActive,
            "extremely active" | "extreme" => ActivityLevel::ExtremelyActive,
            _ => ActivityLevel::Unrecognized,
        }
    }

    /// TDEE multiplier applied to the BMR
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::NotActive => 1.2,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::ExtremelyActive => 1.9,
            ActivityLevel::Unrecognized => 1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityLevel::NotActive => "Not active",
            ActivityLevel::ModeratelyActive => "Moderately active",
            ActivityLevel::ExtremelyActive => "Extremely active",
            ActivityLevel::Unrecognized => "Unrecognized",
        }
    }
}

/// A user's biometric profile
///
/// Fields that may be missing from the profile store are optional; the
/// calculator reports them as an invalid profile instead of guessing.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct UserProfile {
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub sex: BiologicalSex,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub activity_level: ActivityLevel,
}

// ============================================================================
// Meal Types
// ============================================================================

/// Which meal an entry belongs to
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Other(String),
}

impl MealType {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "breakfast" => MealType::Breakfast,
            "lunch" => MealType::Lunch,
            "dinner" => MealType::Dinner,
            _ => MealType::Other(label.trim().to_string()),
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MealType::Breakfast => write!(f, "Breakfast"),
            MealType::Lunch => write!(f, "Lunch"),
            MealType::Dinner => write!(f, "Dinner"),
            MealType::Other(label) => write!(f, "{}", label),
        }
    }
}

/// A single logged meal
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MealEntry {
    pub id: Uuid,
    /// Calendar day the calories were credited to
    pub day: NaiveDate,
    pub calories: f64,
    pub meal_type: MealType,
    pub food_label: Option<String>,
    pub logged_at: DateTime<Utc>,
}

impl MealEntry {
    pub fn new(day: NaiveDate, calories: f64, meal_type: MealType) -> Self {
        Self {
            id: Uuid::new_v4(),
            day,
            calories,
            meal_type,
            food_label: None,
            logged_at: Utc::now(),
        }
    }

    pub fn with_food_label(mut self, label: impl Into<String>) -> Self {
        self.food_label = Some(label.into());
        self
    }
}

// ============================================================================
// Persistence Types
// ============================================================================

/// Consumed total handed to the ledger's sink after every change
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConsumedRecord {
    pub day: NaiveDate,
    pub consumed: f64,
}
