//! Nutrition lookup results.
//!
//! Models the food-database parser response (`hints[].food.nutrients`)
//! and reduces it to the energy value the ledger needs. The HTTP client
//! lives outside this crate; anything that can produce a response body
//! implements [`NutritionLookup`].

use crate::{Error, MealEntry, MealType, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level search response
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FoodSearchResponse {
    #[serde(default)]
    pub hints: Vec<Hint>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Hint {
    pub food: Food,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Food {
    pub label: String,
    pub image: Option<String>,
    #[serde(default)]
    pub nutrients: Nutrients,
}

/// Nutrient values per serving as reported by the food database
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Nutrients {
    #[serde(rename = "ENERC_KCAL")]
    pub energy_kcal: Option<f64>,
    #[serde(rename = "PROCNT")]
    pub protein_g: Option<f64>,
    #[serde(rename = "FAT")]
    pub fat_g: Option<f64>,
    #[serde(rename = "CHOCDF")]
    pub carbs_g: Option<f64>,
}

/// The food chosen from a search, with its energy value resolved
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FoodMatch {
    pub label: String,
    pub energy_kcal: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
}

impl FoodSearchResponse {
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Take the first hint, requiring it to carry an energy value
    pub fn first_match(&self) -> Result<FoodMatch> {
        let food = self
            .hints
            .first()
            .map(|hint| &hint.food)
            .ok_or_else(|| Error::Nutrition("no matching food found".into()))?;

        let energy_kcal = food
            .nutrients
            .energy_kcal
            .filter(|kcal| kcal.is_finite() && *kcal >= 0.0)
            .ok_or_else(|| {
                Error::Nutrition(format!(
                    "calories information not available for {}",
                    food.label
                ))
            })?;

        Ok(FoodMatch {
            label: food.label.clone(),
            energy_kcal,
            protein_g: food.nutrients.protein_g.unwrap_or(0.0),
            fat_g: food.nutrients.fat_g.unwrap_or(0.0),
            carbs_g: food.nutrients.carbs_g.unwrap_or(0.0),
        })
    }
}

impl FoodMatch {
    pub fn into_meal_entry(self, day: NaiveDate, meal_type: MealType) -> MealEntry {
        MealEntry::new(day, self.energy_kcal, meal_type).with_food_label(self.label)
    }
}

/// Source of nutrition information for a free-text food query
pub trait NutritionLookup {
    fn lookup(&self, query: &str) -> Result<FoodMatch>;
}

/// Lookup backed by a response body previously saved to disk
pub struct SavedResponseLookup {
    path: PathBuf,
}

impl SavedResponseLookup {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl NutritionLookup for SavedResponseLookup {
    fn lookup(&self, query: &str) -> Result<FoodMatch> {
        let body = std::fs::read_to_string(&self.path)?;
        let response = FoodSearchResponse::from_json(&body)?;
        let found = response.first_match()?;
        tracing::info!(
            "Resolved {:?} to {} ({:.0} kcal)",
            query,
            found.label,
            found.energy_kcal
        );
        Ok(found)
    }
}
