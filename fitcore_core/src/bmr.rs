//! Daily energy budget calculation.
//!
//! Budget = Mifflin-St Jeor BMR × activity multiplier:
//! - male: `10·kg + 6.25·cm − 5·age + 5`
//! - female / other: `10·kg + 6.25·cm − 5·age − 161`
//!
//! Everything here is a pure function of its arguments.

use crate::{Error, Result, UserProfile};
use chrono::NaiveDate;
use serde::Serialize;

/// Daily budget together with how it was obtained
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BudgetEstimate {
    pub kcal: f64,
    /// Why the default was substituted, if it was
    pub fallback: Option<String>,
}

impl BudgetEstimate {
    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Whole years between `date_of_birth` and `as_of`, floored
///
/// Returns `None` when `as_of` is before the date of birth.
pub fn age_on(date_of_birth: NaiveDate, as_of: NaiveDate) -> Option<u32> {
    as_of.years_since(date_of_birth)
}

/// Compute the daily energy budget (kcal) for `profile` as of `as_of`
///
/// Fails with [`Error::InvalidProfile`] if height or weight is absent or
/// non-positive, or if the date of birth is absent or after `as_of`.
pub fn compute_daily_budget(profile: &UserProfile, as_of: NaiveDate) -> Result<f64> {
    let height_cm = positive(profile.height_cm, "height")?;
    let weight_kg = positive(profile.weight_kg, "weight")?;

    let date_of_birth = profile
        .date_of_birth
        .ok_or_else(|| Error::InvalidProfile("date of birth is missing".into()))?;
    let age = age_on(date_of_birth, as_of).ok_or_else(|| {
        Error::InvalidProfile(format!(
            "date of birth {} is after {}",
            date_of_birth, as_of
        ))
    })?;

    let bmr = basal_metabolic_rate(profile, weight_kg, height_cm, age);
    let budget = (bmr * profile.activity_level.multiplier()).max(0.0);

    tracing::debug!(
        age,
        bmr,
        multiplier = profile.activity_level.multiplier(),
        budget,
        "Computed daily budget"
    );

    Ok(budget)
}

/// Compute the daily budget, substituting `default_kcal` for an invalid profile
pub fn estimate_daily_budget(
    profile: &UserProfile,
    as_of: NaiveDate,
    default_kcal: f64,
) -> BudgetEstimate {
    match compute_daily_budget(profile, as_of) {
        Ok(kcal) => BudgetEstimate {
            kcal,
            fallback: None,
        },
        Err(e) => {
            tracing::warn!(
                "{}. Using default budget of {} kcal",
                e,
                default_kcal
            );
            BudgetEstimate {
                kcal: default_kcal,
                fallback: Some(e.to_string()),
            }
        }
    }
}

fn basal_metabolic_rate(profile: &UserProfile, weight_kg: f64, height_cm: f64, age: u32) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age);
    match profile.sex {
        crate::BiologicalSex::Male => base + 5.0,
        crate::BiologicalSex::Female | crate::BiologicalSex::Other => base - 161.0,
    }
}

fn positive(value: Option<f64>, field: &str) -> Result<f64> {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        Some(v) => Err(Error::InvalidProfile(format!(
            "{} must be positive, got {}",
            field, v
        ))),
        None => Err(Error::InvalidProfile(format!("{} is missing", field))),
    }
}
