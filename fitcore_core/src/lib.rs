#![forbid(unsafe_code)]

//! Core domain model and business logic for FitCore.
//!
//! This crate provides:
//! - Domain types (profile, meals, consumed records)
//! - Daily budget calculation (BMR × activity)
//! - The daily calorie ledger with midnight rollover
//! - Profile document validation, nutrition responses, step estimates
//! - Persistence (snapshot, meal log, CSV archive)

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod bmr;
pub mod ledger;
pub mod profile;
pub mod day_boundary;
pub mod nutrition;
pub mod steps;
pub mod store;
pub mod meal_log;
pub mod archive;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use bmr::{compute_daily_budget, estimate_daily_budget, BudgetEstimate};
pub use ledger::{CalorieLedger, ConsumedSink, NullSink};
pub use profile::{load_profile, save_profile, ProfileDocument};
pub use day_boundary::{duration_until_next_midnight, local_today, DayBoundary};
pub use nutrition::{FoodMatch, FoodSearchResponse, NutritionLookup, SavedResponseLookup};
pub use steps::StepSummary;
pub use store::{LedgerSnapshot, SnapshotSink};
pub use meal_log::MealLog;
