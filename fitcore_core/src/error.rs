//! Error types for the fitcore_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for fitcore_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Profile is missing or has non-positive biometric fields
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    /// Meal would push consumed calories past the daily budget
    #[error(
        "Over budget: {requested:.0} kcal requested but only {remaining:.0} kcal remaining"
    )]
    OverBudget { requested: f64, remaining: f64 },

    /// Negative or non-finite calorie value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Nutrition lookup produced no usable energy value
    #[error("Nutrition lookup error: {0}")]
    Nutrition(String),

    /// Persisted state error
    #[error("State error: {0}")]
    State(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
