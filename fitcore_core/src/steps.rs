//! Step-count based energy estimates.

use crate::config::StepsConfig;
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

/// Energy burned walking `steps` at a flat per-step rate
pub fn calories_from_steps(steps: u32, kcal_per_step: f64) -> f64 {
    f64::from(steps) * kcal_per_step
}

/// Fraction of `goal` achieved, clamped to `[0, 1]`
pub fn progress(value: f64, goal: f64) -> f64 {
    if goal <= 0.0 || !goal.is_finite() {
        return 0.0;
    }
    (value / goal).clamp(0.0, 1.0)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StepSummary {
    pub steps: u32,
    pub burned_kcal: f64,
    pub burn_progress: f64,
    pub step_progress: f64,
    pub steps_remaining: u32,
}

impl StepSummary {
    pub fn for_day(steps: u32, config: &StepsConfig) -> Self {
        let burned_kcal = calories_from_steps(steps, config.kcal_per_step);
        Self {
            steps,
            burned_kcal,
            burn_progress: progress(burned_kcal, config.daily_burn_goal_kcal),
            step_progress: progress(f64::from(steps), f64::from(config.daily_step_goal)),
            steps_remaining: config.daily_step_goal.saturating_sub(steps),
        }
    }
}

/// The seven days, Monday through Sunday, of the week containing `date`
pub fn week_starting_monday(date: NaiveDate) -> [NaiveDate; 7] {
    let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    std::array::from_fn(|i| monday + Duration::days(i as i64))
}
