//! Daily calorie ledger.
//!
//! One ledger per user per day. Meals accrue against the day's budget and
//! are rejected outright if they would exceed it. At the local day boundary
//! the ledger rolls over: consumed resets to zero and the budget is
//! recomputed from the latest profile.
//!
//! The ledger is a single-writer value (`&mut self`); callers that share it
//! across threads must serialize access themselves.

use crate::bmr::estimate_daily_budget;
use crate::{ConsumedRecord, Error, MealEntry, Result, UserProfile};
use chrono::NaiveDate;

/// Persistence sink for the consumed total
///
/// The ledger calls this after every change it originates. Failures are
/// logged and otherwise ignored; the in-memory total stays authoritative.
pub trait ConsumedSink {
    fn persist(&mut self, record: &ConsumedRecord) -> Result<()>;
}

/// Sink that discards every record
#[derive(Debug, Default)]
pub struct NullSink;

impl ConsumedSink for NullSink {
    fn persist(&mut self, _record: &ConsumedRecord) -> Result<()> {
        Ok(())
    }
}

pub struct CalorieLedger {
    budget: f64,
    consumed: f64,
    day: NaiveDate,
    profile: UserProfile,
    default_budget: f64,
    fallback_budget: bool,
    sink: Box<dyn ConsumedSink>,
}

impl std::fmt::Debug for CalorieLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalorieLedger")
            .field("budget", &self.budget)
            .field("consumed", &self.consumed)
            .field("day", &self.day)
            .field("fallback_budget", &self.fallback_budget)
            .finish()
    }
}

impl CalorieLedger {
    /// Create a ledger for `day` with nothing consumed yet
    pub fn new(
        profile: UserProfile,
        day: NaiveDate,
        default_budget: f64,
        sink: Box<dyn ConsumedSink>,
    ) -> Self {
        let mut ledger = Self {
            budget: default_budget,
            consumed: 0.0,
            day,
            profile,
            default_budget,
            fallback_budget: false,
            sink,
        };
        ledger.recompute_budget();
        ledger
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn consumed(&self) -> f64 {
        self.consumed
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// True when the current budget is the configured default rather than
    /// one computed from the profile
    pub fn is_fallback_budget(&self) -> bool {
        self.fallback_budget
    }

    /// Calories still available today, never negative
    pub fn remaining(&self) -> f64 {
        (self.budget - self.consumed).max(0.0)
    }

    /// Add a meal's calories to today's total
    ///
    /// Returns the new total. A meal that would take the total past the
    /// budget is rejected with [`Error::OverBudget`] and nothing changes;
    /// landing exactly on the budget is allowed.
    pub fn record_meal(&mut self, calories: f64) -> Result<f64> {
        self.check_meal(calories)?;

        self.consumed += calories;
        tracing::debug!(calories, consumed = self.consumed, "Recorded meal");
        self.persist();
        Ok(self.consumed)
    }

    /// Check that `calories` could be recorded now, without recording it
    pub fn check_meal(&self, calories: f64) -> Result<()> {
        validate_calories(calories)?;

        if self.consumed + calories > self.budget {
            tracing::info!(
                calories,
                consumed = self.consumed,
                budget = self.budget,
                "Rejected meal over budget"
            );
            return Err(Error::OverBudget {
                requested: calories,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    /// Check a [`MealEntry`] against this ledger's day and budget
    pub fn check_entry(&self, entry: &MealEntry) -> Result<()> {
        if entry.day != self.day {
            return Err(Error::InvalidInput(format!(
                "meal for {} cannot be recorded on the ledger for {}",
                entry.day, self.day
            )));
        }
        self.check_meal(entry.calories)
    }

    /// Record a [`MealEntry`]; same rules as [`record_meal`](Self::record_meal)
    pub fn record_entry(&mut self, entry: &MealEntry) -> Result<f64> {
        self.check_entry(entry)?;
        let total = self.record_meal(entry.calories)?;
        tracing::info!(
            "Recorded {} ({}): {:.0} kcal",
            entry.meal_type,
            entry.food_label.as_deref().unwrap_or("manual entry"),
            entry.calories
        );
        Ok(total)
    }

    /// Overwrite the consumed total from an authoritative external source
    ///
    /// No budget check is applied. The sink is not notified since the
    /// value came from storage in the first place.
    pub fn set_consumed(&mut self, total: f64) -> Result<()> {
        validate_calories(total)?;
        tracing::debug!(previous = self.consumed, total, "Consumed total overwritten");
        self.consumed = total;
        Ok(())
    }

    /// Advance the ledger to `as_of_day`
    ///
    /// Returns `true` if the ledger rolled over. Days at or before the
    /// current one are ignored, so repeated or late boundary signals are
    /// harmless.
    pub fn rollover(&mut self, as_of_day: NaiveDate) -> bool {
        if as_of_day <= self.day {
            tracing::debug!(
                "Ignoring rollover to {} (ledger already on {})",
                as_of_day,
                self.day
            );
            return false;
        }

        tracing::info!(
            "Rolling over from {} to {} ({:.0} kcal consumed)",
            self.day,
            as_of_day,
            self.consumed
        );
        self.day = as_of_day;
        self.consumed = 0.0;
        self.recompute_budget();
        self.persist();
        true
    }

    /// Replace the profile and recompute today's budget from it
    pub fn update_profile(&mut self, profile: UserProfile) {
        self.profile = profile;
        self.recompute_budget();
    }

    fn recompute_budget(&mut self) {
        let estimate = estimate_daily_budget(&self.profile, self.day, self.default_budget);
        self.budget = estimate.kcal;
        self.fallback_budget = estimate.is_fallback();
    }

    fn persist(&mut self) {
        let record = ConsumedRecord {
            day: self.day,
            consumed: self.consumed,
        };
        if let Err(e) = self.sink.persist(&record) {
            tracing::warn!("Failed to persist consumed total for {}: {}", self.day, e);
        }
    }
}

fn validate_calories(calories: f64) -> Result<()> {
    if !calories.is_finite() || calories < 0.0 {
        return Err(Error::InvalidInput(format!(
            "calories must be a non-negative number, got {}",
            calories
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActivityLevel, BiologicalSex, MealType};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct RecordingSink {
        records: Rc<RefCell<Vec<ConsumedRecord>>>,
    }

    impl ConsumedSink for RecordingSink {
        fn persist(&mut self, record: &ConsumedRecord) -> Result<()> {
            self.records.borrow_mut().push(record.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl ConsumedSink for FailingSink {
        fn persist(&mut self, _record: &ConsumedRecord) -> Result<()> {
            Err(Error::State("disk full".into()))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Profile with no weight, so the ledger runs on the default budget
    fn fallback_profile() -> UserProfile {
        UserProfile {
            date_of_birth: Some(date(1990, 1, 1)),
            sex: BiologicalSex::Female,
            height_cm: Some(165.0),
            weight_kg: None,
            activity_level: ActivityLevel::NotActive,
        }
    }

    fn complete_profile() -> UserProfile {
        UserProfile {
            date_of_birth: Some(date(2004, 3, 1)),
            sex: BiologicalSex::Male,
            height_cm: Some(182.0),
            weight_kg: Some(78.0),
            activity_level: ActivityLevel::ModeratelyActive,
        }
    }

    fn ledger_with_budget_2000() -> CalorieLedger {
        CalorieLedger::new(
            fallback_profile(),
            date(2024, 6, 1),
            2000.0,
            Box::new(NullSink),
        )
    }

    fn assert_remaining_invariant(ledger: &CalorieLedger) {
        assert_eq!(
            ledger.remaining(),
            (ledger.budget() - ledger.consumed()).max(0.0)
        );
        assert!(ledger.consumed() >= 0.0);
    }

    #[test]
    fn test_new_ledger_uses_profile_budget() {
        let ledger = CalorieLedger::new(
            complete_profile(),
            date(2024, 6, 1),
            2000.0,
            Box::new(NullSink),
        );
        assert!((ledger.budget() - 2824.875).abs() < 1e-9);
        assert!(!ledger.is_fallback_budget());
        assert_eq!(ledger.consumed(), 0.0);
    }

    #[test]
    fn test_invalid_profile_uses_default_budget() {
        let ledger = ledger_with_budget_2000();
        assert_eq!(ledger.budget(), 2000.0);
        assert!(ledger.is_fallback_budget());
    }

    #[test]
    fn test_over_budget_meal_rejected_without_change() {
        let mut ledger = ledger_with_budget_2000();

        let result = ledger.record_meal(2500.0);

        match result {
            Err(Error::OverBudget {
                requested,
                remaining,
            }) => {
                assert_eq!(requested, 2500.0);
                assert_eq!(remaining, 2000.0);
            }
            other => panic!("expected OverBudget, got {:?}", other),
        }
        assert_eq!(ledger.consumed(), 0.0);
        assert_remaining_invariant(&ledger);
    }

    #[test]
    fn test_meal_landing_exactly_on_budget_succeeds() {
        let mut ledger = ledger_with_budget_2000();
        ledger.set_consumed(1800.0).unwrap();

        let total = ledger.record_meal(200.0).unwrap();

        assert_eq!(total, 2000.0);
        assert_eq!(ledger.remaining(), 0.0);
        assert!(matches!(
            ledger.record_meal(0.5),
            Err(Error::OverBudget { .. })
        ));
        assert!(ledger.record_meal(0.0).is_ok());
    }

    #[test]
    fn test_record_meal_is_monotonic() {
        let mut ledger = ledger_with_budget_2000();
        let mut previous = ledger.consumed();

        for calories in [100.0, 0.0, 750.0, 5000.0, 300.0, 900.0, 1.0] {
            let _ = ledger.record_meal(calories);
            assert!(ledger.consumed() >= previous);
            previous = ledger.consumed();
            assert_remaining_invariant(&ledger);
        }
        assert_eq!(ledger.consumed(), 1150.0 + 1.0);
    }

    #[test]
    fn test_negative_and_nan_calories_rejected() {
        let mut ledger = ledger_with_budget_2000();
        assert!(matches!(
            ledger.record_meal(-1.0),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            ledger.record_meal(f64::NAN),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            ledger.set_consumed(-10.0),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(ledger.consumed(), 0.0);
    }

    #[test]
    fn test_set_consumed_skips_budget_check() {
        let mut ledger = ledger_with_budget_2000();
        ledger.set_consumed(2600.0).unwrap();
        assert_eq!(ledger.consumed(), 2600.0);
        assert_eq!(ledger.remaining(), 0.0);
        assert_remaining_invariant(&ledger);
    }

    #[test]
    fn test_rollover_resets_and_recomputes() {
        let mut ledger = CalorieLedger::new(
            complete_profile(),
            date(2024, 2, 29),
            2000.0,
            Box::new(NullSink),
        );
        ledger.set_consumed(1500.0).unwrap();
        let budget_d1 = ledger.budget();

        assert!(ledger.rollover(date(2024, 3, 1)));

        assert_eq!(ledger.day(), date(2024, 3, 1));
        assert_eq!(ledger.consumed(), 0.0);
        assert_eq!(ledger.remaining(), ledger.budget());
        // Birthday on the new day: one year older
        assert!((budget_d1 - ledger.budget() - 5.0 * 1.55).abs() < 1e-9);
    }

    #[test]
    fn test_rollover_is_idempotent() {
        let sink = RecordingSink::default();
        let records = sink.records.clone();
        let mut ledger = CalorieLedger::new(
            complete_profile(),
            date(2024, 6, 1),
            2000.0,
            Box::new(sink),
        );
        ledger.record_meal(400.0).unwrap();

        assert!(ledger.rollover(date(2024, 6, 2)));
        ledger.record_meal(250.0).unwrap();
        let budget = ledger.budget();

        assert!(!ledger.rollover(date(2024, 6, 2)));
        assert!(!ledger.rollover(date(2024, 6, 1)));

        assert_eq!(ledger.day(), date(2024, 6, 2));
        assert_eq!(ledger.consumed(), 250.0);
        assert_eq!(ledger.budget(), budget);
        assert_eq!(records.borrow().len(), 3);
    }

    #[test]
    fn test_sink_receives_totals() {
        let sink = RecordingSink::default();
        let records = sink.records.clone();
        let mut ledger = CalorieLedger::new(
            fallback_profile(),
            date(2024, 6, 1),
            2000.0,
            Box::new(sink),
        );

        ledger.record_meal(300.0).unwrap();
        ledger.record_meal(200.0).unwrap();
        let _ = ledger.record_meal(5000.0);
        ledger.set_consumed(100.0).unwrap();
        ledger.rollover(date(2024, 6, 2));

        let records = records.borrow();
        let totals: Vec<f64> = records.iter().map(|r| r.consumed).collect();
        assert_eq!(totals, vec![300.0, 500.0, 0.0]);
        assert_eq!(records[2].day, date(2024, 6, 2));
    }

    #[test]
    fn test_sink_failure_does_not_fail_meal() {
        crate::logging::init_test();
        let mut ledger = CalorieLedger::new(
            fallback_profile(),
            date(2024, 6, 1),
            2000.0,
            Box::new(FailingSink),
        );

        assert_eq!(ledger.record_meal(500.0).unwrap(), 500.0);
        assert_eq!(ledger.consumed(), 500.0);
    }

    #[test]
    fn test_update_profile_recomputes_current_day() {
        let mut ledger = ledger_with_budget_2000();
        ledger.record_meal(1000.0).unwrap();

        ledger.update_profile(complete_profile());

        assert_eq!(ledger.day(), date(2024, 6, 1));
        assert!((ledger.budget() - 2824.875).abs() < 1e-9);
        assert!(!ledger.is_fallback_budget());
        assert_eq!(ledger.consumed(), 1000.0);
        assert_remaining_invariant(&ledger);
    }

    #[test]
    fn test_update_profile_to_invalid_falls_back() {
        let mut ledger = CalorieLedger::new(
            complete_profile(),
            date(2024, 6, 1),
            1800.0,
            Box::new(NullSink),
        );
        ledger.update_profile(fallback_profile());
        assert_eq!(ledger.budget(), 1800.0);
        assert!(ledger.is_fallback_budget());
    }

    #[test]
    fn test_record_entry_checks_day() {
        let mut ledger = ledger_with_budget_2000();
        let today = MealEntry::new(date(2024, 6, 1), 450.0, MealType::Lunch)
            .with_food_label("Pasta");
        let yesterday = MealEntry::new(date(2024, 5, 31), 450.0, MealType::Dinner);

        assert_eq!(ledger.record_entry(&today).unwrap(), 450.0);
        assert!(matches!(
            ledger.record_entry(&yesterday),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(ledger.consumed(), 450.0);
    }

    #[test]
    fn test_check_entry_leaves_ledger_untouched() {
        let sink = RecordingSink::default();
        let ledger = CalorieLedger::new(
            fallback_profile(),
            date(2024, 6, 1),
            2000.0,
            Box::new(sink.clone()),
        );

        let fits = MealEntry::new(date(2024, 6, 1), 2000.0, MealType::Dinner);
        let too_big = MealEntry::new(date(2024, 6, 1), 2000.5, MealType::Dinner);
        let other_day = MealEntry::new(date(2024, 6, 2), 10.0, MealType::Lunch);

        assert!(ledger.check_entry(&fits).is_ok());
        assert!(matches!(
            ledger.check_entry(&too_big),
            Err(Error::OverBudget { .. })
        ));
        assert!(matches!(
            ledger.check_entry(&other_day),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(ledger.consumed(), 0.0);
        assert!(sink.records.borrow().is_empty());
    }
}
