//! Local day-boundary detection.
//!
//! Drivers either poll [`DayBoundary::observe`] on a fixed interval or
//! sleep for [`duration_until_next_midnight`] and reschedule after each
//! fire. Either way the new day is reported once.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};

/// Today's date in the local time zone
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Time remaining until the next local midnight after `now`
///
/// Falls back to the naive difference when midnight does not exist in
/// the zone (a DST gap at 00:00).
pub fn duration_until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    let tomorrow = now.date_naive().succ_opt().unwrap_or(NaiveDate::MAX);
    let midnight = tomorrow.and_hms_opt(0, 0, 0).unwrap_or_default();

    match now.timezone().from_local_datetime(&midnight).earliest() {
        Some(next) => next.signed_duration_since(now.clone()),
        None => midnight.signed_duration_since(now.naive_local()),
    }
}

/// Tracks the last observed calendar day
#[derive(Clone, Debug)]
pub struct DayBoundary {
    current: NaiveDate,
}

impl DayBoundary {
    pub fn new(today: NaiveDate) -> Self {
        Self { current: today }
    }

    pub fn current(&self) -> NaiveDate {
        self.current
    }

    /// Report `today` if it is later than the last observed day
    pub fn observe(&mut self, today: NaiveDate) -> Option<NaiveDate> {
        if today > self.current {
            tracing::debug!("Day boundary crossed: {} -> {}", self.current, today);
            self.current = today;
            Some(today)
        } else {
            None
        }
    }
}
