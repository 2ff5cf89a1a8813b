//! Weekly sampling checkpoints.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};

/// Returns the Monday 00:00 UTC at or before `now`.
#[must_use]
pub fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_since_monday = i64::from(now.weekday().num_days_from_monday());
    (now.date_naive() - Duration::days(days_since_monday))
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// Returns the sampling checkpoints for a run starting at `now`, oldest
/// first.
///
/// The newest checkpoint is the start of the current week; older ones follow
/// every `interval_weeks` weeks while they are less than `max_weeks` weeks
/// back. Returns nothing when either argument is zero.
#[must_use]
pub fn checkpoints(now: DateTime<Utc>, max_weeks: u32, interval_weeks: u32) -> Vec<DateTime<Utc>> {
    if max_weeks == 0 || interval_weeks == 0 {
        return Vec::new();
    }

    let newest = week_start(now);
    let count = max_weeks.div_ceil(interval_weeks);
    (0..count)
        .rev()
        .map(|step| newest - Duration::weeks(i64::from(step * interval_weeks)))
        .collect()
}
