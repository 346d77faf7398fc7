//! Rollup period boundary computation
//!
//! All boundaries are UTC. Weeks start on Sunday.

use chrono::{Datelike, Duration, TimeZone, Timelike, Utc};

use crate::data::types::PeriodType;
use crate::utils::time::millis_to_datetime;

/// Start and end (exclusive) of the period containing `at_millis`,
/// as epoch milliseconds
pub fn period_bounds(period_type: PeriodType, at_millis: i64) -> (i64, i64) {
    let at = millis_to_datetime(at_millis);

    match period_type {
        PeriodType::Hour => {
            let start = at
                .with_minute(0)
                .and_then(|d| d.with_second(0))
                .and_then(|d| d.with_nanosecond(0))
                .unwrap_or(at);
            (start.timestamp_millis(), (start + Duration::hours(1)).timestamp_millis())
        }
        PeriodType::Day => {
            let start = day_start(at.year(), at.month(), at.day());
            (start, start + 86_400_000)
        }
        PeriodType::Week => {
            // Week starts on Sunday
            let days_back = at.weekday().num_days_from_sunday() as i64;
            let sunday = at.date_naive() - Duration::days(days_back);
            let start = day_start(sunday.year(), sunday.month(), sunday.day());
            (start, start + 7 * 86_400_000)
        }
        PeriodType::Month => {
            let start = day_start(at.year(), at.month(), 1);
            let (next_year, next_month) = if at.month() == 12 {
                (at.year() + 1, 1)
            } else {
                (at.year(), at.month() + 1)
            };
            (start, day_start(next_year, next_month, 1))
        }
    }
}

fn day_start(year: i32, month: u32, day: u32) -> i64 {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .map(|d| d.timestamp_millis())
        .unwrap_or(0)
}
