// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Months};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, StockroomError};
use crate::models::Recurrence;

static TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4}-\d{2}-\d{2})(?:[Tt ](\d{2}:\d{2})(:\d{2}(?:\.\d+)?)?)?\s*(Z|z|[+-]\d{2}(?::?\d{2})?)?$",
    )
    .expect("static timestamp pattern")
});

const WEEK_SECS: i64 = 7 * 24 * 60 * 60;

/// Parses the loosely formatted timestamps found in stored rows.
///
/// Accepts a space instead of `T`, a missing offset (read as UTC), a bare
/// date (midnight UTC), and two-digit or compact offsets (`+05`, `+0530`).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    let caps = TIMESTAMP
        .captures(trimmed)
        .ok_or_else(|| StockroomError::InvalidTimestamp(raw.to_string()))?;

    let date = &caps[1];
    let hm = caps.get(2).map_or("00:00", |m| m.as_str());
    let secs = caps.get(3).map_or(":00", |m| m.as_str());
    let offset = match caps.get(4).map(|m| m.as_str()) {
        None | Some("Z") | Some("z") => "Z".to_string(),
        Some(off) => {
            let digits: String = off[1..].chars().filter(|c| *c != ':').collect();
            let (hh, mm) = digits.split_at(2);
            let mm = if mm.is_empty() { "00" } else { mm };
            format!("{}{}:{}", &off[..1], hh, mm)
        }
    };
    let normalized = format!("{date}T{hm}{secs}{offset}");
    DateTime::parse_from_rfc3339(&normalized)
        .map_err(|_| StockroomError::InvalidTimestamp(raw.to_string()))
}

enum Step {
    Weeks(i64),
    Months(u32),
}

fn step_for(rule: Recurrence) -> Option<Step> {
    match rule {
        Recurrence::None => None,
        Recurrence::Weekly => Some(Step::Weeks(1)),
        Recurrence::Biweekly => Some(Step::Weeks(2)),
        Recurrence::Monthly => Some(Step::Months(1)),
        Recurrence::Quarterly => Some(Step::Months(3)),
    }
}

fn ceil_div(n: i64, d: i64) -> i64 {
    if n <= 0 { 0 } else { (n + d - 1) / d }
}

/// First occurrence at or after `now`.
///
/// A one-off reminder has an occurrence only while its start is still ahead.
/// Month steps are always taken from `start`, so a reminder on the 31st
/// clamps to short months without drifting.
pub fn next_occurrence(
    start: DateTime<FixedOffset>,
    rule: Recurrence,
    now: DateTime<FixedOffset>,
) -> Option<DateTime<FixedOffset>> {
    if start >= now {
        return Some(start);
    }
    match step_for(rule)? {
        Step::Weeks(step) => {
            let weeks = ceil_div((now - start).num_seconds(), WEEK_SECS);
            let mut n = ceil_div(weeks, step) * step;
            let mut candidate = start.checked_add_signed(Duration::weeks(n))?;
            while candidate < now {
                n += step;
                candidate = start.checked_add_signed(Duration::weeks(n))?;
            }
            Some(candidate)
        }
        Step::Months(step) => {
            let local_now = now.with_timezone(start.offset());
            let months = (local_now.year() - start.year()) as i64 * 12
                + local_now.month() as i64
                - start.month() as i64;
            let mut n = u32::try_from(ceil_div(months, step as i64) * step as i64).ok()?;
            let mut candidate = start.checked_add_months(Months::new(n))?;
            while candidate < now {
                n += step;
                candidate = start.checked_add_months(Months::new(n))?;
            }
            Some(candidate)
        }
    }
}

/// Day-level check in the offset of `now`.
pub fn is_due_today(
    start: DateTime<FixedOffset>,
    rule: Recurrence,
    now: DateTime<FixedOffset>,
) -> bool {
    next_occurrence(start, rule, now)
        .is_some_and(|next| next.with_timezone(now.offset()).date_naive() == now.date_naive())
}
