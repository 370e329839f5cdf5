// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Calendar dates in the configured timezone.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// Format used for send dates everywhere: ledgers, markers, and seeds.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an IANA zone name, falling back to UTC with a warning.
pub fn resolve_timezone(name: &str) -> Tz {
    match name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            warn!(timezone = name, "could not load timezone, falling back to UTC");
            Tz::UTC
        }
    }
}

/// `YYYY-MM-DD` for `now` in the named timezone.
pub fn today(tz_name: &str, now: DateTime<Utc>) -> String {
    now.with_timezone(&resolve_timezone(tz_name))
        .format(DATE_FORMAT)
        .to_string()
}

/// The day before `date`, or `None` when `date` is not `YYYY-MM-DD`.
pub fn previous_day(date: &str) -> Option<String> {
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .ok()?
        .pred_opt()
        .map(|d| d.format(DATE_FORMAT).to_string())
}

/// The date's digits read as one integer: `2026-02-06` seeds `20260206`.
pub fn date_seed(date: &str) -> u64 {
    let digits: String = date.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn today_respects_timezone() {
        let now = Utc.with_ymd_and_hms(2026, 2, 6, 23, 30, 0).unwrap();
        assert_eq!(today("UTC", now), "2026-02-06");
        assert_eq!(today("Europe/Berlin", now), "2026-02-07");
        assert_eq!(today("America/Los_Angeles", now), "2026-02-06");
    }

    #[test]
    fn unknown_timezone_uses_utc() {
        let now = Utc.with_ymd_and_hms(2026, 2, 6, 23, 30, 0).unwrap();
        assert_eq!(today("Mars/Olympus", now), "2026-02-06");
    }

    #[test]
    fn previous_day_crosses_month_and_year() {
        assert_eq!(previous_day("2026-03-01").as_deref(), Some("2026-02-28"));
        assert_eq!(previous_day("2026-01-01").as_deref(), Some("2025-12-31"));
        assert_eq!(previous_day("not a date"), None);
    }

    #[test]
    fn seed_is_date_digits() {
        assert_eq!(date_seed("2026-02-06"), 20260206);
        assert_eq!(date_seed(""), 0);
    }
}
