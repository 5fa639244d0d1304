// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing of platform-reported review timestamps.
//!
//! Accepted forms, tried in order:
//! - RFC 3339 with an explicit offset (`2026-03-01T12:30:00+09:00`)
//! - `YYYY-MM-DD`, `YYYY.MM.DD` or `YYYY/MM/DD`, optionally followed by
//!   ` HH:MM` or ` HH:MM:SS` (or a `T` separator)
//!
//! Zone-less forms are read in the configured platform offset. The result is
//! always normalized to UTC.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

use replyd_core::ReplydError;

/// Storage format for normalized timestamps.
pub const UTC_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const DATE_SEPARATORS: [char; 3] = ['-', '.', '/'];

/// Build the platform offset from whole hours east of UTC.
pub fn offset_from_hours(hours: i32) -> Result<FixedOffset, ReplydError> {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| ReplydError::Config(format!("invalid timezone offset: {hours} hours")))
}

/// Parse a raw platform timestamp. Returns `None` if no accepted form matches.
pub fn parse_reviewed_at(raw: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = parse_naive(raw)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse and format in [`UTC_FORMAT`].
pub fn normalize_reviewed_at(raw: &str, offset: FixedOffset) -> Option<String> {
    parse_reviewed_at(raw, offset).map(|dt| dt.format(UTC_FORMAT).to_string())
}

fn parse_naive(raw: &str) -> Option<NaiveDateTime> {
    for sep in DATE_SEPARATORS {
        let date = format!("%Y{sep}%m{sep}%d");
        for time in [" %H:%M:%S", " %H:%M", "T%H:%M:%S", "T%H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, &format!("{date}{time}")) {
                return Some(dt);
            }
        }
        if let Ok(d) = NaiveDate::parse_from_str(raw, &date) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}
