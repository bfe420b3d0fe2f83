//! Timestamp extraction from object keys and folder names.
//!
//! Layouts are tried from most to least specific. Within a layout the last
//! occurrence in the name wins, so leading run ids or hashes are skipped. An
//! occurrence whose calendar values are invalid is skipped rather than
//! reported, and occurrences glued to a longer run of digits never match.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

struct Layout {
    name: &'static str,
    pattern: Regex,
    parse: fn(&Captures<'_>) -> Option<NaiveDateTime>,
}

impl Layout {
    fn new(
        name: &'static str,
        pattern: &str,
        parse: fn(&Captures<'_>) -> Option<NaiveDateTime>,
    ) -> Self {
        Self {
            name,
            // Patterns are anchored; the scan supplies the start offset.
            pattern: Regex::new(&format!("^(?:{})", pattern))
                .unwrap_or_else(|e| panic!("invalid timestamp layout {}: {}", name, e)),
            parse,
        }
    }
}

static LAYOUTS: Lazy<Vec<Layout>> = Lazy::new(|| {
    vec![
        // YYYY-MM-DD[T_]HH-MM-SS or YYYY-MM-DD[T_]HH:MM:SS
        Layout::new(
            "date-time-seconds",
            r"(\d{4})-(\d{2})-(\d{2})[T_](\d{2})(?:-(\d{2})-(\d{2})|:(\d{2}):(\d{2}))",
            |c| {
                let minute = c.get(5).or_else(|| c.get(7))?;
                let second = c.get(6).or_else(|| c.get(8))?;
                datetime(
                    &c[1],
                    &c[2],
                    &c[3],
                    &c[4],
                    minute.as_str(),
                    second.as_str(),
                )
            },
        ),
        // YYYY-MM-DD[T_]HH-MM
        Layout::new(
            "date-time-minutes",
            r"(\d{4})-(\d{2})-(\d{2})[T_](\d{2})[-:](\d{2})",
            |c| datetime(&c[1], &c[2], &c[3], &c[4], &c[5], "00"),
        ),
        // YYYYMMDD[T_]HHMMSS
        Layout::new(
            "compact-date-time",
            r"(\d{4})(\d{2})(\d{2})[T_](\d{2})(\d{2})(\d{2})",
            |c| datetime(&c[1], &c[2], &c[3], &c[4], &c[5], &c[6]),
        ),
        // YYYYMMDD
        Layout::new("compact-date", r"(\d{4})(\d{2})(\d{2})", |c| {
            date(&c[1], &c[2], &c[3])
        }),
        // YYYY-MM-DD
        Layout::new("date", r"(\d{4})-(\d{2})-(\d{2})", |c| {
            date(&c[1], &c[2], &c[3])
        }),
    ]
});

fn date(year: &str, month: &str, day: &str) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?
        .and_hms_opt(0, 0, 0)
}

fn datetime(
    year: &str,
    month: &str,
    day: &str,
    hour: &str,
    minute: &str,
    second: &str,
) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?
        .and_hms_opt(hour.parse().ok()?, minute.parse().ok()?, second.parse().ok()?)
}

fn is_digit_at(name: &str, idx: usize) -> bool {
    name.as_bytes().get(idx).is_some_and(u8::is_ascii_digit)
}

/// Find the last valid occurrence of `layout` in `name`
fn last_match(layout: &Layout, name: &str) -> Option<NaiveDateTime> {
    (0..name.len()).rev().find_map(|start| {
        if !name.is_char_boundary(start) || (start > 0 && is_digit_at(name, start - 1)) {
            return None;
        }
        let caps = layout.pattern.captures(&name[start..])?;
        let end = start + caps.get(0)?.end();
        if is_digit_at(name, end) {
            return None;
        }
        (layout.parse)(&caps)
    })
}

/// Extract a UTC timestamp embedded in an object key or folder name
pub fn extract_timestamp(name: &str) -> Option<DateTime<Utc>> {
    LAYOUTS.iter().find_map(|layout| {
        let parsed = last_match(layout, name)?;
        tracing::trace!(name, layout = layout.name, %parsed, "extracted timestamp");
        Some(Utc.from_utc_datetime(&parsed))
    })
}

/// Extract the timestamp from the trailing segment of a folder prefix
pub fn folder_timestamp(prefix: &str) -> Option<DateTime<Utc>> {
    let trimmed = prefix.trim_end_matches('/');
    let segment = trimmed.rsplit('/').next().unwrap_or(trimmed);
    extract_timestamp(segment)
}
