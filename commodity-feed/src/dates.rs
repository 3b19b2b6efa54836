//! Date normalization for feed timestamps.
//!
//! Feeds disagree on how they encode dates. Every raw value goes through
//! [`parse_timestamp`], which tries a fixed list of formats and keeps the
//! wall-clock time as written: an offset is dropped, never applied. Items
//! without any parseable date get the configured [`DateFallback`].

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Sort key for items with no usable date under [`DateFallback::Oldest`].
pub const SENTINEL: NaiveDateTime = NaiveDateTime::MIN;

/// Shown in place of a date when the sentinel was used.
pub const UNKNOWN_DATE_LABEL: &str = "Recent";

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";
const RUN_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats carrying a numeric offset, tried before the lenient paths.
const OFFSET_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S %z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// What an item with no parseable date sorts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFallback {
    /// Sorts after every dated item.
    #[default]
    Oldest,
    /// Treated as published at the start of the run.
    Now,
}

/// Parse one raw date value into a timezone-naive instant.
///
/// Tries RFC-822 with a numeric offset, RFC-822 with a named zone, then
/// ISO-8601 with an offset, and finally offset-less forms.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_local());
        }
    }

    // Named zones (GMT, UT, EST, ...) and other RFC-2822 variants.
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_local());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    // Publishers get the weekday wrong often enough that it is worth ignoring.
    let without_weekday = strip_weekday(s);
    if let Ok(dt) = DateTime::parse_from_str(without_weekday, "%d %b %Y %H:%M:%S %z") {
        return Some(dt.naive_local());
    }

    // Unrecognized zone abbreviation: drop it along with the offset it stood for.
    let without_zone = strip_zone_name(without_weekday);
    if let Ok(dt) = NaiveDateTime::parse_from_str(without_zone, "%d %b %Y %H:%M:%S") {
        return Some(dt);
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Pick the sort instant for an entry: `published` first, then `updated`,
/// then the fallback.
pub fn normalize(
    published: Option<NaiveDateTime>,
    updated: Option<NaiveDateTime>,
    fallback: DateFallback,
    now: NaiveDateTime,
) -> NaiveDateTime {
    published.or(updated).unwrap_or(match fallback {
        DateFallback::Oldest => SENTINEL,
        DateFallback::Now => now,
    })
}

/// Human-readable date for the published document.
pub fn display_date(instant: NaiveDateTime) -> String {
    if instant == SENTINEL {
        UNKNOWN_DATE_LABEL.to_string()
    } else {
        instant.format(DISPLAY_FORMAT).to_string()
    }
}

/// The `last_updated` stamp written with every document.
pub fn run_timestamp(now: NaiveDateTime) -> String {
    now.format(RUN_TIMESTAMP_FORMAT).to_string()
}

fn strip_weekday(s: &str) -> &str {
    match s.split_once(',') {
        Some((day, rest)) if day.len() <= 9 && day.chars().all(|c| c.is_ascii_alphabetic()) => {
            rest.trim_start()
        }
        _ => s,
    }
}

fn strip_zone_name(s: &str) -> &str {
    match s.rsplit_once(' ') {
        Some((head, zone)) if !zone.is_empty() && zone.chars().all(|c| c.is_ascii_alphabetic()) => {
            head
        }
        _ => s,
    }
}
