use crate::dates::{self, DateFallback};
use crate::relevance::RelevanceRules;
use crate::rss_utils::{feed, url};
use crate::types::{NormalizedItem, RawEntry};
use chrono::NaiveDateTime;
use tracing::debug;

pub const UNTITLED: &str = "No title";
const MAX_CLEAN_TITLE_CHARS: usize = 200;

/// Knobs for turning a [`RawEntry`] into a [`NormalizedItem`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOptions {
    pub summary_max_chars: usize,
    pub date_fallback: DateFallback,
    pub clean_titles: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            summary_max_chars: 250,
            date_fallback: DateFallback::Oldest,
            clean_titles: false,
        }
    }
}

/// Strip markup and publisher suffixes (`"Headline - Reuters"`, `"Headline | Site"`).
pub fn clean_title(title: &str) -> String {
    let plain = feed::strip_markup(title);
    let head = plain.split(" - ").next().unwrap_or_default();
    let head = head.split(" | ").next().unwrap_or_default().trim();
    head.chars().take(MAX_CLEAN_TITLE_CHARS).collect()
}

fn coerce_title(raw: &str, clean: bool) -> String {
    let title = if clean {
        clean_title(raw)
    } else {
        raw.trim().to_string()
    };
    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title
    }
}

/// Normalize one entry unconditionally. The summary is truncated here, so
/// relevance must be decided before calling this (see [`EntryProcessor`]).
pub fn normalize_entry(
    raw: &RawEntry,
    source: &str,
    options: &NormalizeOptions,
    now: NaiveDateTime,
) -> NormalizedItem {
    let title = coerce_title(&raw.title, options.clean_titles);
    let summary = feed::strip_markup(&raw.summary);
    build_item(raw, source, title, &summary, options, now)
}

fn build_item(
    raw: &RawEntry,
    source: &str,
    title: String,
    plain_summary: &str,
    options: &NormalizeOptions,
    now: NaiveDateTime,
) -> NormalizedItem {
    let published_at = dates::normalize(raw.published, raw.updated, options.date_fallback, now);
    NormalizedItem {
        title,
        link: url::canonicalize_link(&raw.link),
        summary: feed::truncate_chars(plain_summary, options.summary_max_chars),
        source: source.to_string(),
        published_at,
        display_date: dates::display_date(published_at),
    }
}

/// Cleans, classifies and normalizes the entries of one source.
#[derive(Debug, Clone)]
pub struct EntryProcessor {
    rules: RelevanceRules,
    options: NormalizeOptions,
}

impl EntryProcessor {
    pub fn new(rules: RelevanceRules, options: NormalizeOptions) -> Self {
        Self {
            rules: rules.normalized(),
            options,
        }
    }

    /// Relevant entries in feed order. Classification sees the full cleaned
    /// summary; truncation happens afterwards.
    pub fn process(&self, source: &str, entries: &[RawEntry], now: NaiveDateTime) -> Vec<NormalizedItem> {
        let mut items = Vec::new();
        for raw in entries {
            let title = coerce_title(&raw.title, self.options.clean_titles);
            let summary = feed::strip_markup(&raw.summary);

            if !self.rules.is_relevant(&title, &summary) {
                continue;
            }

            let item = build_item(raw, source, title, &summary, &self.options, now);
            if item.link.is_empty() {
                debug!(source, title = %item.title, "skipping entry without usable link");
                continue;
            }
            items.push(item);
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::SENTINEL;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 12)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap()
    }

    fn entry(title: &str, summary: &str, link: &str) -> RawEntry {
        RawEntry {
            title: title.to_string(),
            summary: summary.to_string(),
            link: link.to_string(),
            published: None,
            updated: None,
        }
    }

    #[test]
    fn clean_title_cuts_publisher_suffix() {
        assert_eq!(clean_title("Brent slips - Reuters"), "Brent slips");
        assert_eq!(clean_title("<b>LNG</b> glut | Argus"), "LNG glut");
        assert_eq!(clean_title(&"x".repeat(300)).chars().count(), 200);
    }

    #[test]
    fn missing_title_is_coerced() {
        let item = normalize_entry(
            &entry("   ", "crude", "https://a.test/1"),
            "A",
            &NormalizeOptions::default(),
            now(),
        );
        assert_eq!(item.title, UNTITLED);
        assert_eq!(item.published_at, SENTINEL);
        assert_eq!(item.display_date, "Recent");
    }

    #[test]
    fn normalize_entry_strips_and_truncates() {
        let opts = NormalizeOptions {
            summary_max_chars: 10,
            ..Default::default()
        };
        let item = normalize_entry(
            &entry("Oil", "<p>Crude&amp;products rally hard</p>", "https://a.test/x?utm=1"),
            "A",
            &opts,
            now(),
        );
        assert_eq!(item.summary, "Crude&prod...");
        assert_eq!(item.link, "https://a.test/x");
        assert_eq!(item.source, "A");
    }

    #[test]
    fn relevance_sees_text_past_the_truncation_point() {
        let opts = NormalizeOptions {
            summary_max_chars: 5,
            ..Default::default()
        };
        let processor = EntryProcessor::new(RelevanceRules::default(), opts);
        let items = processor.process(
            "A",
            &[entry("Market wrap", "stocks drift while brent edges up", "https://a.test/1")],
            now(),
        );
        assert_eq!(items.len(), 1);

        let items = processor.process(
            "A",
            &[entry("Market wrap", "brent edges up on solar news", "https://a.test/2")],
            now(),
        );
        assert!(items.is_empty());
    }

    #[test]
    fn now_fallback_uses_run_start() {
        let opts = NormalizeOptions {
            date_fallback: DateFallback::Now,
            ..Default::default()
        };
        let item = normalize_entry(&entry("Oil", "", "https://a.test/1"), "A", &opts, now());
        assert_eq!(item.published_at, now());
        assert_eq!(item.display_date, "2025-11-12 06:00");
    }

    #[test]
    fn process_keeps_feed_order() {
        let processor = EntryProcessor::new(RelevanceRules::default(), NormalizeOptions::default());
        let items = processor.process(
            "A",
            &[
                entry("Crude one", "", "https://a.test/1"),
                entry("Bakery", "", "https://a.test/2"),
                entry("LNG two", "", "https://a.test/3"),
            ],
            now(),
        );
        let links: Vec<_> = items.iter().map(|i| i.link.as_str()).collect();
        assert_eq!(links, vec!["https://a.test/1", "https://a.test/3"]);
    }
}
