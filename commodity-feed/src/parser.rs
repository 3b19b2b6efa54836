use crate::dates::parse_timestamp;
use crate::types::{AggregatorError, RawEntry, Result};
use feed_rs::model::Entry;
use feed_rs::parser;
use tracing::{debug, info};

/// Decodes RSS/Atom bytes into [`RawEntry`] records.
///
/// Every date field goes through [`parse_timestamp`], so the UTC values
/// feed-rs hands back are really the wall-clock time as written.
pub struct FeedParser {
    max_entries: usize,
}

impl FeedParser {
    pub fn new(max_entries: usize) -> Self {
        Self { max_entries }
    }

    /// Decode a feed document. A document with no entries is not an error.
    pub fn decode(&self, content: &[u8]) -> Result<Vec<RawEntry>> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::Builder::new()
            .timestamp_parser(|raw| parse_timestamp(raw).map(|naive| naive.and_utc()))
            .build()
            .parse(content)
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

        if feed.entries.is_empty() {
            info!("feed contains no entries");
            return Ok(Vec::new());
        }

        let total = feed.entries.len();
        let entries: Vec<RawEntry> = feed
            .entries
            .into_iter()
            .take(self.max_entries)
            .filter_map(Self::convert_entry)
            .collect();

        debug!(total, kept = entries.len(), "decoded feed entries");
        Ok(entries)
    }

    fn convert_entry(entry: Entry) -> Option<RawEntry> {
        let link = primary_link(&entry)?;

        let title = entry.title.map(|t| t.content).unwrap_or_default();

        // Prefer the summary; some feeds only fill content:encoded.
        let summary = entry
            .summary
            .map(|s| s.content)
            .filter(|s| !s.trim().is_empty())
            .or_else(|| entry.content.and_then(|c| c.body))
            .unwrap_or_default();

        Some(RawEntry {
            title,
            summary,
            link,
            published: entry.published.map(|dt| dt.naive_utc()),
            updated: entry.updated.map(|dt| dt.naive_utc()),
        })
    }
}

fn primary_link(entry: &Entry) -> Option<String> {
    let preferred = entry
        .links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| entry.links.first())?;

    let href = preferred.href.trim();
    if href.is_empty() {
        debug!(id = %entry.id, "entry has no link");
        None
    } else {
        Some(href.to_string())
    }
}
