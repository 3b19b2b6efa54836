use crate::rss_utils::url::is_valid_feed_url;
use crate::types::{AggregatorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// One named feed endpoint. Identity is the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub url: String,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

const COMMODITY_FEEDS: &[(&str, &str)] = &[
    ("EIA Today in Energy", "https://www.eia.gov/todayinenergy/rss.php"),
    ("OPEC Press Room", "https://www.opec.org/opec_web/en/rss/press_room.xml"),
    ("S&P Global Commodity Insights", "https://www.spglobal.com/commodityinsights/en/rss"),
    ("ICIS Energy", "https://www.icis.com/explore/rss/commodities/energy/"),
    ("Argus Media Latest", "https://www.argusmedia.com/en/rss/latest-news"),
    ("LNG World News", "https://www.lngworldnews.com/feed/"),
    ("Natural Gas Intelligence", "https://www.naturalgasintel.com/feed/"),
    ("Power Magazine", "https://www.powermag.com/feed/"),
    ("OilPrice.com", "https://oilprice.com/rss/main"),
    ("Rigzone News", "https://www.rigzone.com/news/rss"),
    (
        "Google News Oil&LNG",
        "https://news.google.com/rss/search?q=(oil+OR+crude+OR+brent+OR+wti+OR+LNG+OR+JKM+OR+TTF+OR+Henry+Hub)+when:1d&hl=en-US&gl=US&ceid=US:en",
    ),
];

/// Ordered list of sources, fixed for the life of a pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    /// Build from an ordered list. A repeated URL keeps its first name.
    pub fn new(sources: Vec<Source>) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(sources.len());
        for source in sources {
            if seen.insert(source.url.clone()) {
                unique.push(source);
            } else {
                warn!(source = %source.name, url = %source.url, "duplicate feed URL ignored");
            }
        }
        Self { sources: unique }
    }

    /// The energy and commodities feeds the pipeline ships with.
    pub fn default_commodities() -> Self {
        Self::from_pairs(COMMODITY_FEEDS.iter().copied())
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self::new(pairs.into_iter().map(|(name, url)| Source::new(name, url)).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Reject blank names and non-http(s) URLs.
    pub fn validate(&self) -> Result<()> {
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(AggregatorError::Config(format!(
                    "source with URL {} has no name",
                    source.url
                )));
            }
            if !is_valid_feed_url(&source.url) {
                return Err(AggregatorError::Config(format!(
                    "source {} has an invalid feed URL: {}",
                    source.name, source.url
                )));
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a SourceRegistry {
    type Item = &'a Source;
    type IntoIter = std::slice::Iter<'a, Source>;

    fn into_iter(self) -> Self::IntoIter {
        self.sources.iter()
    }
}
