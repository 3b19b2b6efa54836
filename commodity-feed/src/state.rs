//! Cross-run dedup state.
//!
//! The cache file holds the canonical links emitted by earlier runs. Without a
//! retention window it is a plain JSON array of strings. With one, each link
//! carries the last time a feed still listed it, so links that dropped out of
//! every feed can age out. Either shape loads in either mode.

use crate::output::write_atomic;
use crate::types::Result;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Whether the persisted state survives between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    #[default]
    Incremental,
    /// Every run starts from an empty cache. The file on disk is ignored,
    /// then overwritten once the run has published.
    AlwaysFresh,
}

/// Read-only view used by the ranker.
pub trait SeenSet {
    fn contains_link(&self, link: &str) -> bool;
}

impl SeenSet for HashSet<String> {
    fn contains_link(&self, link: &str) -> bool {
        self.contains(link)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum CacheRecord {
    Link(String),
    Seen { link: String, last_seen: NaiveDateTime },
}

#[derive(Debug, Clone)]
pub struct SeenCache {
    path: PathBuf,
    retention: Option<Duration>,
    entries: HashMap<String, Option<NaiveDateTime>>,
}

impl SeenSet for SeenCache {
    fn contains_link(&self, link: &str) -> bool {
        self.contains(link)
    }
}

impl SeenCache {
    pub fn empty(path: impl Into<PathBuf>, retention_days: Option<u32>) -> Self {
        Self {
            path: path.into(),
            retention: retention_days.map(|days| Duration::days(i64::from(days))),
            entries: HashMap::new(),
        }
    }

    /// Load the cache. A missing, unreadable or corrupt file gives an empty cache.
    pub fn load(path: impl Into<PathBuf>, retention_days: Option<u32>) -> Self {
        let mut cache = Self::empty(path, retention_days);

        let raw = match std::fs::read(&cache.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %cache.path.display(), "no dedup cache yet");
                return cache;
            }
            Err(e) => {
                warn!(path = %cache.path.display(), error = %e, "dedup cache unreadable, starting empty");
                return cache;
            }
        };

        match serde_json::from_slice::<Vec<CacheRecord>>(&raw) {
            Ok(records) => {
                for record in records {
                    match record {
                        CacheRecord::Link(link) => {
                            cache.entries.entry(link).or_insert(None);
                        }
                        CacheRecord::Seen { link, last_seen } => {
                            cache.entries.insert(link, Some(last_seen));
                        }
                    }
                }
                info!(path = %cache.path.display(), links = cache.entries.len(), "loaded dedup cache");
            }
            Err(e) => {
                warn!(path = %cache.path.display(), error = %e, "dedup cache corrupt, starting empty");
            }
        }
        cache
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, link: &str) -> bool {
        self.entries.contains_key(link)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_seen(&self, link: &str) -> Option<NaiveDateTime> {
        self.entries.get(link).copied().flatten()
    }

    /// Refresh `last_seen` for cached links that a feed still lists.
    /// Links not already cached are ignored.
    pub fn touch<'a>(&mut self, links: impl IntoIterator<Item = &'a str>, now: NaiveDateTime) {
        for link in links {
            if let Some(last_seen) = self.entries.get_mut(link) {
                *last_seen = Some(now);
            }
        }
    }

    /// Record links that were just published.
    pub fn commit<I, S>(&mut self, links: I, now: NaiveDateTime)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for link in links {
            self.entries.insert(link.into(), Some(now));
        }
    }

    /// Drop links not seen within the retention window. Returns how many were dropped.
    /// Links loaded without a timestamp start their clock now.
    pub fn prune(&mut self, now: NaiveDateTime) -> usize {
        let Some(retention) = self.retention else {
            return 0;
        };
        // A window reaching past the calendar's start keeps everything.
        let cutoff = now.checked_sub_signed(retention);
        let before = self.entries.len();
        self.entries.retain(|_, last_seen| {
            let seen = *last_seen.get_or_insert(now);
            cutoff.map_or(true, |cutoff| seen >= cutoff)
        });
        let pruned = before - self.entries.len();
        if pruned > 0 {
            info!(pruned, remaining = self.entries.len(), "pruned stale dedup links");
        }
        pruned
    }

    /// Persist atomically, links sorted for stable diffs.
    pub fn save(&self) -> Result<()> {
        let mut links: Vec<(&String, &Option<NaiveDateTime>)> = self.entries.iter().collect();
        links.sort_by(|a, b| a.0.cmp(b.0));

        let json = if self.retention.is_some() {
            let records: Vec<CacheRecord> = links
                .into_iter()
                .map(|(link, last_seen)| match last_seen {
                    Some(last_seen) => CacheRecord::Seen {
                        link: link.clone(),
                        last_seen: *last_seen,
                    },
                    None => CacheRecord::Link(link.clone()),
                })
                .collect();
            serde_json::to_vec(&records)?
        } else {
            let plain: Vec<&String> = links.into_iter().map(|(link, _)| link).collect();
            serde_json::to_vec(&plain)?
        };

        write_atomic(&self.path, &json)?;
        debug!(path = %self.path.display(), links = self.entries.len(), "saved dedup cache");
        Ok(())
    }
}
