use crate::state::SeenSet;
use crate::types::{NormalizedItem, SourceBatch};
use std::collections::HashSet;
use tracing::debug;

/// Items chosen for this run, newest first, plus the links to commit once published.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub items: Vec<NormalizedItem>,
    pub new_links: Vec<String>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Merge per-source results and pick up to `max_items` fresh items.
///
/// Batches are concatenated in the order given and stable-sorted by
/// `published_at` descending, so equal timestamps keep source order. An item
/// is skipped if its link is already in `seen` or was picked earlier in this
/// call. Items past the cap are left out of `new_links` too.
pub fn aggregate<S: SeenSet + ?Sized>(
    batches: &[SourceBatch],
    seen: &S,
    max_items: usize,
) -> Selection {
    let mut merged: Vec<&NormalizedItem> = batches.iter().flat_map(|b| b.items.iter()).collect();
    merged.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    let mut picked: HashSet<&str> = HashSet::new();
    let mut selection = Selection::default();
    let mut already_seen = 0usize;

    for item in merged {
        if selection.items.len() >= max_items {
            break;
        }
        if seen.contains_link(&item.link) {
            already_seen += 1;
            continue;
        }
        if !picked.insert(item.link.as_str()) {
            continue;
        }
        selection.new_links.push(item.link.clone());
        selection.items.push(item.clone());
    }

    debug!(
        selected = selection.items.len(),
        already_seen, max_items, "aggregated batches"
    );
    selection
}
