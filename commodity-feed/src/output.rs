use crate::dates::run_timestamp;
use crate::types::{AggregatorError, NormalizedItem, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, instrument};

/// One published headline. The sort key stays internal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputItem {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub source: String,
    pub published: String,
}

impl From<&NormalizedItem> for OutputItem {
    fn from(item: &NormalizedItem) -> Self {
        Self {
            title: item.title.clone(),
            link: item.link.clone(),
            summary: item.summary.clone(),
            source: item.source.clone(),
            published: item.display_date.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDocument {
    pub last_updated: String,
    pub items: Vec<OutputItem>,
}

impl OutputDocument {
    pub fn new(items: &[NormalizedItem], now: NaiveDateTime) -> Self {
        Self {
            last_updated: run_timestamp(now),
            items: items.iter().map(OutputItem::from).collect(),
        }
    }
}

/// Replace the document at `path`. Readers see either the old file or the new
/// one, never a partial write.
#[instrument(skip_all, fields(path = %path.display(), items = document.items.len()))]
pub async fn publish(document: &OutputDocument, path: &Path) -> Result<()> {
    // UTF-8 as-is, no \u escapes for non-ASCII headlines.
    let json = serde_json::to_vec_pretty(document)?;
    let target: PathBuf = path.to_path_buf();

    tokio::task::spawn_blocking(move || write_atomic(&target, &json))
        .await
        .map_err(|e| AggregatorError::General(format!("publish task failed: {}", e)))??;

    info!("published {} items", document.items.len());
    Ok(())
}

pub fn read_document(path: &Path) -> Result<OutputDocument> {
    let raw = std::fs::read(path)?;
    Ok(serde_json::from_slice(&raw)?)
}

/// Write to a temp file next to `path`, fsync, then rename over it.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| AggregatorError::Persist {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(())
}
