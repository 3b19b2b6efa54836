use crate::dates::DateFallback;
use crate::processing::NormalizeOptions;
use crate::relevance::RelevanceRules;
use crate::sources::{Source, SourceRegistry};
use crate::state::CacheMode;
use crate::types::{AggregatorError, FetchConfig, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CONFIG_ENV: &str = "COMMODITY_FEED_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/commodity_feed.toml";

/// Everything a pipeline run needs. Omitted TOML keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sources: Vec<Source>,
    #[serde(flatten)]
    pub relevance: RelevanceRules,
    pub max_items: usize,
    pub entries_per_source: usize,
    pub summary_max_chars: usize,
    pub date_fallback: DateFallback,
    pub clean_titles: bool,
    pub cache_mode: CacheMode,
    pub cache_retention_days: Option<u32>,
    pub output_path: PathBuf,
    pub cache_path: PathBuf,
    pub fetch: FetchConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sources: SourceRegistry::default_commodities().iter().cloned().collect(),
            relevance: RelevanceRules::default(),
            max_items: 15,
            entries_per_source: 20,
            summary_max_chars: 250,
            date_fallback: DateFallback::Oldest,
            clean_titles: false,
            cache_mode: CacheMode::Incremental,
            cache_retention_days: None,
            output_path: PathBuf::from("commodities_news.json"),
            cache_path: PathBuf::from("news_cache.json"),
            fetch: FetchConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| AggregatorError::Config(e.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AggregatorError::Config(format!("reading config from {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        info!(path = %path.display(), sources = config.sources.len(), "loaded configuration");
        Ok(config)
    }

    /// Resolve and load the configuration:
    /// 1) `explicit` (the `--config` flag)
    /// 2) `$COMMODITY_FEED_CONFIG`
    /// 3) `config/commodity_feed.toml` if present
    /// 4) built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env = std::env::var(CONFIG_ENV).ok();
        match resolve_path(explicit, env.as_deref(), Path::new(DEFAULT_CONFIG_PATH).exists()) {
            Some(path) => Self::from_path(&path),
            None => {
                info!("no config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_items == 0 {
            return Err(AggregatorError::Config("max_items must be at least 1".into()));
        }
        if self.entries_per_source == 0 {
            return Err(AggregatorError::Config("entries_per_source must be at least 1".into()));
        }
        if self.summary_max_chars == 0 {
            return Err(AggregatorError::Config("summary_max_chars must be at least 1".into()));
        }
        if self.cache_retention_days == Some(0) {
            return Err(AggregatorError::Config("cache_retention_days must be at least 1".into()));
        }
        if self.sources.is_empty() {
            return Err(AggregatorError::Config("no sources configured".into()));
        }
        if !self.relevance.clone().normalized().is_usable() {
            return Err(AggregatorError::Config(
                "at least one keyword or priority entity is required".into(),
            ));
        }
        self.registry().validate()
    }

    pub fn registry(&self) -> SourceRegistry {
        SourceRegistry::new(self.sources.clone())
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            summary_max_chars: self.summary_max_chars,
            date_fallback: self.date_fallback,
            clean_titles: self.clean_titles,
        }
    }
}

fn resolve_path(explicit: Option<&Path>, env: Option<&str>, default_exists: bool) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env.filter(|p| !p.trim().is_empty()) {
        return Some(PathBuf::from(path));
    }
    default_exists.then(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
