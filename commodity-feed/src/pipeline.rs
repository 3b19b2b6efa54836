use crate::aggregator::aggregate;
use crate::config::PipelineConfig;
use crate::fetcher::Fetcher;
use crate::output::{publish, OutputDocument};
use crate::parser::FeedParser;
use crate::processing::EntryProcessor;
use crate::sources::{Source, SourceRegistry};
use crate::state::{CacheMode, SeenCache};
use crate::traits::FeedRetriever;
use crate::types::{FetchOutcome, Result, SourceBatch};
use chrono::{Local, NaiveDateTime};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Summary of one pipeline execution.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub sources_ok: usize,
    pub sources_failed: usize,
    /// Names of the sources that produced nothing usable, in registry order.
    pub failed_sources: Vec<String>,
    /// Relevant items across all sources, before dedup and cap.
    pub relevant: usize,
    pub published: usize,
    pub pruned: usize,
    pub cache_saved: bool,
    pub last_updated: String,
    pub document: OutputDocument,
}

/// Fetch, filter, dedup, rank and publish. One instance can run many times.
pub struct NewsPipeline {
    config: PipelineConfig,
    registry: SourceRegistry,
    retriever: Arc<dyn FeedRetriever>,
    parser: FeedParser,
    processor: EntryProcessor,
}

impl NewsPipeline {
    /// Pipeline that fetches over HTTP.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let fetcher = Fetcher::new(config.fetch.clone())?;
        Self::with_retriever(config, Arc::new(fetcher))
    }

    /// Pipeline over any retriever. Validates the configuration.
    pub fn with_retriever(config: PipelineConfig, retriever: Arc<dyn FeedRetriever>) -> Result<Self> {
        config.validate()?;
        let registry = config.registry();
        let parser = FeedParser::new(config.entries_per_source);
        let processor = EntryProcessor::new(config.relevance.clone(), config.normalize_options());

        info!(sources = registry.len(), max_items = config.max_items, "pipeline configured");
        Ok(Self {
            config,
            registry,
            retriever,
            parser,
            processor,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Run once, stamped with the local wall-clock time.
    pub async fn run_once(&self) -> Result<RunReport> {
        self.run_at(Local::now().naive_local()).await
    }

    /// Run once with an explicit run start. Only a failed publish is an error.
    #[instrument(skip(self), fields(sources = self.registry.len()))]
    pub async fn run_at(&self, now: NaiveDateTime) -> Result<RunReport> {
        let cfg = &self.config;

        // The previous document stays in place until publish replaces it.
        let mut cache = match cfg.cache_mode {
            CacheMode::Incremental => SeenCache::load(&cfg.cache_path, cfg.cache_retention_days),
            CacheMode::AlwaysFresh => {
                info!(path = %cfg.cache_path.display(), "fresh run, ignoring dedup cache");
                SeenCache::empty(&cfg.cache_path, cfg.cache_retention_days)
            }
        };

        let batches = self.collect(now).await;
        let failed_sources: Vec<String> = batches
            .iter()
            .filter(|b| !b.ok)
            .map(|b| b.source.clone())
            .collect();
        let sources_failed = failed_sources.len();
        let sources_ok = batches.len() - sources_failed;
        let relevant: usize = batches.iter().map(|b| b.items.len()).sum();

        cache.touch(
            batches.iter().flat_map(|b| b.items.iter().map(|i| i.link.as_str())),
            now,
        );

        let selection = aggregate(&batches, &cache, cfg.max_items);
        if selection.is_empty() {
            info!(relevant, "no fresh headlines this run");
        }
        let document = OutputDocument::new(&selection.items, now);

        publish(&document, &cfg.output_path).await?;
        info!(
            path = %cfg.output_path.display(),
            items = document.items.len(),
            "saved fresh headlines"
        );

        // The document is out; a cache problem now only risks repeats next run.
        cache.commit(selection.new_links, now);
        let pruned = cache.prune(now);
        let cache_saved = match cache.save() {
            Ok(()) => true,
            Err(e) => {
                error!(path = %cfg.cache_path.display(), error = %e, "failed to save dedup cache");
                false
            }
        };

        let report = RunReport {
            sources_ok,
            sources_failed,
            failed_sources,
            relevant,
            published: document.items.len(),
            pruned,
            cache_saved,
            last_updated: document.last_updated.clone(),
            document,
        };
        info!(
            sources_ok = report.sources_ok,
            sources_failed = report.sources_failed,
            relevant = report.relevant,
            published = report.published,
            "run complete"
        );
        Ok(report)
    }

    /// Fetch and process every source concurrently. Results come back in
    /// registry order whatever order the requests finish in.
    pub async fn collect(&self, now: NaiveDateTime) -> Vec<SourceBatch> {
        join_all(self.registry.iter().map(|source| self.collect_source(source, now))).await
    }

    async fn collect_source(&self, source: &Source, now: NaiveDateTime) -> SourceBatch {
        let failed = || SourceBatch {
            source: source.name.clone(),
            ok: false,
            items: Vec::new(),
        };

        let body = match self.retriever.fetch(source).await {
            FetchOutcome::Fetched { body, .. } => body,
            FetchOutcome::Failed { reason } => {
                warn!(source = %source.name, %reason, "source skipped");
                return failed();
            }
        };

        let entries = match self.parser.decode(&body) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(source = %source.name, error = %e, "source skipped");
                return failed();
            }
        };

        let items = self.processor.process(&source.name, &entries, now);
        info!(
            source = %source.name,
            entries = entries.len(),
            relevant = items.len(),
            "source processed"
        );

        SourceBatch {
            source: source.name.clone(),
            ok: true,
            items,
        }
    }
}
