pub mod types;
pub mod dates;
pub mod relevance;
pub mod rss_utils;
pub mod processing;
pub mod sources;
pub mod traits;
pub mod fetcher;
pub mod parser;
pub mod state;
pub mod aggregator;
pub mod output;
pub mod config;
pub mod pipeline;

pub use types::*;
pub use dates::DateFallback;
pub use relevance::{ExclusionMode, RelevanceRules};
pub use processing::{EntryProcessor, NormalizeOptions};
pub use sources::{Source, SourceRegistry};
pub use traits::FeedRetriever;
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use state::{CacheMode, SeenCache, SeenSet};
pub use aggregator::{aggregate, Selection};
pub use output::{OutputDocument, OutputItem};
pub use config::PipelineConfig;
pub use pipeline::{NewsPipeline, RunReport};
