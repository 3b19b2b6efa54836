use anyhow::Context;
use clap::Parser;
use commodity_feed::{CacheMode, NewsPipeline, OutputDocument, PipelineConfig};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

/// Fetch commodity headlines from RSS feeds and publish the freshest ones.
#[derive(Debug, Parser)]
#[command(name = "commodity-feed", version)]
struct Cli {
    /// TOML config file (overrides $COMMODITY_FEED_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the published JSON document
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Dedup cache file
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Maximum number of headlines to publish
    #[arg(long)]
    max_items: Option<usize>,

    /// Delete cache and output before running
    #[arg(long)]
    fresh: bool,

    /// Skip the console preview
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    let mut config = PipelineConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(output) = args.output {
        config.output_path = output;
    }
    if let Some(cache) = args.cache {
        config.cache_path = cache;
    }
    if let Some(max_items) = args.max_items {
        config.max_items = max_items;
    }
    if args.fresh {
        config.cache_mode = CacheMode::AlwaysFresh;
    }

    info!(
        sources = config.sources.len(),
        output = %config.output_path.display(),
        cache = %config.cache_path.display(),
        "commodity-feed starting"
    );

    let pipeline = NewsPipeline::new(config).context("building pipeline")?;
    let report = pipeline
        .run_once()
        .await
        .with_context(|| format!("publishing {}", pipeline.config().output_path.display()))?;

    if !report.failed_sources.is_empty() {
        warn!(failed = ?report.failed_sources, "some sources were skipped");
    }
    if !args.quiet {
        print_preview(&report.document);
    }
    Ok(())
}

fn print_preview(document: &OutputDocument) {
    println!("\n=== LATEST {} COMMODITIES HEADLINES ===\n", document.items.len());
    for (i, item) in document.items.iter().enumerate() {
        println!("{}. {}", i + 1, item.title);
        println!("   {} | {}", item.source, item.published);
        println!("   {}\n", item.link);
    }
}
