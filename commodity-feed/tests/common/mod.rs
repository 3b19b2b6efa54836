#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use commodity_feed::{FeedRetriever, FetchOutcome, PipelineConfig, Source};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, Once};
use std::time::Duration;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const ENERGY_FEED: &str = include_str!("../fixtures/energy_feed.xml");

/// 2025-11-12 06:00, the run start used throughout.
pub fn run_start() -> NaiveDateTime {
    at(2025, 11, 12, 6, 0)
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

#[derive(Clone)]
enum Response {
    Body { xml: String, delay: Duration },
    Fail(String),
}

/// In-memory retriever keyed by URL. Unknown URLs fail like a dead host.
#[derive(Default)]
pub struct StubRetriever {
    responses: Mutex<HashMap<String, Response>>,
}

impl StubRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, xml: impl Into<String>) {
        self.serve_after(url, xml, Duration::ZERO);
    }

    pub fn serve_after(&self, url: &str, xml: impl Into<String>, delay: Duration) {
        self.responses.lock().unwrap().insert(
            url.to_string(),
            Response::Body {
                xml: xml.into(),
                delay,
            },
        );
    }

    pub fn fail(&self, url: &str, reason: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Response::Fail(reason.to_string()));
    }
}

#[async_trait]
impl FeedRetriever for StubRetriever {
    async fn fetch(&self, source: &Source) -> FetchOutcome {
        let response = self.responses.lock().unwrap().get(&source.url).cloned();
        match response {
            Some(Response::Body { xml, delay }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                FetchOutcome::Fetched {
                    body: xml.into_bytes(),
                    http_status: 200,
                }
            }
            Some(Response::Fail(reason)) => FetchOutcome::Failed { reason },
            None => FetchOutcome::Failed {
                reason: "connection refused".to_string(),
            },
        }
    }
}

/// An RSS document from `(title, link, pubDate)` triples.
pub fn rss(items: &[(&str, &str, Option<&str>)]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\"><channel><title>Stub</title>\n",
    );
    for (title, link, date) in items {
        xml.push_str("<item>");
        xml.push_str(&format!("<title>{}</title>", title));
        xml.push_str(&format!("<link>{}</link>", link.replace('&', "&amp;")));
        if let Some(date) = date {
            xml.push_str(&format!("<pubDate>{}</pubDate>", date));
        }
        xml.push_str("</item>\n");
    }
    xml.push_str("</channel></rss>");
    xml
}

/// Config rooted in `dir` with the given sources.
pub fn config_in(dir: &Path, sources: &[(&str, &str)]) -> PipelineConfig {
    PipelineConfig {
        sources: sources.iter().map(|(n, u)| Source::new(*n, *u)).collect(),
        output_path: dir.join("commodities_news.json"),
        cache_path: dir.join("news_cache.json"),
        ..PipelineConfig::default()
    }
}
