use crate::sources::Source;
use crate::types::FetchOutcome;
use async_trait::async_trait;

/// Retrieves the raw bytes of one source.
///
/// Implementations must not return early with an error: every failure
/// (timeout, refused connection, non-2xx status) is reported as
/// [`FetchOutcome::Failed`] so that one bad source never affects the others.
#[async_trait]
pub trait FeedRetriever: Send + Sync {
    async fn fetch(&self, source: &Source) -> FetchOutcome;
}
