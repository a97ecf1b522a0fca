use async_trait::async_trait;

use crate::domain::FeedEntry;
use crate::errors::RelayResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse the feed at `url`
    async fn fetch_entries(&self, url: &str) -> RelayResult<Vec<FeedEntry>>;
}
