use async_trait::async_trait;
use feed_rs::parser;
use reqwest::Client;

use crate::domain::FeedEntry;
use crate::errors::{RelayError, RelayResult};
use crate::sources::traits::FeedSource;

pub struct RssAtomSource {
    client: Client,
}

impl RssAtomSource {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    async fn fetch_bytes(&self, url: &str) -> RelayResult<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Parse entries from raw feed bytes
    pub fn entries_from_bytes(bytes: &[u8]) -> RelayResult<Vec<FeedEntry>> {
        // No synthesized ids: an entry without a GUID keeps an empty one so the link is used
        let parsed = parser::Builder::new()
            .id_generator(|_, _, _| String::new())
            .build()
            .parse(bytes)
            .map_err(|e| RelayError::FeedParse(e.to_string()))?;

        let entries = parsed
            .entries
            .into_iter()
            .map(|entry| {
                let title = entry.title.map(|t| t.content).unwrap_or_default();

                // RSS description maps to summary; fall back to the full content body
                let description = entry
                    .summary
                    .map(|s| s.content)
                    .or_else(|| entry.content.and_then(|c| c.body))
                    .unwrap_or_default();

                let link = entry
                    .links
                    .into_iter()
                    .next()
                    .map(|l| l.href)
                    .unwrap_or_default();

                FeedEntry {
                    title,
                    description,
                    link,
                    guid: entry.id,
                    published: entry.published,
                    updated: entry.updated,
                }
            })
            .collect();

        Ok(entries)
    }
}

impl Default for RssAtomSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedSource for RssAtomSource {
    async fn fetch_entries(&self, url: &str) -> RelayResult<Vec<FeedEntry>> {
        let bytes = self.fetch_bytes(url).await?;
        Self::entries_from_bytes(&bytes)
    }
}
