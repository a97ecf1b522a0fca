use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sources::text::clean_text;

/// An entry as parsed from a feed, before selection and cleaning
#[derive(Debug, Clone, Default)]
pub struct FeedEntry {
    pub title: String,
    pub description: String,
    pub link: String,
    pub guid: String,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl FeedEntry {
    pub fn new(title: &str, link: &str) -> Self {
        Self {
            title: title.to_string(),
            link: link.to_string(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_guid(mut self, guid: &str) -> Self {
        self.guid = guid.to_string();
        self
    }

    pub fn with_published(mut self, published: Option<DateTime<Utc>>) -> Self {
        self.published = published;
        self
    }

    pub fn with_updated(mut self, updated: Option<DateTime<Utc>>) -> Self {
        self.updated = updated;
        self
    }

    /// Dedup key: the GUID when present, otherwise the link
    pub fn identifier(&self) -> &str {
        let guid = self.guid.trim();
        if guid.is_empty() {
            self.link.trim()
        } else {
            guid
        }
    }

    /// Published, then updated, then `now`
    pub fn timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.published.or(self.updated).unwrap_or(now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub link: String,
    pub published: DateTime<Utc>,
    pub feed_url: String,
}

impl FeedItem {
    pub fn from_entry(entry: &FeedEntry, feed_url: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: entry.identifier().to_string(),
            title: clean_text(&entry.title),
            description: clean_text(&entry.description),
            link: entry.link.trim().to_string(),
            published: entry.timestamp(now),
            feed_url: feed_url.to_string(),
        }
    }
}
