use chrono::{DateTime, Duration, Utc};

use crate::config::PolicyKind;
use crate::domain::{FeedEntry, FeedItem};
use crate::services::state_tracker::StateTracker;
use crate::sources::traits::FeedSource;

/// Selects items whose identifier has never been processed
pub struct NoveltyPolicy {
    tracker: StateTracker,
}

impl NoveltyPolicy {
    /// Wraps `tracker` after loading its persisted state
    pub fn new(mut tracker: StateTracker) -> Self {
        tracker.load();
        Self { tracker }
    }
}

/// Selects items published within a lookback window of the pass time
#[derive(Debug, Clone, Copy)]
pub struct RecencyPolicy {
    window: Duration,
}

impl RecencyPolicy {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }
}

pub enum SelectionPolicy {
    Novelty(NoveltyPolicy),
    Recency(RecencyPolicy),
}

impl SelectionPolicy {
    pub fn kind(&self) -> PolicyKind {
        match self {
            SelectionPolicy::Novelty(_) => PolicyKind::Novelty,
            SelectionPolicy::Recency(_) => PolicyKind::Recency,
        }
    }

    fn accepts(&self, item: &FeedItem, now: DateTime<Utc>) -> bool {
        match self {
            SelectionPolicy::Novelty(p) => !p.tracker.is_seen(&item.id),
            SelectionPolicy::Recency(p) => now.signed_duration_since(item.published) <= p.window,
        }
    }

    fn record(&mut self, item: &FeedItem) {
        if let SelectionPolicy::Novelty(p) = self {
            p.tracker.mark_seen(&item.id);
        }
    }

    fn finish_pass(&mut self) {
        if let SelectionPolicy::Novelty(p) = self {
            p.tracker.save();
        }
    }
}

/// Clean and filter one feed's entries, taking at most `max_items` selected items in feed order
pub fn select_items(
    entries: &[FeedEntry],
    feed_url: &str,
    policy: &mut SelectionPolicy,
    now: DateTime<Utc>,
    max_items: usize,
) -> Vec<FeedItem> {
    let mut selected = Vec::new();

    for entry in entries {
        if selected.len() >= max_items {
            break;
        }

        let item = FeedItem::from_entry(entry, feed_url, now);
        if item.id.is_empty() {
            tracing::debug!(title = %item.title, "Skipping entry without GUID or link");
            continue;
        }

        if !policy.accepts(&item, now) {
            continue;
        }

        policy.record(&item);
        tracing::info!(title = %item.title, id = %item.id, "New item found");
        selected.push(item);
    }

    selected
}

/// Items selected in one pass plus the feeds that could not be fetched
#[derive(Debug, Default)]
pub struct PollOutcome {
    pub items: Vec<FeedItem>,
    pub failed_feeds: Vec<(String, String)>,
}

pub struct FeedPoller {
    source: Box<dyn FeedSource>,
    feed_urls: Vec<String>,
    max_items: usize,
}

impl FeedPoller {
    pub fn new(source: Box<dyn FeedSource>, feed_urls: Vec<String>, max_items: usize) -> Self {
        Self {
            source,
            feed_urls,
            max_items,
        }
    }

    pub fn feed_urls(&self) -> &[String] {
        &self.feed_urls
    }

    /// Fetch every feed once; a failing feed is recorded and skipped
    pub async fn poll(&self, policy: &mut SelectionPolicy, now: DateTime<Utc>) -> PollOutcome {
        let mut outcome = PollOutcome::default();

        for url in &self.feed_urls {
            tracing::info!(feed = %url, policy = ?policy.kind(), "Checking feed");

            match self.source.fetch_entries(url).await {
                Ok(entries) => {
                    tracing::debug!(feed = %url, entries = entries.len(), "Fetched feed");
                    let items = select_items(&entries, url, policy, now, self.max_items);
                    outcome.items.extend(items);
                }
                Err(e) => {
                    tracing::error!(feed = %url, error = %e, "Failed to fetch feed");
                    outcome.failed_feeds.push((url.clone(), e.to_string()));
                }
            }
        }

        policy.finish_pass();

        tracing::info!(
            items = outcome.items.len(),
            failed_feeds = outcome.failed_feeds.len(),
            "Feed check finished"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RelayError;
    use crate::sources::traits::MockFeedSource;
    use crate::storage::traits::MockSeenStore;
    use crate::storage::FileSeenStore;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn entries() -> Vec<FeedEntry> {
        vec![
            FeedEntry::new("One", "https://example.com/1")
                .with_guid("guid-1")
                .with_published(Some(now() - Duration::hours(1))),
            FeedEntry::new("Two", "https://example.com/2")
                .with_published(Some(now() - Duration::hours(2))),
        ]
    }

    fn novelty_in(dir: &TempDir) -> SelectionPolicy {
        let store = FileSeenStore::new(dir.path().join("state.txt"));
        SelectionPolicy::Novelty(NoveltyPolicy::new(StateTracker::new(Box::new(store), 1000)))
    }

    fn in_memory_novelty() -> SelectionPolicy {
        let mut store = MockSeenStore::new();
        store.expect_load().returning(|| Ok(vec![]));
        store.expect_save().returning(|_| Ok(()));
        SelectionPolicy::Novelty(NoveltyPolicy::new(StateTracker::new(Box::new(store), 1000)))
    }

    #[test]
    fn test_novelty_second_pass_selects_nothing() {
        let mut policy = in_memory_novelty();

        let first = select_items(&entries(), "feed", &mut policy, now(), 10);
        let second = select_items(&entries(), "feed", &mut policy, now(), 10);

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
    }

    #[test]
    fn test_empty_guid_falls_back_to_link() {
        let mut policy = in_memory_novelty();
        let items = select_items(&entries(), "feed", &mut policy, now(), 10);

        assert_eq!(items[0].id, "guid-1");
        assert_eq!(items[1].id, "https://example.com/2");
    }

    #[test]
    fn test_recency_window() {
        let entries = vec![
            FeedEntry::new("A", "https://example.com/a")
                .with_published(Some(now() - Duration::hours(23))),
            FeedEntry::new("B", "https://example.com/b")
                .with_published(Some(now() - Duration::hours(23))),
            FeedEntry::new("C", "https://example.com/c")
                .with_published(Some(now() - Duration::hours(25))),
        ];
        let mut policy = SelectionPolicy::Recency(RecencyPolicy::new(Duration::hours(24)));

        let items = select_items(&entries, "feed", &mut policy, now(), 10);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "A");
        assert_eq!(items[1].title, "B");
    }

    #[test]
    fn test_undated_entry_counts_as_now() {
        let entries = vec![FeedEntry::new("Undated", "https://example.com/u")];
        let mut policy = SelectionPolicy::Recency(RecencyPolicy::new(Duration::hours(24)));

        let items = select_items(&entries, "feed", &mut policy, now(), 10);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].published, now());
    }

    #[test]
    fn test_max_items_leaves_rest_for_next_pass() {
        let mut policy = in_memory_novelty();

        let first = select_items(&entries(), "feed", &mut policy, now(), 1);
        let second = select_items(&entries(), "feed", &mut policy, now(), 1);

        assert_eq!(first[0].title, "One");
        assert_eq!(second[0].title, "Two");
    }

    #[tokio::test]
    async fn test_failing_feed_is_skipped() {
        let mut source = MockFeedSource::new();
        source
            .expect_fetch_entries()
            .withf(|url: &str| url == "https://bad.example.com/feed")
            .returning(|_| Err(RelayError::FeedParse("not xml".to_string())));
        source
            .expect_fetch_entries()
            .withf(|url: &str| url == "https://good.example.com/feed")
            .returning(|_| Ok(entries()));

        let poller = FeedPoller::new(
            Box::new(source),
            vec![
                "https://bad.example.com/feed".to_string(),
                "https://good.example.com/feed".to_string(),
            ],
            10,
        );
        let mut policy = in_memory_novelty();

        let outcome = poller.poll(&mut policy, now()).await;

        assert_eq!(outcome.items.len(), 2);
        assert_eq!(outcome.items[0].feed_url, "https://good.example.com/feed");
        assert_eq!(outcome.failed_feeds.len(), 1);
        assert_eq!(outcome.failed_feeds[0].0, "https://bad.example.com/feed");
    }

    #[tokio::test]
    async fn test_novelty_state_persists_across_restarts() {
        let dir = TempDir::new().unwrap();
        let mut source = MockFeedSource::new();
        source.expect_fetch_entries().returning(|_| Ok(entries()));
        let poller = FeedPoller::new(
            Box::new(source),
            vec!["https://example.com/feed".to_string()],
            10,
        );

        let mut first = novelty_in(&dir);
        assert_eq!(poller.poll(&mut first, now()).await.items.len(), 2);

        let mut restarted = novelty_in(&dir);
        assert!(poller.poll(&mut restarted, now()).await.items.is_empty());
    }
}
