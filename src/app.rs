use std::time::Duration;

use chrono::Utc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::{Config, PolicyKind, StateBackend};
use crate::domain::TranslationResult;
use crate::errors::RelayResult;
use crate::providers::traits::{ChatChannel, Summarizer, Translator};
use crate::services::{
    DeliveryReport, FeedPoller, Notifier, NoveltyPolicy, Pipeline, PollOutcome, RecencyPolicy,
    SelectionPolicy, StateTracker,
};
use crate::storage::{FileSeenStore, SeenStore, SqliteSeenStore, SqliteStorage};

/// Counts for one polling pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub feeds_failed: usize,
    pub items_found: usize,
    pub delivered: usize,
    pub delivery_failed: usize,
}

/// Build the selection policy for `kind`, opening the configured state store for novelty
pub fn build_policy(kind: PolicyKind, config: &Config) -> RelayResult<SelectionPolicy> {
    match kind {
        PolicyKind::Recency => Ok(SelectionPolicy::Recency(RecencyPolicy::new(
            config.lookback,
        ))),
        PolicyKind::Novelty => {
            let store: Box<dyn SeenStore> = match config.state_backend {
                StateBackend::File => Box::new(FileSeenStore::new(&config.state_file)),
                StateBackend::Sqlite => {
                    Box::new(SqliteSeenStore::new(SqliteStorage::new(&config.state_db_path)?))
                }
            };
            let tracker = StateTracker::new(store, config.state_max_entries);
            Ok(SelectionPolicy::Novelty(NoveltyPolicy::new(tracker)))
        }
    }
}

pub struct App<T: Translator, S: Summarizer, C: ChatChannel> {
    poller: FeedPoller,
    pipeline: Pipeline<T, S>,
    notifier: Notifier<C>,
    check_interval: Duration,
    item_delay: Duration,
}

impl<T: Translator, S: Summarizer, C: ChatChannel> App<T, S, C> {
    pub fn new(poller: FeedPoller, pipeline: Pipeline<T, S>, notifier: Notifier<C>) -> Self {
        Self {
            poller,
            pipeline,
            notifier,
            check_interval: Duration::from_secs(30 * 60),
            item_delay: Duration::from_secs(1),
        }
    }

    pub fn with_timing(mut self, check_interval: Duration, item_delay: Duration) -> Self {
        self.check_interval = check_interval;
        self.item_delay = item_delay;
        self
    }

    /// Translator, summarizer, then the chat channel; the first failure is returned
    pub async fn test_connections(&self, include_channel: bool) -> RelayResult<()> {
        tracing::info!("Testing external service connections");

        self.pipeline.translator().test_connection().await?;
        tracing::info!(service = "DeepL", "Connection OK");

        self.pipeline.summarizer().test_connection().await?;
        tracing::info!(service = "OpenAI", "Connection OK");

        if include_channel {
            self.notifier.test_connection().await?;
            tracing::info!(service = "Slack", "Connection OK");
        }

        tracing::info!("All connection tests passed");
        Ok(())
    }

    /// Poll feeds and run each selected item through the pipeline, without notifying
    pub async fn collect(
        &self,
        policy: &mut SelectionPolicy,
    ) -> (PollOutcome, Vec<TranslationResult>) {
        let outcome = self.poller.poll(policy, Utc::now()).await;

        let total = outcome.items.len();
        let mut results = Vec::with_capacity(total);

        for (i, item) in outcome.items.iter().enumerate() {
            tracing::info!(index = i + 1, total, title = %item.title, "Processing article");
            let result = self.pipeline.process(item).await;
            tracing::info!(index = i + 1, total, title = %result.translated_title, "Article processed");
            results.push(result);

            if i + 1 < total && !self.item_delay.is_zero() {
                tokio::time::sleep(self.item_delay).await;
            }
        }

        (outcome, results)
    }

    /// One full pass: collect, report feed failures, deliver
    pub async fn run_pass(&self, policy: &mut SelectionPolicy) -> PassSummary {
        let (outcome, results) = self.collect(policy).await;

        for (url, reason) in &outcome.failed_feeds {
            self.notify_error(&format!("Failed to check feed {}: {}", url, reason))
                .await;
        }

        let mut summary = PassSummary {
            feeds_failed: outcome.failed_feeds.len(),
            items_found: outcome.items.len(),
            ..Default::default()
        };

        if results.is_empty() {
            tracing::info!("No new articles");
            return summary;
        }

        let report: DeliveryReport = self.notifier.deliver(&results).await;
        summary.delivered = report.delivered;
        summary.delivery_failed = report.failed;

        tracing::info!(
            found = summary.items_found,
            delivered = summary.delivered,
            failed = summary.delivery_failed,
            "Pass complete"
        );
        summary
    }

    pub async fn run_once(&self, policy: &mut SelectionPolicy) -> RelayResult<PassSummary> {
        self.test_connections(true).await?;
        Ok(self.run_pass(policy).await)
    }

    /// Startup notice, an immediate pass, then one pass per tick until `cancel` fires.
    /// Passes never overlap; a pass in flight completes before shutdown.
    pub async fn run_continuous(
        &self,
        policy: &mut SelectionPolicy,
        cancel: CancellationToken,
    ) -> RelayResult<()> {
        self.test_connections(true).await?;

        if let Err(e) = self.notifier.send_startup(self.poller.feed_urls()).await {
            tracing::warn!(error = %e, "Failed to send startup notification");
        }

        tracing::info!(
            interval_secs = self.check_interval.as_secs(),
            feeds = self.poller.feed_urls().len(),
            "Starting feed watch"
        );

        self.run_pass(policy).await;

        let mut ticker = interval_at(Instant::now() + self.check_interval, self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Shutdown requested, stopping feed watch");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_pass(policy).await;
                }
            }
        }

        Ok(())
    }

    async fn notify_error(&self, message: &str) {
        tracing::error!(error = message, "Reporting error");
        if let Err(e) = self.notifier.send_error(message).await {
            tracing::warn!(error = %e, "Failed to send error notification");
        }
    }
}
