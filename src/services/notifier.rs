use std::fmt;
use std::time::Duration;

use chrono::Utc;

use crate::domain::{MessageBuilder, TranslationResult};
use crate::errors::{RelayError, RelayResult};
use crate::providers::traits::ChatChannel;

/// How a single article is posted, in ladder order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleTier {
    /// Title message followed by a summary reply in its thread
    Threaded,
    /// One self-contained message
    Flat,
}

/// How an article reached the channel, as recorded in a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryTier {
    Threaded,
    Flat,
    /// Several articles in one message
    Batch,
}

impl From<ArticleTier> for DeliveryTier {
    fn from(tier: ArticleTier) -> Self {
        match tier {
            ArticleTier::Threaded => DeliveryTier::Threaded,
            ArticleTier::Flat => DeliveryTier::Flat,
        }
    }
}

impl fmt::Display for ArticleTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&DeliveryTier::from(*self), f)
    }
}

impl fmt::Display for DeliveryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeliveryTier::Threaded => "threaded",
            DeliveryTier::Flat => "flat",
            DeliveryTier::Batch => "batch",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of delivering one pass worth of results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
    /// Tiers that carried at least one article, in first-use order
    pub tiers: Vec<DeliveryTier>,
}

impl DeliveryReport {
    fn record(&mut self, tier: impl Into<DeliveryTier>) {
        let tier = tier.into();
        self.delivered += 1;
        if !self.tiers.contains(&tier) {
            self.tiers.push(tier);
        }
    }
}

/// Delay between individual sends after a failed batch
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub after_threaded: Duration,
    pub after_flat: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            after_threaded: Duration::from_secs(2),
            after_flat: Duration::from_secs(1),
        }
    }
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            after_threaded: Duration::ZERO,
            after_flat: Duration::ZERO,
        }
    }

    fn after(&self, tier: ArticleTier) -> Duration {
        match tier {
            ArticleTier::Threaded => self.after_threaded,
            ArticleTier::Flat => self.after_flat,
        }
    }
}

/// Ordered tiers for a single article
pub fn single_ladder(use_threads: bool, has_bot_token: bool) -> Vec<ArticleTier> {
    match (use_threads, has_bot_token) {
        (true, true) => vec![ArticleTier::Threaded, ArticleTier::Flat],
        (true, false) => {
            tracing::warn!(
                "SLACK_USE_THREADS is set but SLACK_BOT_TOKEN is missing; threads need the token API, sending flat messages"
            );
            vec![ArticleTier::Flat]
        }
        _ => vec![ArticleTier::Flat],
    }
}

pub struct Notifier<C: ChatChannel> {
    channel: C,
    builder: MessageBuilder,
    ladder: Vec<ArticleTier>,
    pacing: Pacing,
}

impl<C: ChatChannel> Notifier<C> {
    pub fn new(channel: C, builder: MessageBuilder, ladder: Vec<ArticleTier>) -> Self {
        Self {
            channel,
            builder,
            ladder,
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// One result goes out as a single article, several as a batch
    pub async fn deliver(&self, results: &[TranslationResult]) -> DeliveryReport {
        tracing::info!(count = results.len(), "Sending notifications");

        match results {
            [] => DeliveryReport::default(),
            [single] => {
                let mut report = DeliveryReport::default();
                match self.send_single(single).await {
                    Ok(tier) => report.record(tier),
                    Err(e) => {
                        tracing::error!(title = %single.translated_title, error = %e, "Failed to send notification");
                        report.failed += 1;
                    }
                }
                report
            }
            _ => self.send_batch(results).await,
        }
    }

    /// Walk the ladder until one tier succeeds
    pub async fn send_single(&self, result: &TranslationResult) -> RelayResult<ArticleTier> {
        let mut last_error = None;

        for &tier in &self.ladder {
            match self.send_tier(tier, result).await {
                Ok(()) => {
                    tracing::info!(tier = %tier, title = %result.translated_title, "Notification sent");
                    return Ok(tier);
                }
                Err(e) => {
                    tracing::warn!(tier = %tier, error = %e, "Delivery tier failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            RelayError::Notification("no delivery tier configured".to_string())
        }))
    }

    async fn send_tier(&self, tier: ArticleTier, result: &TranslationResult) -> RelayResult<()> {
        let now = Utc::now();
        match tier {
            ArticleTier::Threaded => {
                let ts = self
                    .channel
                    .post_threaded(&self.builder.thread_root(result, now))
                    .await?;
                self.channel
                    .post_threaded(&self.builder.thread_reply(result, &ts, now))
                    .await?;
                Ok(())
            }
            ArticleTier::Flat => self.channel.post(&self.builder.article(result, now)).await,
        }
    }

    /// One batch message; on failure each article is sent on its own, paced
    pub async fn send_batch(&self, results: &[TranslationResult]) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        if results.is_empty() {
            return report;
        }

        let message = self.builder.batch(results, Utc::now());
        match self.channel.post(&message).await {
            Ok(()) => {
                tracing::info!(count = results.len(), "Batch notification sent");
                report.delivered = results.len();
                report.tiers.push(DeliveryTier::Batch);
                return report;
            }
            Err(e) => {
                tracing::error!(error = %e, "Batch notification failed, sending articles individually");
            }
        }

        let total = results.len();
        let fallback_pause = self
            .ladder
            .first()
            .map(|&tier| self.pacing.after(tier))
            .unwrap_or(self.pacing.after_flat);

        for (i, result) in results.iter().enumerate() {
            let pause = match self.send_single(result).await {
                Ok(tier) => {
                    tracing::info!(index = i + 1, total, tier = %tier, "Article notification sent");
                    report.record(tier);
                    self.pacing.after(tier)
                }
                Err(e) => {
                    tracing::error!(index = i + 1, total, error = %e, "Article notification failed");
                    report.failed += 1;
                    fallback_pause
                }
            };

            if i + 1 < total && !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        report
    }

    pub async fn send_error(&self, message: &str) -> RelayResult<()> {
        self.channel
            .post(&self.builder.error(message, Utc::now()))
            .await
    }

    pub async fn send_startup(&self, feed_urls: &[String]) -> RelayResult<()> {
        self.channel
            .post(&self.builder.startup(feed_urls, Utc::now()))
            .await
    }

    pub async fn test_connection(&self) -> RelayResult<()> {
        self.channel
            .post(&self.builder.connection_test())
            .await
            .map_err(|e| RelayError::ConnectionTest {
                service: "Slack".to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::traits::MockChatChannel;
    use chrono::FixedOffset;
    use mockall::Sequence;
    use slack_client::Message;

    fn builder() -> MessageBuilder {
        MessageBuilder::new("#news", "Bot", FixedOffset::east_opt(0).unwrap())
    }

    fn result(n: usize) -> TranslationResult {
        TranslationResult {
            original_title: format!("Title {n}"),
            translated_title: format!("Titre {n}"),
            original_description: String::new(),
            translated_description: String::new(),
            summary: format!("Summary {n}"),
            link: format!("https://example.com/{n}"),
        }
    }

    fn threaded(channel: MockChatChannel) -> Notifier<MockChatChannel> {
        Notifier::new(channel, builder(), single_ladder(true, true)).with_pacing(Pacing::none())
    }

    fn flat(channel: MockChatChannel) -> Notifier<MockChatChannel> {
        Notifier::new(channel, builder(), single_ladder(false, false)).with_pacing(Pacing::none())
    }

    #[test]
    fn test_ladder_requires_token_for_threads() {
        assert_eq!(
            single_ladder(true, true),
            vec![ArticleTier::Threaded, ArticleTier::Flat]
        );
        assert_eq!(single_ladder(true, false), vec![ArticleTier::Flat]);
        assert_eq!(single_ladder(false, true), vec![ArticleTier::Flat]);
        assert_eq!(single_ladder(false, false), vec![ArticleTier::Flat]);
    }

    #[tokio::test]
    async fn test_threaded_posts_root_then_reply() {
        let mut channel = MockChatChannel::new();
        let mut seq = Sequence::new();
        channel
            .expect_post_threaded()
            .withf(|m: &Message| m.thread_ts.is_none())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("1700000000.000100".to_string()));
        channel
            .expect_post_threaded()
            .withf(|m: &Message| m.thread_ts.as_deref() == Some("1700000000.000100"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("1700000000.000200".to_string()));
        channel.expect_post().never();

        let tier = threaded(channel).send_single(&result(1)).await.unwrap();
        assert_eq!(tier, ArticleTier::Threaded);
    }

    #[tokio::test]
    async fn test_single_threaded_delivery_is_reported_as_threaded() {
        let mut channel = MockChatChannel::new();
        channel
            .expect_post_threaded()
            .times(2)
            .returning(|_| Ok("1700000000.000100".to_string()));
        channel.expect_post().never();

        let report = threaded(channel).deliver(&[result(1)]).await;
        assert_eq!(report.delivered, 1);
        assert_eq!(report.tiers, vec![DeliveryTier::Threaded]);
        assert_eq!(ArticleTier::Threaded.to_string(), "threaded");
    }

    #[tokio::test]
    async fn test_failed_reply_falls_back_to_one_flat_send() {
        let mut channel = MockChatChannel::new();
        channel
            .expect_post_threaded()
            .withf(|m: &Message| m.thread_ts.is_none())
            .times(1)
            .returning(|_| Ok("1700000000.000100".to_string()));
        channel
            .expect_post_threaded()
            .withf(|m: &Message| m.thread_ts.is_some())
            .times(1)
            .returning(|_| Err(RelayError::Channel("rate_limited".to_string())));
        channel.expect_post().times(1).returning(|_| Ok(()));

        let tier = threaded(channel).send_single(&result(1)).await.unwrap();
        assert_eq!(tier, ArticleTier::Flat);
    }

    #[tokio::test]
    async fn test_all_tiers_failing_returns_last_error() {
        let mut channel = MockChatChannel::new();
        channel
            .expect_post_threaded()
            .returning(|_| Err(RelayError::Channel("down".to_string())));
        channel
            .expect_post()
            .times(1)
            .returning(|_| Err(RelayError::Channel("webhook down".to_string())));

        let err = threaded(channel).send_single(&result(1)).await.unwrap_err();
        assert!(err.to_string().contains("webhook down"));
    }

    #[tokio::test]
    async fn test_batch_of_eight_is_one_message_with_five_articles() {
        let mut channel = MockChatChannel::new();
        channel
            .expect_post()
            .withf(|m: &Message| m.attachments.len() == 6)
            .times(1)
            .returning(|_| Ok(()));

        let results: Vec<TranslationResult> = (1..=8).map(result).collect();
        let report = flat(channel).deliver(&results).await;

        assert_eq!(report.delivered, 8);
        assert_eq!(report.tiers, vec![DeliveryTier::Batch]);
    }

    #[tokio::test]
    async fn test_batch_failure_sends_each_article() {
        let mut channel = MockChatChannel::new();
        channel
            .expect_post()
            .withf(|m: &Message| m.attachments.len() > 2)
            .times(1)
            .returning(|_| Err(RelayError::Channel("too large".to_string())));
        channel
            .expect_post()
            .withf(|m: &Message| m.attachments.len() == 1)
            .times(3)
            .returning(|_| Ok(()));

        let results: Vec<TranslationResult> = (1..=3).map(result).collect();
        let report = flat(channel).deliver(&results).await;

        assert_eq!(report.delivered, 3);
        assert_eq!(report.failed, 0);
        assert_eq!(report.tiers, vec![DeliveryTier::Flat]);
    }

    #[tokio::test]
    async fn test_batch_fallback_counts_failures() {
        let mut channel = MockChatChannel::new();
        channel
            .expect_post()
            .returning(|_| Err(RelayError::Channel("down".to_string())));

        let results: Vec<TranslationResult> = (1..=2).map(result).collect();
        let report = flat(channel).send_batch(&results).await;

        assert_eq!(report.delivered, 0);
        assert_eq!(report.failed, 2);
    }

    #[tokio::test]
    async fn test_single_result_skips_batch() {
        let mut channel = MockChatChannel::new();
        channel
            .expect_post()
            .withf(|m: &Message| m.text.as_deref() == Some("*New article published!*"))
            .times(1)
            .returning(|_| Ok(()));

        let report = flat(channel).deliver(&[result(1)]).await;
        assert_eq!(report.delivered, 1);
        assert_eq!(report.tiers, vec![DeliveryTier::Flat]);
    }

    #[tokio::test]
    async fn test_connection_failure_names_slack() {
        let mut channel = MockChatChannel::new();
        channel
            .expect_post()
            .returning(|_| Err(RelayError::Channel("HTTP 500".to_string())));

        match flat(channel).test_connection().await.unwrap_err() {
            RelayError::ConnectionTest { service, .. } => assert_eq!(service, "Slack"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
