use chrono::{DateTime, FixedOffset, Utc};
use slack_client::{Attachment, Field, Message};

use super::TranslationResult;

/// Maximum number of article attachments in a batch message
pub const BATCH_ARTICLE_LIMIT: usize = 5;

const DETAIL_LIMIT: usize = 300;
const REPLY_DETAIL_LIMIT: usize = 600;
const EMPTY_SUMMARY: &str = "Summary unavailable.";

const COLOR_NEW: &str = "#36a64f";
const COLOR_ARTICLE: &str = "#2196F3";

/// Builds Slack payloads for articles and status messages
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    channel: String,
    username: String,
    footer: String,
    offset: FixedOffset,
}

impl MessageBuilder {
    pub fn new(channel: &str, username: &str, offset: FixedOffset) -> Self {
        Self {
            channel: channel.to_string(),
            username: username.to_string(),
            footer: "RSS Translator".to_string(),
            offset,
        }
    }

    fn base(&self, icon: &str) -> Message {
        Message {
            channel: Some(self.channel.clone()),
            username: Some(self.username.clone()),
            icon_emoji: Some(icon.to_string()),
            ..Default::default()
        }
    }

    fn local_time(&self, now: DateTime<Utc>) -> String {
        now.with_timezone(&self.offset)
            .format("%Y-%m-%d %H:%M:%S %:z")
            .to_string()
    }

    /// Single message with title, summary and details
    pub fn article(&self, result: &TranslationResult, now: DateTime<Utc>) -> Message {
        Message {
            text: Some("*New article published!*".to_string()),
            attachments: vec![Attachment {
                color: Some(COLOR_NEW.to_string()),
                title: Some(result.translated_title.clone()),
                title_link: Some(result.link.clone()),
                text: Some(format!("*Summary*\n{}", summary_or_placeholder(result))),
                fields: vec![
                    Field::new("Original title", &result.original_title, false),
                    Field::new(
                        "Details",
                        truncate_text(&result.translated_description, DETAIL_LIMIT),
                        false,
                    ),
                ],
                footer: Some(self.footer.clone()),
                timestamp: Some(now.timestamp()),
                mrkdwn_in: mrkdwn(&["text", "fields"]),
            }],
            ..self.base(":newspaper:")
        }
    }

    /// Title-only message that starts a thread
    pub fn thread_root(&self, result: &TranslationResult, now: DateTime<Utc>) -> Message {
        Message {
            text: Some("*New article published!*".to_string()),
            attachments: vec![Attachment {
                color: Some(COLOR_NEW.to_string()),
                title: Some(result.translated_title.clone()),
                title_link: Some(result.link.clone()),
                fields: vec![Field::new("Original title", &result.original_title, false)],
                footer: Some(format!("{} - summary in thread", self.footer)),
                timestamp: Some(now.timestamp()),
                mrkdwn_in: mrkdwn(&["text", "fields"]),
                ..Default::default()
            }],
            ..self.base(":newspaper:")
        }
    }

    /// Summary reply posted under `thread_ts`
    pub fn thread_reply(
        &self,
        result: &TranslationResult,
        thread_ts: &str,
        now: DateTime<Utc>,
    ) -> Message {
        Message {
            text: Some(format!("*Summary*\n{}", summary_or_placeholder(result))),
            attachments: vec![Attachment {
                color: Some(COLOR_ARTICLE.to_string()),
                title: Some("Details".to_string()),
                text: Some(truncate_text(&result.translated_description, REPLY_DETAIL_LIMIT)),
                fields: vec![Field::new(
                    "Link",
                    format!("<{}|Read the article>", result.link),
                    true,
                )],
                footer: Some(self.footer.clone()),
                timestamp: Some(now.timestamp()),
                mrkdwn_in: mrkdwn(&["text", "fields"]),
                ..Default::default()
            }],
            thread_ts: Some(thread_ts.to_string()),
            ..self.base(":memo:")
        }
    }

    /// Header attachment plus at most [`BATCH_ARTICLE_LIMIT`] article attachments
    pub fn batch(&self, results: &[TranslationResult], now: DateTime<Utc>) -> Message {
        let mut attachments = vec![Attachment {
            color: Some(COLOR_NEW.to_string()),
            title: Some(format!("{} new articles published!", results.len())),
            footer: Some(self.footer.clone()),
            timestamp: Some(now.timestamp()),
            mrkdwn_in: mrkdwn(&["text"]),
            ..Default::default()
        }];

        let shown = &results[..results.len().min(BATCH_ARTICLE_LIMIT)];
        for (i, result) in shown.iter().enumerate() {
            let mut text = summary_or_placeholder(result).to_string();
            if i + 1 < shown.len() {
                text.push_str("\n---");
            }

            attachments.push(Attachment {
                color: Some(COLOR_ARTICLE.to_string()),
                title: Some(result.translated_title.clone()),
                title_link: Some(result.link.clone()),
                text: Some(text),
                fields: vec![Field::new("Original title", &result.original_title, false)],
                mrkdwn_in: mrkdwn(&["text"]),
                ..Default::default()
            });
        }

        Message {
            attachments,
            ..self.base(":newspaper:")
        }
    }

    pub fn error(&self, message: &str, now: DateTime<Utc>) -> Message {
        Message {
            attachments: vec![Attachment {
                color: Some("danger".to_string()),
                title: Some("The RSS translator hit an error".to_string()),
                text: Some(message.to_string()),
                fields: vec![Field::new("Occurred at", self.local_time(now), true)],
                footer: Some(self.footer.clone()),
                timestamp: Some(now.timestamp()),
                mrkdwn_in: mrkdwn(&["text"]),
                ..Default::default()
            }],
            ..self.base(":warning:")
        }
    }

    pub fn startup(&self, feed_urls: &[String], now: DateTime<Utc>) -> Message {
        Message {
            attachments: vec![Attachment {
                color: Some("good".to_string()),
                title: Some("The RSS translator has started".to_string()),
                text: Some(format!("Watching {} feed(s).", feed_urls.len())),
                fields: vec![
                    Field::new("Started at", self.local_time(now), true),
                    Field::new("Feeds", feed_urls.join("\n"), true),
                ],
                footer: Some(self.footer.clone()),
                timestamp: Some(now.timestamp()),
                mrkdwn_in: mrkdwn(&["text"]),
                ..Default::default()
            }],
            ..self.base(":rocket:")
        }
    }

    pub fn connection_test(&self) -> Message {
        Message {
            text: Some(
                "Connection test from the RSS translator. If you can read this, delivery works."
                    .to_string(),
            ),
            ..self.base(":white_check_mark:")
        }
    }
}

fn summary_or_placeholder(result: &TranslationResult) -> &str {
    if result.summary.trim().is_empty() {
        EMPTY_SUMMARY
    } else {
        &result.summary
    }
}

fn mrkdwn(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

/// Truncate to at most `max_len` characters plus `...`.
/// Cuts at the last whitespace when it lies beyond the midpoint.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }

    let truncated: Vec<char> = text.chars().take(max_len).collect();
    let cut = truncated
        .iter()
        .rposition(|c| c.is_whitespace())
        .filter(|&pos| pos > max_len / 2)
        .unwrap_or(truncated.len());

    let mut out: String = truncated[..cut].iter().collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn builder() -> MessageBuilder {
        MessageBuilder::new(
            "#news",
            "Bot",
            FixedOffset::east_opt(9 * 3600).unwrap(),
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 0, 30, 0).unwrap()
    }

    fn result(n: usize) -> TranslationResult {
        TranslationResult {
            original_title: format!("Title {n}"),
            translated_title: format!("Titre {n}"),
            original_description: format!("Description {n}"),
            translated_description: format!("Description traduite {n}"),
            summary: format!("Summary {n}"),
            link: format!("https://example.com/{n}"),
        }
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_text("short text", 20), "short text");
    }

    #[test]
    fn test_truncate_at_word_boundary() {
        let text = "alpha beta gamma delta epsilon";
        assert_eq!(truncate_text(text, 20), "alpha beta gamma...");
    }

    #[test]
    fn test_truncate_hard_cut_when_boundary_before_midpoint() {
        let text = "ab cdefghijklmnopqrstuvwxyz";
        assert_eq!(truncate_text(text, 10), "ab cdefghi...");
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let text = "日本語のテキストです";
        assert_eq!(truncate_text(text, 4), "日本語の...");
    }

    #[test]
    fn test_article_message_fields() {
        let message = builder().article(&result(1), now());

        assert_eq!(message.channel.as_deref(), Some("#news"));
        assert!(message.thread_ts.is_none());
        let attachment = &message.attachments[0];
        assert_eq!(attachment.title.as_deref(), Some("Titre 1"));
        assert_eq!(attachment.title_link.as_deref(), Some("https://example.com/1"));
        assert_eq!(attachment.text.as_deref(), Some("*Summary*\nSummary 1"));
        assert_eq!(attachment.fields[0].value, "Title 1");
        assert_eq!(attachment.timestamp, Some(now().timestamp()));
    }

    #[test]
    fn test_empty_summary_uses_placeholder() {
        let mut r = result(1);
        r.summary = String::new();
        let message = builder().article(&r, now());
        assert_eq!(
            message.attachments[0].text.as_deref(),
            Some("*Summary*\nSummary unavailable.")
        );
    }

    #[test]
    fn test_thread_reply_carries_thread_ts() {
        let message = builder().thread_reply(&result(1), "1700000000.000100", now());
        assert_eq!(message.thread_ts.as_deref(), Some("1700000000.000100"));
        assert_eq!(
            message.attachments[0].fields[0].value,
            "<https://example.com/1|Read the article>"
        );
    }

    #[test]
    fn test_batch_caps_article_attachments() {
        let results: Vec<TranslationResult> = (1..=8).map(result).collect();
        let message = builder().batch(&results, now());

        assert_eq!(message.attachments.len(), 1 + BATCH_ARTICLE_LIMIT);
        assert_eq!(
            message.attachments[0].title.as_deref(),
            Some("8 new articles published!")
        );
        assert_eq!(message.attachments[5].title.as_deref(), Some("Titre 5"));
    }

    #[test]
    fn test_batch_separators_between_articles() {
        let results: Vec<TranslationResult> = (1..=2).map(result).collect();
        let message = builder().batch(&results, now());

        assert_eq!(message.attachments[1].text.as_deref(), Some("Summary 1\n---"));
        assert_eq!(message.attachments[2].text.as_deref(), Some("Summary 2"));
    }

    #[test]
    fn test_error_message_uses_display_offset() {
        let message = builder().error("feed down", now());
        let attachment = &message.attachments[0];
        assert_eq!(attachment.color.as_deref(), Some("danger"));
        assert_eq!(attachment.text.as_deref(), Some("feed down"));
        assert_eq!(attachment.fields[0].value, "2025-03-01 09:30:00 +09:00");
    }

    #[test]
    fn test_startup_lists_feeds() {
        let feeds = vec![
            "https://a.example.com/feed".to_string(),
            "https://b.example.com/feed".to_string(),
        ];
        let message = builder().startup(&feeds, now());
        let attachment = &message.attachments[0];
        assert_eq!(attachment.text.as_deref(), Some("Watching 2 feed(s)."));
        assert_eq!(
            attachment.fields[1].value,
            "https://a.example.com/feed\nhttps://b.example.com/feed"
        );
    }
}
