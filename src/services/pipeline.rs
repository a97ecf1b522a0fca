use crate::domain::{FeedItem, TranslationResult};
use crate::providers::traits::{Summarizer, Translator};

pub const SUMMARY_PLACEHOLDER: &str = "Summary unavailable.";
pub const SUMMARY_MAX_LINES: usize = 3;

/// Runs translation then summarization for one item, substituting fallbacks on failure
pub struct Pipeline<T: Translator, S: Summarizer> {
    translator: T,
    summarizer: S,
}

impl<T: Translator, S: Summarizer> Pipeline<T, S> {
    pub fn new(translator: T, summarizer: S) -> Self {
        Self {
            translator,
            summarizer,
        }
    }

    pub fn translator(&self) -> &T {
        &self.translator
    }

    pub fn summarizer(&self) -> &S {
        &self.summarizer
    }

    /// Never fails; each stage falls back independently
    pub async fn process(&self, item: &FeedItem) -> TranslationResult {
        tracing::info!(title = %item.title, "Processing item");

        let translated_title = self.translate_or_original(&item.title, "title").await;
        let translated_description = self
            .translate_or_original(&item.description, "description")
            .await;

        let summary = match self
            .summarizer
            .summarize(&translated_title, &translated_description)
            .await
        {
            Ok(summary) if !summary.trim().is_empty() => {
                truncate_lines(&summary, SUMMARY_MAX_LINES)
            }
            Ok(_) => {
                tracing::warn!(title = %item.title, "Summarizer returned an empty summary");
                SUMMARY_PLACEHOLDER.to_string()
            }
            Err(e) => {
                tracing::warn!(title = %item.title, error = %e, "Summarization failed");
                SUMMARY_PLACEHOLDER.to_string()
            }
        };

        TranslationResult {
            original_title: item.title.clone(),
            translated_title,
            original_description: item.description.clone(),
            translated_description,
            summary,
            link: item.link.clone(),
        }
    }

    async fn translate_or_original(&self, text: &str, part: &str) -> String {
        match self.translator.translate(text).await {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!(part, error = %e, "Translation failed, keeping original text");
                text.to_string()
            }
        }
    }
}

/// Keep the first `max_lines` lines of `text`
pub fn truncate_lines(text: &str, max_lines: usize) -> String {
    text.trim()
        .lines()
        .take(max_lines)
        .collect::<Vec<_>>()
        .join("\n")
}
