use serde::{Deserialize, Serialize};

/// Outcome of the translate-and-summarize pipeline for one feed item.
/// Fallback substitutions are already applied when this is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub original_title: String,
    pub translated_title: String,
    pub original_description: String,
    pub translated_description: String,
    pub summary: String,
    pub link: String,
}

impl TranslationResult {
    /// Plain-text rendering used by dry runs
    pub fn format(&self) -> String {
        let mut out = format!("{}\n  ({})", self.translated_title, self.original_title);

        if !self.summary.is_empty() {
            out.push_str("\n  ");
            out.push_str(&self.summary.replace('\n', "\n  "));
        }

        if !self.link.is_empty() {
            out.push_str("\n  ");
            out.push_str(&self.link);
        }

        out
    }
}
