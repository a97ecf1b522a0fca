pub mod traits;
pub mod deepl;
pub mod openai;
pub mod slack;

pub use traits::{ChatChannel, Summarizer, Translator};
pub use deepl::DeepLTranslator;
pub use openai::OpenAiSummarizer;
pub use slack::SlackChannel;
