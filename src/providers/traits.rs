use async_trait::async_trait;
use slack_client::Message;

use crate::errors::RelayResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate a single text into the configured target language
    async fn translate(&self, text: &str) -> RelayResult<String>;

    async fn test_connection(&self) -> RelayResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Generate a short summary of an article
    async fn summarize(&self, title: &str, description: &str) -> RelayResult<String>;

    async fn test_connection(&self) -> RelayResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatChannel: Send + Sync {
    /// Fire-and-forget delivery
    async fn post(&self, message: &Message) -> RelayResult<()>;

    /// Delivery that returns the platform message timestamp, needed to start or reply to a thread
    async fn post_threaded(&self, message: &Message) -> RelayResult<String>;
}
