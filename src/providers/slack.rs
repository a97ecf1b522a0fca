use async_trait::async_trait;
use slack_client::{Message, SlackClient};

use crate::config::Config;
use crate::errors::RelayResult;
use crate::providers::traits::ChatChannel;

/// Slack delivery: incoming webhook for flat posts, bot token API for threads
pub struct SlackChannel {
    client: SlackClient,
}

impl SlackChannel {
    pub fn new(config: &Config) -> RelayResult<Self> {
        let client = SlackClient::new(&config.slack_webhook_url)?
            .with_bot_token(config.slack_bot_token.clone())
            .with_api_url(&config.slack_api_url);

        Ok(Self { client })
    }

    pub fn from_client(client: SlackClient) -> Self {
        Self { client }
    }

    pub fn supports_threads(&self) -> bool {
        self.client.has_bot_token()
    }
}

#[async_trait]
impl ChatChannel for SlackChannel {
    async fn post(&self, message: &Message) -> RelayResult<()> {
        self.client.post_webhook(message).await?;
        Ok(())
    }

    async fn post_threaded(&self, message: &Message) -> RelayResult<String> {
        let ts = self.client.post_message(message).await?;
        Ok(ts)
    }
}
