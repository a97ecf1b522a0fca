//! Slack messaging bindings for Rust
//! Provides incoming-webhook posting and token-based `chat.postMessage` posting

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://slack.com/api";

#[derive(Error, Debug)]
pub enum SlackError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Slack returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Unexpected Slack response: {0}")]
    UnexpectedResponse(String),
    #[error("Slack API error: {0}")]
    Api(String),
    #[error("Bot token required for chat.postMessage")]
    MissingToken,
    #[error("Invalid header value")]
    InvalidHeader,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub title: String,
    pub value: String,
    pub short: bool,
}

impl Field {
    pub fn new(title: impl Into<String>, value: impl Into<String>, short: bool) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            short,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(rename = "ts", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mrkdwn_in: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_emoji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct SlackClient {
    webhook_url: String,
    api_url: String,
    bot_token: Option<String>,
    client: Client,
}

impl SlackClient {
    pub fn new(webhook_url: &str) -> Result<Self, SlackError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            webhook_url: webhook_url.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            bot_token: None,
            client,
        })
    }

    /// Enable `chat.postMessage`, which returns real message timestamps
    pub fn with_bot_token(mut self, token: Option<String>) -> Self {
        self.bot_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Override the Web API base URL
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    pub fn has_bot_token(&self) -> bool {
        self.bot_token.is_some()
    }

    /// Post a message through the incoming webhook.
    /// Slack answers a successful webhook call with HTTP 200 and the literal body `ok`.
    pub async fn post_webhook(&self, message: &Message) -> Result<(), SlackError> {
        let response = self.client.post(&self.webhook_url).json(message).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            return Err(SlackError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if body.trim() != "ok" {
            return Err(SlackError::UnexpectedResponse(body));
        }

        Ok(())
    }

    /// Post a message with `chat.postMessage` and return its timestamp
    pub async fn post_message(&self, message: &Message) -> Result<String, SlackError> {
        let token = self.bot_token.as_ref().ok_or(SlackError::MissingToken)?;
        let auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| SlackError::InvalidHeader)?;

        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.api_url))
            .header(AUTHORIZATION, auth)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: PostMessageResponse = response.json().await?;
        if !parsed.ok {
            return Err(SlackError::Api(
                parsed.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }

        parsed
            .ts
            .ok_or_else(|| SlackError::UnexpectedResponse("missing ts".to_string()))
    }
}
