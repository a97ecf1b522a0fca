use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{RelayError, RelayResult};
use crate::providers::traits::Summarizer;

const SUMMARY_MAX_TOKENS: u32 = 200;
const SUMMARY_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn new(role: &str, content: String) -> Self {
        Self {
            role: role.to_string(),
            content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Summarizer backed by an OpenAI-compatible chat completions endpoint
pub struct OpenAiSummarizer {
    api_url: String,
    api_key: String,
    model: String,
    language: String,
    client: Client,
}

impl OpenAiSummarizer {
    pub fn new(api_url: &str, api_key: &str, model: &str, target_lang: &str) -> Self {
        Self {
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            language: language_name(target_lang).to_string(),
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
        temperature: Option<f32>,
    ) -> RelayResult<String> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            max_tokens,
            temperature,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Summarization(format!(
                "OpenAI API error: status={}, body={}",
                status.as_u16(),
                body
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| RelayError::Summarization(format!("invalid OpenAI response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| RelayError::Summarization("no summary generated".to_string()))
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are an assistant who specializes in summarizing technical articles. \
             Summarize the given article in {} in no more than 3 lines.",
            self.language
        )
    }

    fn user_prompt(&self, title: &str, description: &str) -> String {
        format!(
            "Summarize the following technical article in {} in 3 lines or fewer. \
             Keep it concise and include the key points and what the reader can learn.\n\n\
             Title: {}\n\nContent: {}\n\nSummary:",
            self.language, title, description
        )
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, title: &str, description: &str) -> RelayResult<String> {
        let messages = vec![
            ChatMessage::new("system", self.system_prompt()),
            ChatMessage::new("user", self.user_prompt(title, description)),
        ];

        self.complete(messages, SUMMARY_MAX_TOKENS, Some(SUMMARY_TEMPERATURE))
            .await
    }

    async fn test_connection(&self) -> RelayResult<()> {
        let messages = vec![ChatMessage::new(
            "user",
            "Hello, this is a connection test.".to_string(),
        )];

        self.complete(messages, 10, None)
            .await
            .map(|_| ())
            .map_err(|e| RelayError::ConnectionTest {
                service: "OpenAI".to_string(),
                reason: e.to_string(),
            })
    }
}

/// English name of a DeepL target language code, for use in prompts
fn language_name(code: &str) -> &str {
    match code.to_uppercase().split('-').next().unwrap_or_default() {
        "JA" => "Japanese",
        "EN" => "English",
        "DE" => "German",
        "FR" => "French",
        "ES" => "Spanish",
        "IT" => "Italian",
        "PT" => "Portuguese",
        "ZH" => "Chinese",
        "KO" => "Korean",
        "NL" => "Dutch",
        "PL" => "Polish",
        "RU" => "Russian",
        _ => code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const COMPLETION: &str = r#"{
        "id": "chatcmpl-1",
        "model": "gpt-3.5-turbo",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "  Line one\nLine two  "},
            "finish_reason": "stop"
        }]
    }"#;

    fn summarizer(url: &str) -> OpenAiSummarizer {
        OpenAiSummarizer::new(url, "sk-test", "gpt-3.5-turbo", "JA")
    }

    #[tokio::test]
    async fn test_summarize_sends_system_and_user_messages() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(serde_json::json!({
                    "model": "gpt-3.5-turbo",
                    "max_tokens": 200,
                    "temperature": 0.3,
                })),
                Matcher::Regex(r#""role":"system""#.to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(COMPLETION)
            .create_async()
            .await;

        let s = summarizer(&format!("{}/v1/chat/completions", server.url()));
        let summary = s.summarize("Caching", "All about caches").await.unwrap();

        assert_eq!(summary, "Line one\nLine two");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_summarize_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(429)
            .with_body(r#"{"error":{"message":"rate limited"}}"#)
            .create_async()
            .await;

        let s = summarizer(&server.url());
        match s.summarize("t", "d").await.unwrap_err() {
            RelayError::Summarization(msg) => assert!(msg.contains("429")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_no_choices_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let s = summarizer(&server.url());
        assert!(matches!(
            s.summarize("t", "d").await,
            Err(RelayError::Summarization(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_uses_small_token_cap() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(serde_json::json!({"max_tokens": 10})))
            .with_status(200)
            .with_body(COMPLETION)
            .create_async()
            .await;

        summarizer(&server.url()).test_connection().await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_connection_failure_names_service() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(401)
            .create_async()
            .await;

        match summarizer(&server.url()).test_connection().await.unwrap_err() {
            RelayError::ConnectionTest { service, .. } => assert_eq!(service, "OpenAI"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_prompts_name_target_language() {
        let s = summarizer("http://localhost");
        assert!(s.system_prompt().contains("Japanese"));
        assert!(s.user_prompt("T", "D").contains("Title: T"));
        assert_eq!(language_name("EN-US"), "English");
        assert_eq!(language_name("XX"), "XX");
    }
}
