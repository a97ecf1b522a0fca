use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{RelayError, RelayResult};
use crate::providers::traits::Translator;

const CONNECTION_TEST_TEXT: &str = "Hello, World!";

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a [String],
    target_lang: &'a str,
    #[serde(skip_serializing_if = "is_blank")]
    source_lang: &'a str,
}

fn is_blank(s: &&str) -> bool {
    s.trim().is_empty()
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

/// DeepL translation client
pub struct DeepLTranslator {
    api_url: String,
    api_key: String,
    source_lang: String,
    target_lang: String,
    client: Client,
}

impl DeepLTranslator {
    pub fn new(api_url: &str, api_key: &str, source_lang: &str, target_lang: &str) -> Self {
        Self {
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn auth_header(&self) -> String {
        format!("DeepL-Auth-Key {}", self.api_key)
    }

    /// Translate several texts in one request; output order matches input order
    pub async fn translate_batch(&self, texts: &[String]) -> RelayResult<Vec<String>> {
        let body = TranslateRequest {
            text: texts,
            target_lang: &self.target_lang,
            source_lang: &self.source_lang,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;

        Self::read_translations(response, texts.len()).await
    }

    /// Form-encoded variant of the same request, accepted by older API plans
    pub async fn translate_form(&self, text: &str) -> RelayResult<String> {
        let mut form = vec![("text", text), ("target_lang", self.target_lang.as_str())];
        if !self.source_lang.is_empty() {
            form.push(("source_lang", self.source_lang.as_str()));
        }

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", self.auth_header())
            .form(&form)
            .send()
            .await?;

        let mut translations = Self::read_translations(response, 1).await?;
        Ok(translations.remove(0))
    }

    async fn read_translations(
        response: reqwest::Response,
        expected: usize,
    ) -> RelayResult<Vec<String>> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RelayError::Translation(format!(
                "DeepL API error: status={}, body={}",
                status.as_u16(),
                body
            )));
        }

        let parsed: TranslateResponse = serde_json::from_str(&body)
            .map_err(|e| RelayError::Translation(format!("invalid DeepL response: {}", e)))?;

        if parsed.translations.len() < expected || parsed.translations.is_empty() {
            return Err(RelayError::Translation(
                "no translations returned from DeepL".to_string(),
            ));
        }

        Ok(parsed.translations.into_iter().map(|t| t.text).collect())
    }
}

#[async_trait]
impl Translator for DeepLTranslator {
    async fn translate(&self, text: &str) -> RelayResult<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let mut translations = self.translate_batch(&[text.to_string()]).await?;
        Ok(translations.remove(0))
    }

    async fn test_connection(&self) -> RelayResult<()> {
        let json_err = match self.translate(CONNECTION_TEST_TEXT).await {
            Ok(_) => return Ok(()),
            Err(e) => e,
        };

        tracing::debug!(error = %json_err, "DeepL JSON request failed, trying form encoding");
        match self.translate_form(CONNECTION_TEST_TEXT).await {
            Ok(_) => Ok(()),
            Err(form_err) => Err(RelayError::ConnectionTest {
                service: "DeepL".to_string(),
                reason: format!("JSON: {}; form: {}", json_err, form_err),
            }),
        }
    }
}
