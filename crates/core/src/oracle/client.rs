//! Gemini client for text generation

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;

use super::types::*;
use super::Oracle;
use crate::error::{Error, Result};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: GEMINI_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("GEMINI_API_KEY not set".into()))?;
        let value = HeaderValue::from_str(key)
            .map_err(|_| Error::Config("GEMINI_API_KEY contains invalid characters".into()))?;
        headers.insert("x-goog-api-key", value);

        Ok(headers)
    }

    /// Generate text for a single prompt
    pub async fn generate_content(&self, request: &GenerationRequest) -> Result<String> {
        let model = request.model.as_deref().unwrap_or(&self.model);
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let body = GenerateContentBody::from_request(request);

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(Error::Oracle(format!("{} - {}", status, message)));
        }

        parse_generation(&response.text().await?)
    }
}

/// Extracts the generated text from a generateContent response body
fn parse_generation(body: &str) -> Result<String> {
    let parsed: GenerateContentResponse = serde_json::from_str(body)?;
    parsed.text().ok_or_else(|| {
        Error::Oracle(format!(
            "empty response ({})",
            parsed.block_reason().unwrap_or("no candidates")
        ))
    })
}

#[async_trait]
impl Oracle for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.generate_content(request).await
    }
}
