use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;

use crate::error::AiError;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Raw request/response exchange with a Responses-style endpoint.
#[async_trait]
pub trait ResponsesTransport: Send + Sync {
    async fn create_response(&self, body: &Value) -> Result<Value, AiError>;
}

pub struct OpenAiClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap, AiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| AiError::Config(format!("invalid API key header: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl ResponsesTransport for OpenAiClient {
    async fn create_response(&self, body: &Value) -> Result<Value, AiError> {
        let url = format!("{}/responses", self.base_url);

        debug!(model = %body["model"], "OpenAI responses request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(AiError::from_api_body(status.as_u16(), &error_text));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = OpenAiClient::new("sk-test").with_base_url("https://proxy.local/v1/");
        assert_eq!(client.base_url, "https://proxy.local/v1");
    }

    #[test]
    fn default_base_url() {
        let client = OpenAiClient::new("sk-test");
        assert_eq!(client.base_url, OPENAI_API_URL);
        assert!(client.headers().is_ok());
    }
}
