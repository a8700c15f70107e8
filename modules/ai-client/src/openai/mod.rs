mod client;
mod reply;
mod retry;
pub mod types;

pub use client::{OpenAiClient, ResponsesTransport};
pub use reply::reply_text;
pub use types::{GenerationRequest, RequestParam, ResponseFormat};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::AiError;
use crate::traits::TextGenerator;

const DEFAULT_MAX_ATTEMPTS: usize = 3;

// =============================================================================
// Gateway Config
// =============================================================================

/// Backend credential and connection settings, built once at startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub max_attempts: usize,
}

impl GatewayConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn from_env() -> Result<Self, AiError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| AiError::Config("OPENAI_API_KEY environment variable not set".into()))?;
        let mut config = Self::new(api_key);
        config.base_url = std::env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
}

// =============================================================================
// Model Gateway
// =============================================================================

/// Text-generation gateway.
///
/// Retries a request after dropping a parameter the backend rejected, up to
/// `max_attempts` calls in total, and flattens the reply into plain text.
#[derive(Clone)]
pub struct ModelGateway {
    transport: Arc<dyn ResponsesTransport>,
    max_attempts: usize,
}

impl ModelGateway {
    pub fn new(config: &GatewayConfig) -> Self {
        let client = OpenAiClient::new(&config.api_key);
        let client = match config.base_url {
            Some(ref url) => client.with_base_url(url),
            None => client,
        };
        Self::with_transport(Arc::new(client)).max_attempts(config.max_attempts)
    }

    pub fn with_transport(transport: Arc<dyn ResponsesTransport>) -> Self {
        Self {
            transport,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Run the request and return the reply text (`""` if the reply holds none).
    pub async fn invoke(&self, request: GenerationRequest) -> Result<String, AiError> {
        let reply = self.call_with_retry(request).await?;
        Ok(reply_text(&reply))
    }

    async fn call_with_retry(
        &self,
        mut request: GenerationRequest,
    ) -> Result<serde_json::Value, AiError> {
        let mut attempt = 1;
        loop {
            debug!(model = %request.model, attempt, "Model gateway call");

            let error = match self.transport.create_response(&request.to_wire()).await {
                Ok(reply) => return Ok(reply),
                Err(error) => error,
            };

            if attempt >= self.max_attempts {
                return Err(error);
            }

            let Some(param) = retry::rejected_param(&error, &request) else {
                return Err(error);
            };

            warn!(
                model = %request.model,
                param = param.as_str(),
                attempt,
                error = %error,
                "Backend rejected parameter, retrying without it"
            );
            request.drop_param(param);
            attempt += 1;
        }
    }
}

#[async_trait]
impl TextGenerator for ModelGateway {
    async fn generate(&self, request: GenerationRequest) -> Result<String, AiError> {
        self.invoke(request).await
    }
}
