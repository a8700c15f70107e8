use async_trait::async_trait;

use crate::error::AiError;
use crate::openai::GenerationRequest;

// =============================================================================
// TextGenerator Trait
// =============================================================================

/// Anything that turns a generation request into plain reply text.
///
/// `ModelGateway` is the production implementation; pipelines hold an
/// `Arc<dyn TextGenerator>` so tests can swap in scripted replies.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, AiError>;
}
