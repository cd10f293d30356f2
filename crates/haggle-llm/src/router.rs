//! LLM Router - Selects and manages LLM providers

use std::sync::Arc;

use crate::providers::*;
use crate::types::*;

/// The LLM Router selects and manages providers based on configuration
pub struct LlmRouter {
    provider: Arc<dyn LlmProvider>,
    kind: ProviderKind,
}

impl LlmRouter {
    /// Create a router with a specific provider
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        let kind = provider.kind();
        Self { provider, kind }
    }

    /// Create a router from environment variables
    ///
    /// Reads `HAGGLE_LLM_PROVIDER` to select the provider:
    /// - `ollama`: Local Ollama instance
    /// - `openai_compat`: OpenAI-compatible local server
    /// - `deterministic` (default): No LLM, scripted phrasing only
    pub fn from_env() -> Self {
        // Load .env if present (ignore errors)
        let _ = dotenvy::dotenv();

        let provider_name =
            std::env::var("HAGGLE_LLM_PROVIDER").unwrap_or_else(|_| "deterministic".to_string());

        let kind = ProviderKind::parse(&provider_name).unwrap_or_else(|| {
            tracing::warn!(provider = %provider_name, "unknown LLM provider, using deterministic");
            ProviderKind::Deterministic
        });

        Self::from_kind(kind)
    }

    /// Create a router for a specific provider kind
    pub fn from_kind(kind: ProviderKind) -> Self {
        let provider: Arc<dyn LlmProvider> = match kind {
            ProviderKind::Ollama => Arc::new(OllamaProvider::from_env()),
            ProviderKind::OpenAICompat => Arc::new(OpenAICompatProvider::from_env()),
            ProviderKind::Deterministic => Arc::new(DeterministicProvider::new()),
        };

        Self { provider, kind }
    }

    /// Get the provider kind
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Check if the provider is available
    pub async fn is_available(&self) -> bool {
        self.provider.is_available().await
    }

    /// Complete a request using the current provider
    pub async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.provider.complete(request).await
    }

    /// Complete a request, returning `None` when the provider declines or
    /// fails. Callers use this to fall back to scripted phrasing.
    pub async fn try_complete(&self, request: CompletionRequest) -> Option<CompletionResponse> {
        match self.provider.complete(request).await {
            Ok(response) => Some(response),
            Err(LlmError::ProviderNotAvailable { .. }) => None,
            Err(e) => {
                tracing::warn!(provider = %self.kind, error = %e, "LLM completion failed");
                None
            }
        }
    }
}

impl Default for LlmRouter {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deterministic_router_declines() {
        let router = LlmRouter::from_kind(ProviderKind::Deterministic);
        assert!(router.is_available().await);
        assert_eq!(router.kind(), ProviderKind::Deterministic);

        let request = CompletionRequest::new(vec![Message::user("Hello")]);
        assert!(router.try_complete(request).await.is_none());
    }
}
