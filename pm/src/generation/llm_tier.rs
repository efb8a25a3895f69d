//! Generation tier backed by an LLM provider

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::GenerationTier;
use crate::chain::{Availability, Tier, TierError, TierResult};
use crate::config::{GenerationConfig, ProviderConfig};
use crate::llm::{CompletionRequest, LlmClient, Message, StopReason, create_client_from_resolved};
use crate::prompts::embedded;

/// One configured provider
///
/// A provider that is disabled, unknown, or missing its API key is built
/// anyway and reports itself unavailable, so `pm tiers` can show why.
pub struct LlmTier {
    name: String,
    client: Result<Arc<dyn LlmClient>, String>,
    max_tokens: u32,
    temperature: f32,
}

impl LlmTier {
    pub fn new(client: Arc<dyn LlmClient>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            name: client.provider().to_string(),
            client: Ok(client),
            max_tokens,
            temperature,
        }
    }

    pub fn from_config(entry: &ProviderConfig, config: &GenerationConfig) -> Self {
        debug!(provider = %entry.provider, enabled = entry.enabled, "LlmTier::from_config: called");
        let client = if entry.enabled {
            entry
                .resolve()
                .map_err(|e| e.to_string())
                .and_then(|resolved| create_client_from_resolved(&resolved).map_err(|e| e.to_string()))
        } else {
            debug!("LlmTier::from_config: provider disabled");
            Err("disabled in config".to_string())
        };

        Self {
            name: entry.provider.clone(),
            client,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

impl Tier for LlmTier {
    fn name(&self) -> &str {
        &self.name
    }

    fn availability(&self) -> Availability {
        match &self.client {
            Ok(_) => Availability::Ready,
            Err(reason) => Availability::Unavailable(reason.clone()),
        }
    }
}

#[async_trait]
impl GenerationTier for LlmTier {
    async fn try_generate(&self, prompt: &str) -> TierResult<String> {
        debug!(provider = %self.name, prompt_len = prompt.len(), "try_generate: called");
        let client = self.client.as_ref().map_err(|reason| TierError::Unavailable(reason.clone()))?;

        let request = CompletionRequest {
            system_prompt: embedded::SYSTEM.to_string(),
            messages: vec![Message::user(prompt)],
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
        };

        let response = client.complete(request).await.map_err(|e| {
            if e.is_rate_limit() {
                debug!(
                    provider = %self.name,
                    retry_after = ?e.retry_after(),
                    "try_generate: provider is rate limiting"
                );
            } else if e.is_retryable() {
                debug!(provider = %self.name, "try_generate: transient error after retries");
            }
            TierError::Failed(e.to_string())
        })?;

        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            total_tokens = response.usage.total(),
            "try_generate: response received"
        );
        if response.stop_reason == StopReason::MaxTokens {
            warn!(provider = %self.name, max_tokens = self.max_tokens, "Plan truncated at the token limit");
        }
        match response.text() {
            Some(text) => Ok(text.to_string()),
            None => {
                debug!("try_generate: empty response");
                Err(TierError::Failed("provider returned no text".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{CompletionResponse, LlmError, TokenUsage};

    #[tokio::test]
    async fn test_try_generate_returns_text() {
        let tier = LlmTier::new(Arc::new(MockLlmClient::new(vec![Ok("# Plan".to_string())])), 2048, 0.7);

        assert_eq!(tier.name(), "mock");
        assert!(tier.availability().is_ready());
        assert_eq!(tier.try_generate("prompt").await.unwrap(), "# Plan");
    }

    #[tokio::test]
    async fn test_empty_text_is_failure() {
        let tier = LlmTier::new(Arc::new(MockLlmClient::new(vec![Ok("  ".to_string())])), 2048, 0.7);
        assert!(matches!(tier.try_generate("prompt").await, Err(TierError::Failed(_))));
    }

    #[tokio::test]
    async fn test_client_error_is_failure() {
        let tier = LlmTier::new(Arc::new(MockLlmClient::new(vec![Err("overloaded".to_string())])), 2048, 0.7);
        assert!(matches!(tier.try_generate("prompt").await, Err(TierError::Failed(_))));
    }

    struct TruncatingClient;

    #[async_trait]
    impl LlmClient for TruncatingClient {
        fn provider(&self) -> &str {
            "truncating"
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            Ok(CompletionResponse {
                content: Some("# Plan\n\n## Strategy 1".to_string()),
                stop_reason: StopReason::MaxTokens,
                usage: TokenUsage {
                    input_tokens: 100,
                    output_tokens: 2048,
                },
            })
        }
    }

    #[tokio::test]
    async fn test_truncated_plan_is_still_served() {
        let tier = LlmTier::new(Arc::new(TruncatingClient), 2048, 0.7);
        assert_eq!(tier.try_generate("prompt").await.unwrap(), "# Plan\n\n## Strategy 1");
    }

    #[test]
    fn test_disabled_entry_unavailable() {
        let mut entry = ProviderConfig::named("openai");
        entry.enabled = false;

        let tier = LlmTier::from_config(&entry, &GenerationConfig::default());
        assert_eq!(tier.name(), "openai");
        assert_eq!(
            tier.availability(),
            Availability::Unavailable("disabled in config".to_string())
        );
    }

    #[test]
    fn test_unknown_provider_unavailable() {
        let tier = LlmTier::from_config(&ProviderConfig::named("watson"), &GenerationConfig::default());
        assert!(!tier.availability().is_ready());
    }
}
