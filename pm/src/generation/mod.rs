//! Strategy generation chain
//!
//! Configured LLM providers are tried in order; when none of them produces
//! text the canned plan is returned, so generation itself never fails.

mod llm_tier;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

pub use llm_tier::LlmTier;

use crate::chain::{Availability, Tier, TierResult, TierStatus, attempt};
use crate::config::GenerationConfig;
use crate::prompts::{PromptLoader, embedded};
use crate::request::StrategyRequest;

/// Name reported when the canned plan was served
pub const STATIC_SOURCE: &str = "static";

/// One candidate text generator
#[async_trait]
pub trait GenerationTier: Tier {
    /// Produce a plan for the rendered `prompt`; empty text is a failure
    async fn try_generate(&self, prompt: &str) -> TierResult<String>;
}

/// Generated plan and the tier that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub text: String,
    pub source: String,
}

/// Terminal tier serving the canned plan
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticTier;

impl StaticTier {
    pub fn plan(&self) -> &'static str {
        embedded::FALLBACK_PLAN
    }
}

impl Tier for StaticTier {
    fn name(&self) -> &str {
        STATIC_SOURCE
    }

    fn availability(&self) -> Availability {
        Availability::Ready
    }
}

/// Ordered provider tiers plus the static terminal
pub struct StrategyGenerator {
    tiers: Vec<Arc<dyn GenerationTier>>,
    prompts: PromptLoader,
    deadline: Duration,
    terminal: StaticTier,
}

impl StrategyGenerator {
    pub fn new(tiers: Vec<Arc<dyn GenerationTier>>, prompts: PromptLoader, deadline: Duration) -> Self {
        debug!(tier_count = tiers.len(), ?deadline, "StrategyGenerator::new: called");
        Self {
            tiers,
            prompts,
            deadline,
            terminal: StaticTier,
        }
    }

    /// Build the provider tiers listed in configuration, in order
    pub fn from_config(config: &GenerationConfig) -> Self {
        debug!(provider_count = config.providers.len(), "StrategyGenerator::from_config: called");
        let tiers = config
            .providers
            .iter()
            .map(|entry| Arc::new(LlmTier::from_config(entry, config)) as Arc<dyn GenerationTier>)
            .collect();

        Self::new(
            tiers,
            PromptLoader::new(config.prompts_dir.as_deref()),
            Duration::from_millis(config.deadline_ms),
        )
    }

    /// Generate a plan; never fails
    pub async fn generate(&self, request: &StrategyRequest) -> String {
        self.generate_with_source(request).await.text
    }

    /// Generate a plan and report which tier served it
    pub async fn generate_with_source(&self, request: &StrategyRequest) -> Generated {
        debug!(problem_len = request.problem().len(), "generate_with_source: called");

        match self.prompts.strategy_prompt(request) {
            Ok(prompt) => {
                for tier in &self.tiers {
                    if let Some(text) =
                        attempt("generation", tier.as_ref(), self.deadline, tier.try_generate(&prompt)).await
                    {
                        info!(tier = %tier.name(), "Strategy generated");
                        return Generated {
                            text,
                            source: tier.name().to_string(),
                        };
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to render strategy prompt, skipping providers");
            }
        }

        info!("Using fallback strategy as no provider produced a plan");
        Generated {
            text: self.terminal.plan().to_string(),
            source: self.terminal.name().to_string(),
        }
    }

    /// Availability of every tier, static terminal last
    pub fn tier_status(&self) -> Vec<TierStatus> {
        debug!("StrategyGenerator::tier_status: called");
        self.tiers
            .iter()
            .map(|tier| TierStatus::of(tier.as_ref()))
            .chain(std::iter::once(TierStatus::of(&self.terminal)))
            .collect()
    }
}
