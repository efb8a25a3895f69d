//! PlanMind service facade
//!
//! Bundles the generation, persistence and export chains behind the four
//! orchestrator operations.

use sessionstore::StrategySession;
use tracing::{debug, warn};

use crate::chain::TierStatus;
use crate::config::Config;
use crate::export::Exporter;
use crate::generation::{Generated, StrategyGenerator};
use crate::persistence::SessionRepository;
use crate::request::StrategyRequest;

/// Tier availability of every chain
#[derive(Debug, Clone)]
pub struct ChainStatus {
    pub generation: Vec<TierStatus>,
    pub persistence: Vec<TierStatus>,
    pub export: Vec<TierStatus>,
}

/// Result of one consultation
#[derive(Debug, Clone)]
pub struct Consultation {
    pub session: StrategySession,
    /// Tier that produced the plan
    pub source: String,
    /// Whether the session was stored; `None` when saving was not requested
    pub saved: Option<bool>,
}

pub struct PlanMind {
    generator: StrategyGenerator,
    sessions: SessionRepository,
    exporter: Exporter,
}

impl PlanMind {
    pub fn new(generator: StrategyGenerator, sessions: SessionRepository, exporter: Exporter) -> Self {
        Self {
            generator,
            sessions,
            exporter,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        debug!("PlanMind::from_config: called");
        Self::new(
            StrategyGenerator::from_config(&config.generation),
            SessionRepository::from_config(&config.persistence),
            Exporter::from_config(&config.export),
        )
    }

    /// Markdown plan for the request; never fails
    pub async fn generate(&self, request: &StrategyRequest) -> String {
        self.generator.generate(request).await
    }

    pub async fn save(&self, session: &StrategySession) -> bool {
        self.sessions.save(session).await
    }

    /// Sessions for a user, newest first
    pub async fn load(&self, user_id: &str, limit: usize) -> Vec<StrategySession> {
        self.sessions.load(user_id, limit).await
    }

    pub fn export(&self, problem: &str, context: &str, response: &str) -> Vec<u8> {
        self.exporter.export(problem, context, response)
    }

    /// Generate a plan, wrap it in a new session and optionally store it
    ///
    /// A failed save is logged and reported in the result, never raised.
    pub async fn consult(&self, request: &StrategyRequest, user_id: &str, persist: bool) -> Consultation {
        debug!(%user_id, persist, "consult: called");
        let Generated { text, source } = self.generator.generate_with_source(request).await;
        let session = StrategySession::new(user_id, request.problem(), request.context(), text);

        let saved = if persist {
            let ok = self.save(&session).await;
            if !ok {
                warn!(session_id = %session.session_id, "Plan generated but not saved");
            }
            Some(ok)
        } else {
            debug!("consult: persistence not requested");
            None
        };

        Consultation { session, source, saved }
    }

    pub fn status(&self) -> ChainStatus {
        ChainStatus {
            generation: self.generator.tier_status(),
            persistence: self.sessions.tier_status(),
            export: self.exporter.tier_status(),
        }
    }
}
