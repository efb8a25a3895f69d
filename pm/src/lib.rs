//! PlanMind - business strategy plans with graceful degradation
//!
//! Three fallback chains share one shape: an ordered list of tiers, tried
//! until one succeeds.
//!
//! - generation: configured LLM providers, then a canned plan
//! - persistence: Supabase, then a locked local JSON file
//! - export: the PDF renderer, then a placeholder payload

pub mod chain;
pub mod cli;
pub mod config;
pub mod export;
pub mod generation;
pub mod llm;
pub mod persistence;
pub mod prompts;
pub mod request;
pub mod service;

pub use chain::{Availability, Tier, TierError, TierResult, TierStatus};
pub use config::Config;
pub use export::{DocumentRenderer, ExportError, Exporter, PLACEHOLDER};
pub use generation::{Generated, GenerationTier, StrategyGenerator};
pub use persistence::{SessionRepository, SessionTier};
pub use request::{BusinessProfile, CompanySize, Industry, RequestError, StrategyRequest};
pub use service::{ChainStatus, Consultation, PlanMind};
pub use sessionstore::StrategySession;
