//! Tiered fallback primitives shared by the generation, persistence and
//! export pipelines
//!
//! A tier is one candidate implementation of a capability. Pipelines hold an
//! ordered list of tiers and take the first success; [`attempt`] runs one
//! tier under a deadline and turns every failure into a log line.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

/// Whether a tier can be tried right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Ready,
    Unavailable(String),
}

impl Availability {
    pub fn is_ready(&self) -> bool {
        matches!(self, Availability::Ready)
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Ready => write!(f, "ready"),
            Availability::Unavailable(reason) => write!(f, "unavailable ({})", reason),
        }
    }
}

/// Why a tier produced no result
#[derive(Debug, Error)]
pub enum TierError {
    #[error("tier unavailable: {0}")]
    Unavailable(String),

    #[error("tier failed: {0}")]
    Failed(String),

    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

pub type TierResult<T> = Result<T, TierError>;

/// Common surface of every tier
pub trait Tier: Send + Sync {
    /// Short name used in logs and status listings
    fn name(&self) -> &str;

    /// Cheap capability probe; must not perform I/O against the backend
    fn availability(&self) -> Availability;

    /// True when the tier enforces its own time limit
    ///
    /// Such calls are awaited to completion instead of being dropped at the
    /// chain deadline, so the reported outcome matches what actually happened.
    fn bounds_own_calls(&self) -> bool {
        false
    }
}

/// Name and availability of one tier, for status listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierStatus {
    pub name: String,
    pub availability: Availability,
}

impl TierStatus {
    pub fn of<T: Tier + ?Sized>(tier: &T) -> Self {
        Self {
            name: tier.name().to_string(),
            availability: tier.availability(),
        }
    }
}

/// Run one tier of `chain` under `deadline`
///
/// Unavailable tiers are skipped at debug level without being called. Errors
/// and deadline expiry are logged at warn level. Returns `Some` only on
/// success.
pub async fn attempt<T, R, F>(chain: &str, tier: &T, deadline: Duration, call: F) -> Option<R>
where
    T: Tier + ?Sized,
    F: Future<Output = TierResult<R>>,
{
    let name = tier.name();
    debug!(%chain, tier = %name, ?deadline, "attempt: called");

    if let Availability::Unavailable(reason) = tier.availability() {
        debug!(%chain, tier = %name, %reason, "attempt: tier unavailable, skipping");
        return None;
    }

    let outcome = if tier.bounds_own_calls() {
        debug!(%chain, tier = %name, "attempt: tier bounds its own calls");
        call.await
    } else {
        match tokio::time::timeout(deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(TierError::DeadlineExceeded(deadline)),
        }
    };

    match outcome {
        Ok(value) => {
            debug!(%chain, tier = %name, "attempt: tier succeeded");
            Some(value)
        }
        Err(TierError::Unavailable(reason)) => {
            debug!(%chain, tier = %name, %reason, "attempt: tier reported unavailable");
            None
        }
        Err(e) => {
            warn!(%chain, tier = %name, error = %e, "Tier failed, falling back");
            None
        }
    }
}
