//! Session persistence chain
//!
//! Remote store first, then the local file. A save lands in exactly one tier
//! and a load is served entirely by one tier; results are never merged.

mod local;
mod supabase;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sessionstore::StrategySession;
use tracing::{debug, info, warn};

pub use local::LocalTier;
pub use supabase::{SupabaseError, SupabaseStore};

use crate::chain::{Tier, TierResult, TierStatus, attempt};
use crate::config::PersistenceConfig;

/// One candidate session store
#[async_trait]
pub trait SessionTier: Tier {
    async fn try_save(&self, session: &StrategySession) -> TierResult<()>;

    /// Sessions for `user_id`, newest first, at most `limit`
    async fn try_load(&self, user_id: &str, limit: usize) -> TierResult<Vec<StrategySession>>;
}

/// Ordered session tiers
pub struct SessionRepository {
    tiers: Vec<Arc<dyn SessionTier>>,
    deadline: Duration,
}

impl SessionRepository {
    pub fn new(tiers: Vec<Arc<dyn SessionTier>>, deadline: Duration) -> Self {
        debug!(tier_count = tiers.len(), ?deadline, "SessionRepository::new: called");
        Self { tiers, deadline }
    }

    /// Remote then local, as configured
    pub fn from_config(config: &PersistenceConfig) -> Self {
        debug!("SessionRepository::from_config: called");
        let deadline = Duration::from_millis(config.deadline_ms);
        let tiers: Vec<Arc<dyn SessionTier>> = vec![
            Arc::new(SupabaseStore::from_config(&config.remote)),
            Arc::new(LocalTier::from_config(&config.local).with_lock_timeout(deadline)),
        ];
        Self::new(tiers, deadline)
    }

    /// Save through the first tier that accepts the session
    ///
    /// Returns false when every tier was unavailable or failed.
    pub async fn save(&self, session: &StrategySession) -> bool {
        debug!(session_id = %session.session_id, "SessionRepository::save: called");
        for tier in &self.tiers {
            if attempt("persistence", tier.as_ref(), self.deadline, tier.try_save(session))
                .await
                .is_some()
            {
                info!(tier = %tier.name(), session_id = %session.session_id, "Session saved");
                return true;
            }
        }
        warn!(session_id = %session.session_id, "Session could not be saved to any store");
        false
    }

    /// Load from the first tier that answers; empty when none does
    pub async fn load(&self, user_id: &str, limit: usize) -> Vec<StrategySession> {
        debug!(%user_id, %limit, "SessionRepository::load: called");
        if limit == 0 {
            debug!("SessionRepository::load: zero limit");
            return Vec::new();
        }

        for tier in &self.tiers {
            if let Some(mut sessions) =
                attempt("persistence", tier.as_ref(), self.deadline, tier.try_load(user_id, limit)).await
            {
                debug!(tier = %tier.name(), count = sessions.len(), "SessionRepository::load: served");
                sessions.truncate(limit);
                return sessions;
            }
        }
        warn!(%user_id, "No session store could be read");
        Vec::new()
    }

    pub fn tier_status(&self) -> Vec<TierStatus> {
        self.tiers.iter().map(|tier| TierStatus::of(tier.as_ref())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{Availability, TierError};
    use std::sync::Mutex;

    /// In-memory tier recording every call
    struct MemoryTier {
        name: &'static str,
        ready: bool,
        fail: bool,
        rows: Mutex<Vec<StrategySession>>,
    }

    impl MemoryTier {
        fn new(name: &'static str, ready: bool, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                ready,
                fail,
                rows: Mutex::new(Vec::new()),
            })
        }

        fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    impl Tier for MemoryTier {
        fn name(&self) -> &str {
            self.name
        }

        fn availability(&self) -> Availability {
            if self.ready {
                Availability::Ready
            } else {
                Availability::Unavailable("off".to_string())
            }
        }
    }

    #[async_trait]
    impl SessionTier for MemoryTier {
        async fn try_save(&self, session: &StrategySession) -> TierResult<()> {
            if self.fail {
                return Err(TierError::Failed("insert rejected".to_string()));
            }
            self.rows.lock().unwrap().push(session.clone());
            Ok(())
        }

        async fn try_load(&self, user_id: &str, limit: usize) -> TierResult<Vec<StrategySession>> {
            if self.fail {
                return Err(TierError::Failed("query rejected".to_string()));
            }
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.user_id == user_id)
                .take(limit)
                .cloned()
                .collect())
        }
    }

    fn repo(remote: &Arc<MemoryTier>, local: &Arc<MemoryTier>) -> SessionRepository {
        SessionRepository::new(
            vec![remote.clone() as Arc<dyn SessionTier>, local.clone()],
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_remote_success_skips_local() {
        let remote = MemoryTier::new("remote", true, false);
        let local = MemoryTier::new("local", true, false);

        assert!(repo(&remote, &local).save(&StrategySession::new("u", "p", "", "r")).await);
        assert_eq!(remote.len(), 1);
        assert_eq!(local.len(), 0);
    }

    #[tokio::test]
    async fn test_remote_failure_writes_local_once() {
        let remote = MemoryTier::new("remote", true, true);
        let local = MemoryTier::new("local", true, false);

        assert!(repo(&remote, &local).save(&StrategySession::new("u", "p", "", "r")).await);
        assert_eq!(local.len(), 1);
    }

    #[tokio::test]
    async fn test_all_tiers_down_returns_false() {
        let remote = MemoryTier::new("remote", false, false);
        let local = MemoryTier::new("local", true, true);

        let repo = repo(&remote, &local);
        assert!(!repo.save(&StrategySession::new("u", "p", "", "r")).await);
        assert!(repo.load("u", 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_load_never_merges() {
        let remote = MemoryTier::new("remote", true, false);
        let local = MemoryTier::new("local", true, false);
        remote.rows.lock().unwrap().push(StrategySession::new("u", "remote row", "", "r"));
        local.rows.lock().unwrap().push(StrategySession::new("u", "local row", "", "r"));

        let loaded = repo(&remote, &local).load("u", 10).await;

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].problem, "remote row");
    }

    #[tokio::test]
    async fn test_zero_limit_touches_nothing() {
        let remote = MemoryTier::new("remote", true, true);
        let local = MemoryTier::new("local", true, true);

        assert!(repo(&remote, &local).load("u", 0).await.is_empty());
    }

    #[test]
    fn test_tier_status_order() {
        let remote = MemoryTier::new("remote", false, false);
        let local = MemoryTier::new("local", true, false);

        let names: Vec<_> = repo(&remote, &local)
            .tier_status()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["remote", "local"]);
    }
}
