//! Local JSON file session tier

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sessionstore::{LocalStore, StoreError, StrategySession};
use tracing::debug;

use super::SessionTier;
use crate::chain::{Availability, Tier, TierError, TierResult};
use crate::config::LocalStoreConfig;

impl From<StoreError> for TierError {
    fn from(e: StoreError) -> Self {
        TierError::Failed(e.to_string())
    }
}

/// How long a store call waits for the file lock unless told otherwise
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Durable last-resort tier over [`LocalStore`]
///
/// Store calls block on file locks, so they run on the blocking pool. A
/// blocking task cannot be cancelled, so the tier bounds itself: it gives up
/// waiting for the lock after its lock timeout and never writes after that.
pub struct LocalTier {
    store: LocalStore,
    enabled: bool,
}

impl LocalTier {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            store: LocalStore::new(path.as_ref()).with_lock_timeout(DEFAULT_LOCK_TIMEOUT),
            enabled: true,
        }
    }

    pub fn from_config(config: &LocalStoreConfig) -> Self {
        debug!(enabled = config.enabled, path = %config.path.display(), "LocalTier::from_config: called");
        Self {
            store: LocalStore::new(&config.path).with_lock_timeout(DEFAULT_LOCK_TIMEOUT),
            enabled: config.enabled,
        }
    }

    /// Wait at most `timeout` for the file lock
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.store = self.store.with_lock_timeout(timeout);
        self
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    async fn run<T, F>(&self, op: F) -> TierResult<T>
    where
        T: Send + 'static,
        F: FnOnce(LocalStore) -> Result<T, StoreError> + Send + 'static,
    {
        if !self.enabled {
            return Err(TierError::Unavailable("disabled in config".to_string()));
        }
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || op(store))
            .await
            .map_err(|e| TierError::Failed(format!("local store task failed: {}", e)))?
            .map_err(TierError::from)
    }
}

impl Tier for LocalTier {
    fn name(&self) -> &str {
        "local"
    }

    fn availability(&self) -> Availability {
        if self.enabled {
            Availability::Ready
        } else {
            Availability::Unavailable("disabled in config".to_string())
        }
    }

    fn bounds_own_calls(&self) -> bool {
        true
    }
}

#[async_trait]
impl SessionTier for LocalTier {
    async fn try_save(&self, session: &StrategySession) -> TierResult<()> {
        debug!(session_id = %session.session_id, "LocalTier::try_save: called");
        let session = session.clone();
        self.run(move |store| store.append(&session)).await
    }

    async fn try_load(&self, user_id: &str, limit: usize) -> TierResult<Vec<StrategySession>> {
        debug!(%user_id, %limit, "LocalTier::try_load: called");
        let user_id = user_id.to_string();
        self.run(move |store| store.list(&user_id, limit)).await
    }
}
