//! Remote session tier over Supabase's PostgREST interface

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use sessionstore::StrategySession;
use thiserror::Error;
use tracing::debug;

use super::SessionTier;
use crate::chain::{Availability, Tier, TierError, TierResult};
use crate::config::RemoteStoreConfig;

/// Errors from the remote row store
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("PostgREST error {status}: {message}")]
    Status { status: u16, message: String },
}

impl From<SupabaseError> for TierError {
    fn from(e: SupabaseError) -> Self {
        TierError::Failed(e.to_string())
    }
}

struct Endpoint {
    url: String,
    key: String,
}

/// Supabase table client
pub struct SupabaseStore {
    endpoint: Result<Endpoint, String>,
    table: String,
    http: Client,
}

impl SupabaseStore {
    /// Client for `{url}/rest/v1/{table}`
    pub fn new(url: impl Into<String>, key: impl Into<String>, table: impl Into<String>, timeout: Duration) -> Self {
        let url: String = url.into();
        debug!(%url, "SupabaseStore::new: called");
        Self {
            endpoint: Ok(Endpoint {
                url: url.trim_end_matches('/').to_string(),
                key: key.into(),
            }),
            table: table.into(),
            http: build_http(timeout),
        }
    }

    /// Build from config; missing credentials leave the tier unavailable
    pub fn from_config(config: &RemoteStoreConfig) -> Self {
        debug!(enabled = config.enabled, table = %config.table, "SupabaseStore::from_config: called");
        let endpoint = if !config.enabled {
            Err("disabled in config".to_string())
        } else {
            config
                .credentials()
                .map(|(url, key)| Endpoint { url, key })
                .ok_or_else(|| format!("{} or {} is not set", config.url_env, config.key_env))
        };

        Self {
            endpoint,
            table: config.table.clone(),
            http: build_http(Duration::from_millis(config.timeout_ms)),
        }
    }

    fn endpoint(&self) -> TierResult<&Endpoint> {
        self.endpoint
            .as_ref()
            .map_err(|reason| TierError::Unavailable(reason.clone()))
    }

    fn table_url(&self, endpoint: &Endpoint) -> String {
        format!("{}/rest/v1/{}", endpoint.url, self.table)
    }

    /// Insert one row
    pub async fn insert(&self, session: &StrategySession) -> TierResult<()> {
        debug!(session_id = %session.session_id, "SupabaseStore::insert: called");
        let endpoint = self.endpoint()?;

        let response = self
            .http
            .post(self.table_url(endpoint))
            .header("apikey", &endpoint.key)
            .bearer_auth(&endpoint.key)
            .header("Prefer", "return=minimal")
            .json(session)
            .send()
            .await
            .map_err(SupabaseError::from)?;

        check_status(response).await?;
        Ok(())
    }

    /// Rows for `user_id`, newest first, at most `limit`
    pub async fn select(&self, user_id: &str, limit: usize) -> TierResult<Vec<StrategySession>> {
        debug!(%user_id, %limit, "SupabaseStore::select: called");
        let endpoint = self.endpoint()?;

        let response = self
            .http
            .get(self.table_url(endpoint))
            .header("apikey", &endpoint.key)
            .bearer_auth(&endpoint.key)
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", user_id)),
                ("order", "timestamp.desc".to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await
            .map_err(SupabaseError::from)?;

        let response = check_status(response).await?;
        let rows: Vec<StrategySession> = response.json().await.map_err(SupabaseError::from)?;
        debug!(row_count = rows.len(), "SupabaseStore::select: rows received");
        Ok(rows)
    }
}

fn build_http(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        debug!(error = %e, "build_http: falling back to default client");
        Client::new()
    })
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SupabaseError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    debug!(%status, "check_status: error status");
    let message = response.text().await.unwrap_or_default();
    Err(SupabaseError::Status {
        status: status.as_u16(),
        message,
    })
}

impl Tier for SupabaseStore {
    fn name(&self) -> &str {
        "supabase"
    }

    fn availability(&self) -> Availability {
        match &self.endpoint {
            Ok(_) => Availability::Ready,
            Err(reason) => Availability::Unavailable(reason.clone()),
        }
    }
}

#[async_trait]
impl SessionTier for SupabaseStore {
    async fn try_save(&self, session: &StrategySession) -> TierResult<()> {
        self.insert(session).await
    }

    async fn try_load(&self, user_id: &str, limit: usize) -> TierResult<Vec<StrategySession>> {
        self.select(user_id, limit).await
    }
}
