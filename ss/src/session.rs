//! Strategy session record

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Maximum number of characters shown by [`StrategySession::summary`]
const SUMMARY_CHARS: usize = 50;

/// One completed generation event
///
/// Sessions are created once and never mutated. The field names double as
/// the on-disk and remote column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategySession {
    /// Unique session identifier (UUIDv7)
    pub session_id: String,
    /// Owner of the session
    pub user_id: String,
    /// Business problem as entered
    pub problem: String,
    /// Free-form context (may be empty)
    #[serde(default)]
    pub context: String,
    /// Generated strategic plan (markdown)
    pub response: String,
    /// Creation time, ISO-8601
    pub timestamp: String,
}

impl StrategySession {
    /// Create a new session stamped with a fresh id and the current time
    pub fn new(
        user_id: impl Into<String>,
        problem: impl Into<String>,
        context: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        let session = Self {
            session_id: Uuid::now_v7().to_string(),
            user_id: user_id.into(),
            problem: problem.into(),
            context: context.into(),
            response: response.into(),
            timestamp: now_timestamp(),
        };
        debug!(session_id = %session.session_id, user_id = %session.user_id, "StrategySession::new: called");
        session
    }

    /// Short one-line label for history listings
    pub fn summary(&self) -> String {
        if self.problem.chars().count() > SUMMARY_CHARS {
            let head: String = self.problem.chars().take(SUMMARY_CHARS).collect();
            format!("{}...", head)
        } else {
            self.problem.clone()
        }
    }
}

/// Current time as RFC 3339 UTC with microseconds
///
/// Fixed width, so lexical order matches chronological order.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Sort sessions by timestamp, newest first
///
/// Stable: sessions sharing a timestamp keep their stored order.
pub fn sort_newest_first(sessions: &mut [StrategySession]) {
    sessions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
