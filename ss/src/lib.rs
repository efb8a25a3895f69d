//! SessionStore - durable local storage for strategy sessions
//!
//! Stores every [`StrategySession`] in a single pretty-printed JSON array.
//! Writers serialize through an exclusive lock on a sidecar file and replace
//! the array atomically, so concurrent processes never lose an append.
//!
//! # Layout
//!
//! ```text
//! ~/.local/share/planmind/
//! ├── sessions.json         # JSON array of sessions
//! ├── sessions.json.lock    # fs2 advisory lock
//! └── sessions.json.corrupt # previous file, kept if it failed to parse
//! ```
//!
//! # Example
//!
//! ```ignore
//! use sessionstore::{LocalStore, StrategySession};
//!
//! let store = LocalStore::new("sessions.json");
//! store.append(&StrategySession::new("user-1", "problem", "", "plan"))?;
//! let recent = store.list("user-1", 10)?;
//! ```

pub mod cli;
mod session;
mod store;

use std::path::PathBuf;

pub use session::{StrategySession, now_timestamp, sort_newest_first};
pub use store::{LocalStore, StoreError};

/// File name of the session array inside the data directory
pub const DEFAULT_FILE_NAME: &str = "sessions.json";

/// Default location of the session array (`<data_dir>/planmind/sessions.json`)
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("planmind")
        .join(DEFAULT_FILE_NAME)
}
