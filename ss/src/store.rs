//! Locked JSON-array session store

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;
use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::session::{StrategySession, sort_newest_first};

/// Errors from the local session store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to replace store file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Store is locked by another writer (waited {0:?})")]
    LockTimeout(Duration),
}

/// Interval between lock attempts when a lock timeout is set
const LOCK_POLL: Duration = Duration::from_millis(10);

/// Raw contents of the store file
struct Snapshot {
    /// Every array entry, including ones that are not valid sessions
    entries: Vec<Value>,
    /// The file existed but was not a JSON array
    corrupt: bool,
}

/// Session store backed by one JSON array file
///
/// All access goes through an advisory lock on `<file>.lock`: shared for
/// reads, exclusive for the whole read-modify-write of an append.
///
/// With a lock timeout set, an operation that cannot take the lock in time
/// fails with [`StoreError::LockTimeout`] before touching the file.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
    lock_timeout: Option<Duration>,
}

impl LocalStore {
    /// Create a store over the given file (created lazily on first append)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        debug!(?path, "LocalStore::new: called");
        Self {
            path,
            lock_timeout: None,
        }
    }

    /// Give up waiting for the lock after `timeout` instead of blocking
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Path of the session array
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        sibling(&self.path, "lock")
    }

    /// First free backup name: `<file>.corrupt`, then `<file>.corrupt.1`, ...
    fn corrupt_path(&self) -> PathBuf {
        let first = sibling(&self.path, "corrupt");
        if !first.exists() {
            return first;
        }
        (1..)
            .map(|n| sibling(&self.path, &format!("corrupt.{}", n)))
            .find(|candidate| !candidate.exists())
            .unwrap_or(first)
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Open the lock file and take the lock; released when the handle drops
    fn lock(&self, exclusive: bool) -> Result<File, StoreError> {
        debug!(exclusive, "LocalStore::lock: called");
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        let Some(timeout) = self.lock_timeout else {
            if exclusive {
                FileExt::lock_exclusive(&lock)?;
            } else {
                FileExt::lock_shared(&lock)?;
            }
            return Ok(lock);
        };

        let started = Instant::now();
        loop {
            let attempt = if exclusive {
                FileExt::try_lock_exclusive(&lock)
            } else {
                FileExt::try_lock_shared(&lock)
            };
            match attempt {
                Ok(()) => return Ok(lock),
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    if started.elapsed() >= timeout {
                        debug!(?timeout, "LocalStore::lock: timed out");
                        return Err(StoreError::LockTimeout(timeout));
                    }
                    thread::sleep(LOCK_POLL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Read the array; missing or empty file is an empty snapshot
    fn read_snapshot(&self) -> Result<Snapshot, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("LocalStore::read_snapshot: file missing");
                return Ok(Snapshot {
                    entries: Vec::new(),
                    corrupt: false,
                });
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            debug!("LocalStore::read_snapshot: file empty");
            return Ok(Snapshot {
                entries: Vec::new(),
                corrupt: false,
            });
        }

        match serde_json::from_str::<Vec<Value>>(&content) {
            Ok(entries) => {
                debug!(entry_count = entries.len(), "LocalStore::read_snapshot: parsed");
                Ok(Snapshot {
                    entries,
                    corrupt: false,
                })
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Session store is corrupt, treating as empty");
                Ok(Snapshot {
                    entries: Vec::new(),
                    corrupt: true,
                })
            }
        }
    }

    /// Read every valid session under a shared lock
    fn read_sessions(&self) -> Result<Vec<StrategySession>, StoreError> {
        if !self.path.exists() {
            debug!("LocalStore::read_sessions: no store file");
            return Ok(Vec::new());
        }
        let _lock = self.lock(false)?;
        let snapshot = self.read_snapshot()?;

        Ok(snapshot
            .entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<StrategySession>(entry) {
                Ok(session) => Some(session),
                Err(e) => {
                    debug!(error = %e, "LocalStore::read_sessions: skipping malformed entry");
                    None
                }
            })
            .collect())
    }

    /// Append one session
    ///
    /// Entries that are not valid sessions are carried over untouched. A file
    /// that does not parse at all is moved to `<file>.corrupt` first.
    pub fn append(&self, session: &StrategySession) -> Result<(), StoreError> {
        debug!(session_id = %session.session_id, "LocalStore::append: called");
        let dir = self.parent_dir();
        fs::create_dir_all(&dir)?;

        let _lock = self.lock(true)?;
        let mut snapshot = self.read_snapshot()?;

        if snapshot.corrupt {
            let backup = self.corrupt_path();
            warn!(backup = %backup.display(), "Preserving corrupt session store");
            fs::rename(&self.path, &backup)?;
        }

        snapshot.entries.push(serde_json::to_value(session)?);

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, &snapshot.entries)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;

        info!(
            session_id = %session.session_id,
            total = snapshot.entries.len(),
            "Appended session to {}",
            self.path.display()
        );
        Ok(())
    }

    /// Sessions for one user, newest first, at most `limit`
    pub fn list(&self, user_id: &str, limit: usize) -> Result<Vec<StrategySession>, StoreError> {
        debug!(%user_id, limit, "LocalStore::list: called");
        let mut sessions: Vec<_> = self
            .read_sessions()?
            .into_iter()
            .filter(|s| s.user_id == user_id)
            .collect();
        sort_newest_first(&mut sessions);
        sessions.truncate(limit);
        Ok(sessions)
    }

    /// Look up a single session by id
    pub fn get(&self, session_id: &str) -> Result<Option<StrategySession>, StoreError> {
        debug!(%session_id, "LocalStore::get: called");
        Ok(self.read_sessions()?.into_iter().find(|s| s.session_id == session_id))
    }

    /// Number of valid sessions in the store
    pub fn count(&self) -> Result<usize, StoreError> {
        debug!("LocalStore::count: called");
        Ok(self.read_sessions()?.len())
    }
}

/// `sessions.json` -> `sessions.json.<ext>`
fn sibling(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session(user: &str, id: &str, timestamp: &str) -> StrategySession {
        StrategySession {
            session_id: id.to_string(),
            user_id: user.to_string(),
            problem: format!("problem {}", id),
            context: String::new(),
            response: format!("plan {}", id),
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn test_missing_file_lists_empty() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::new(temp.path().join("sessions.json"));

        assert!(store.list("anyone", 10).unwrap().is_empty());
        assert_eq!(store.count().unwrap(), 0);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_append_then_list_returns_session() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::new(temp.path().join("sessions.json"));
        let s = StrategySession::new("u1", "Problem", "Industry: Retail", "# Plan");

        store.append(&s).unwrap();

        let listed = store.list("u1", 1).unwrap();
        assert_eq!(listed, vec![s]);
    }

    #[test]
    fn test_list_filters_sorts_and_limits() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::new(temp.path().join("sessions.json"));

        store.append(&session("u1", "a", "2024-01-01T00:00:00.000000Z")).unwrap();
        store.append(&session("u2", "x", "2024-06-01T00:00:00.000000Z")).unwrap();
        store.append(&session("u1", "c", "2024-03-01T00:00:00.000000Z")).unwrap();
        store.append(&session("u1", "b", "2024-02-01T00:00:00.000000Z")).unwrap();

        let ids: Vec<_> = store
            .list("u1", 2)
            .unwrap()
            .into_iter()
            .map(|s| s.session_id)
            .collect();
        assert_eq!(ids, vec!["c", "b"]);
        assert_eq!(store.count().unwrap(), 4);
    }

    #[test]
    fn test_file_is_pretty_json_array() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sessions.json");
        let store = LocalStore::new(&path);
        store.append(&session("u1", "a", "2024-01-01T00:00:00.000000Z")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("[\n  {"));
        let parsed: Vec<Value> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["session_id"], "a");
    }

    #[test]
    fn test_corrupt_file_reads_empty_and_is_preserved() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sessions.json");
        fs::write(&path, "{ not json").unwrap();
        let store = LocalStore::new(&path);

        assert!(store.list("u1", 10).unwrap().is_empty());

        store.append(&session("u1", "a", "2024-01-01T00:00:00.000000Z")).unwrap();
        assert_eq!(store.list("u1", 10).unwrap().len(), 1);

        let backup = fs::read_to_string(temp.path().join("sessions.json.corrupt")).unwrap();
        assert_eq!(backup, "{ not json");
    }

    #[test]
    fn test_second_corruption_keeps_first_backup() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sessions.json");
        let store = LocalStore::new(&path);

        fs::write(&path, "{ first").unwrap();
        store.append(&session("u1", "a", "2024-01-01T00:00:00.000000Z")).unwrap();
        fs::write(&path, "{ second").unwrap();
        store.append(&session("u1", "b", "2024-02-01T00:00:00.000000Z")).unwrap();

        assert_eq!(fs::read_to_string(temp.path().join("sessions.json.corrupt")).unwrap(), "{ first");
        assert_eq!(fs::read_to_string(temp.path().join("sessions.json.corrupt.1")).unwrap(), "{ second");
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_lock_timeout_leaves_file_untouched() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sessions.json");
        let store = LocalStore::new(&path).with_lock_timeout(Duration::from_millis(50));

        let held = File::create(temp.path().join("sessions.json.lock")).unwrap();
        FileExt::lock_exclusive(&held).unwrap();

        let err = store
            .append(&session("u1", "a", "2024-01-01T00:00:00.000000Z"))
            .unwrap_err();
        assert!(matches!(err, StoreError::LockTimeout(_)));
        assert!(!path.exists());

        FileExt::unlock(&held).unwrap();
        store.append(&session("u1", "a", "2024-01-01T00:00:00.000000Z")).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_malformed_entries_skipped_but_kept() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sessions.json");
        fs::write(&path, r#"[{"note": "not a session"}]"#).unwrap();
        let store = LocalStore::new(&path);

        store.append(&session("u1", "a", "2024-01-01T00:00:00.000000Z")).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        let raw: Vec<Value> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0]["note"], "not a session");
    }

    #[test]
    fn test_get_by_id() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::new(temp.path().join("sessions.json"));
        store.append(&session("u1", "a", "2024-01-01T00:00:00.000000Z")).unwrap();

        assert_eq!(store.get("a").unwrap().map(|s| s.user_id), Some("u1".to_string()));
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_creates_parent_directories() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::new(temp.path().join("nested").join("deeper").join("sessions.json"));
        store.append(&session("u1", "a", "2024-01-01T00:00:00.000000Z")).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_sibling_paths() {
        let store = LocalStore::new("/data/sessions.json");
        assert_eq!(store.lock_path(), PathBuf::from("/data/sessions.json.lock"));
        assert_eq!(store.corrupt_path(), PathBuf::from("/data/sessions.json.corrupt"));
    }
}
