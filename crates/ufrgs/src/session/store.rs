//! Persistence for authentication state across runs.

use crate::error::UfrgsError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default path for the binary session file.
pub const DEFAULT_BINARY_FILE: &str = "ufrgs_session.bin";
/// Default path for the JSON session file.
pub const DEFAULT_JSON_FILE: &str = "ufrgs_session.json";
/// Default maximum session age before a saved session is considered expired.
pub const DEFAULT_MAX_AGE_HOURS: i64 = 24;

/// Serializable capture of authentication state.
///
/// Created on successful login or on load from a [`SessionStore`]; only ever
/// replaced by a re-save after a fresh login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub cookies: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub saved_at: DateTime<Utc>,
}

impl SessionSnapshot {
    /// Creates a snapshot stamped with the current time.
    pub fn new(cookies: HashMap<String, String>, headers: HashMap<String, String>) -> Self {
        Self {
            cookies,
            headers,
            saved_at: Utc::now(),
        }
    }

    /// Age of this snapshot relative to now.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.saved_at)
    }
}

/// On-disk encoding for a session file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFormat {
    /// Compact bincode encoding
    Binary,
    /// Human-readable JSON
    Json,
}

/// Result of trying to load a saved session.
///
/// `Absent` and `Expired` are interchangeable to callers (neither is usable);
/// they are kept apart only so the logs say which one happened.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(SessionSnapshot),
    Absent,
    Expired,
}

/// File-backed store for session snapshots.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    format: SessionFormat,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>, format: SessionFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// Store at the default binary location (`ufrgs_session.bin`).
    pub fn binary_default() -> Self {
        Self::new(DEFAULT_BINARY_FILE, SessionFormat::Binary)
    }

    /// Store at the default JSON location (`ufrgs_session.json`).
    pub fn json_default() -> Self {
        Self::new(DEFAULT_JSON_FILE, SessionFormat::Json)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the snapshot to disk.
    pub fn save(&self, snapshot: &SessionSnapshot) -> Result<(), UfrgsError> {
        let bytes = match self.format {
            SessionFormat::Binary => {
                bincode::serialize(snapshot).map_err(|e| UfrgsError::Store {
                    message: e.to_string(),
                })?
            }
            SessionFormat::Json => {
                serde_json::to_vec_pretty(snapshot).map_err(|e| UfrgsError::Store {
                    message: e.to_string(),
                })?
            }
        };
        fs::write(&self.path, bytes)?;
        info!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Loads a snapshot, enforcing `max_age_hours` against the save timestamp.
    ///
    /// Age is computed now, not at save time. A missing, unreadable, or
    /// corrupt file is `Absent` — a stale session file must never take the
    /// whole run down when re-login can recover.
    pub fn load(&self, max_age_hours: i64) -> LoadOutcome {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no saved session file");
                return LoadOutcome::Absent;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read session file");
                return LoadOutcome::Absent;
            }
        };

        let snapshot: SessionSnapshot = match self.format {
            SessionFormat::Binary => match bincode::deserialize(&bytes) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "corrupt session file, ignoring");
                    return LoadOutcome::Absent;
                }
            },
            SessionFormat::Json => match serde_json::from_slice(&bytes) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "corrupt session file, ignoring");
                    return LoadOutcome::Absent;
                }
            },
        };

        if snapshot.age() > Duration::hours(max_age_hours) {
            info!(
                path = %self.path.display(),
                max_age_hours,
                "saved session is older than the maximum age, considering it expired"
            );
            return LoadOutcome::Expired;
        }

        info!(path = %self.path.display(), "session loaded");
        LoadOutcome::Loaded(snapshot)
    }

    /// Deletes the session file. Idempotent; returns whether a file was
    /// actually removed.
    pub fn delete(&self) -> bool {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "session file deleted");
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not delete session file");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str, format: SessionFormat) -> SessionStore {
        let path = std::env::temp_dir().join(format!(
            "ufrgs_store_test_{}_{}",
            std::process::id(),
            name
        ));
        SessionStore::new(path, format)
    }

    fn sample_snapshot() -> SessionSnapshot {
        SessionSnapshot::new(
            HashMap::from([("PHPSESSID".to_string(), "abc123".to_string())]),
            HashMap::from([("User-Agent".to_string(), "Mozilla/5.0".to_string())]),
        )
    }

    #[test]
    fn test_json_round_trip() {
        let store = temp_store("json_round_trip", SessionFormat::Json);
        let snapshot = sample_snapshot();
        store.save(&snapshot).unwrap();

        match store.load(DEFAULT_MAX_AGE_HOURS) {
            LoadOutcome::Loaded(loaded) => {
                assert_eq!(loaded.cookies, snapshot.cookies);
                assert_eq!(loaded.headers, snapshot.headers);
            }
            other => panic!("expected Loaded, got {other:?}"),
        }
        store.delete();
    }

    #[test]
    fn test_binary_round_trip() {
        let store = temp_store("binary_round_trip", SessionFormat::Binary);
        let snapshot = sample_snapshot();
        store.save(&snapshot).unwrap();

        match store.load(DEFAULT_MAX_AGE_HOURS) {
            LoadOutcome::Loaded(loaded) => {
                assert_eq!(loaded.cookies, snapshot.cookies);
                assert_eq!(loaded.headers, snapshot.headers);
            }
            other => panic!("expected Loaded, got {other:?}"),
        }
        store.delete();
    }

    #[test]
    fn test_expiry_boundary() {
        let store = temp_store("expiry", SessionFormat::Json);

        let mut stale = sample_snapshot();
        stale.saved_at = Utc::now() - Duration::hours(24) - Duration::minutes(1);
        store.save(&stale).unwrap();
        assert_eq!(store.load(24), LoadOutcome::Expired);

        let mut fresh = sample_snapshot();
        fresh.saved_at = Utc::now() - Duration::hours(24) + Duration::minutes(1);
        store.save(&fresh).unwrap();
        assert!(matches!(store.load(24), LoadOutcome::Loaded(_)));

        store.delete();
    }

    #[test]
    fn test_missing_file_is_absent() {
        let store = temp_store("missing", SessionFormat::Json);
        assert_eq!(store.load(DEFAULT_MAX_AGE_HOURS), LoadOutcome::Absent);
    }

    #[test]
    fn test_corrupt_file_is_absent() {
        let store = temp_store("corrupt", SessionFormat::Json);
        fs::write(store.path(), b"not json at all {{{").unwrap();
        assert_eq!(store.load(DEFAULT_MAX_AGE_HOURS), LoadOutcome::Absent);
        store.delete();
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = temp_store("delete", SessionFormat::Json);
        store.save(&sample_snapshot()).unwrap();
        assert!(store.delete());
        assert!(!store.delete());
    }
}
