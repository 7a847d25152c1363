//! Login session records
//!
//! A session is a plain JSON snapshot of the logged-in user with an expiry.
//! Remembered logins persist under the data directory for
//! `users.config.sessionExpiryDays`; other logins live in the runtime
//! directory and expire after `session.ephemeral_hours`. Only one scope
//! holds a record at a time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::{SessionConfig, APP_DIR};
use crate::store::{write_atomic, DataStore, StoreError, User, UserSnapshot, UsersDocument};

const SESSION_FILE: &str = "session.json";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("I/O error on session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionScope {
    /// Remember-me: survives restarts until expiry
    Persistent,
    /// Current login only
    Ephemeral,
}

impl SessionScope {
    pub fn for_remember(remember: bool) -> Self {
        if remember {
            Self::Persistent
        } else {
            Self::Ephemeral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Persistent => "persistent",
            Self::Ephemeral => "ephemeral",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: UserSnapshot,
    pub logged_in: bool,
    pub expires_at: DateTime<Utc>,
    pub remember: bool,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn scope(&self) -> SessionScope {
        SessionScope::for_remember(self.remember)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

/// Per-user runtime directory, or `<data_dir>/run` without one
///
/// Never the shared temp directory: the record holds personal details.
fn ephemeral_dir(runtime_dir: Option<PathBuf>, data_dir: &Path) -> PathBuf {
    match runtime_dir {
        Some(dir) => dir.join(APP_DIR),
        None => data_dir.join("run"),
    }
}

/// Reads and writes session records for both scopes
#[derive(Debug, Clone)]
pub struct SessionStore {
    persistent_path: PathBuf,
    ephemeral_path: PathBuf,
    ephemeral_hours: i64,
}

impl SessionStore {
    pub fn new(data_dir: &Path, config: &SessionConfig) -> Self {
        Self::with_paths(
            data_dir.join(SESSION_FILE),
            ephemeral_dir(dirs::runtime_dir(), data_dir).join(SESSION_FILE),
            config.ephemeral_hours,
        )
    }

    pub fn with_paths(persistent_path: PathBuf, ephemeral_path: PathBuf, ephemeral_hours: i64) -> Self {
        Self {
            persistent_path,
            ephemeral_path,
            ephemeral_hours,
        }
    }

    fn path(&self, scope: SessionScope) -> &Path {
        match scope {
            SessionScope::Persistent => &self.persistent_path,
            SessionScope::Ephemeral => &self.ephemeral_path,
        }
    }

    /// Write a fresh session for `user` and drop any record in the other scope
    pub fn issue(
        &self,
        store: &DataStore,
        user: &User,
        remember: bool,
    ) -> Result<Session, SessionError> {
        let now = Utc::now();
        let lifetime = if remember {
            let users: UsersDocument = store.load()?;
            Duration::days(users.config.session_expiry_days.max(1))
        } else {
            Duration::hours(self.ephemeral_hours.max(1))
        };

        let session = Session {
            user: UserSnapshot::from(user),
            logged_in: true,
            expires_at: now + lifetime,
            remember,
            created_at: now,
        };

        let scope = session.scope();
        self.write(scope, &session)?;
        let other = match scope {
            SessionScope::Persistent => SessionScope::Ephemeral,
            SessionScope::Ephemeral => SessionScope::Persistent,
        };
        self.remove(other)?;

        tracing::info!(
            "Issued {} session for {} (expires {})",
            scope.as_str(),
            user.id,
            session.expires_at.to_rfc3339()
        );
        Ok(session)
    }

    /// Load the active session, if any
    ///
    /// Expired records, records for deleted users and unreadable records are
    /// removed. A surviving session gets its user snapshot refreshed.
    pub fn restore(&self, store: &DataStore) -> Result<Option<Session>, SessionError> {
        let now = Utc::now();

        for scope in [SessionScope::Ephemeral, SessionScope::Persistent] {
            let Some(mut session) = self.read(scope)? else {
                continue;
            };

            if !session.logged_in || session.is_expired(now) {
                tracing::info!("Discarding expired {} session", scope.as_str());
                self.remove(scope)?;
                continue;
            }

            let Some(user) = store.find_user_by_id(session.user_id())? else {
                tracing::warn!(
                    "Discarding {} session for unknown user {}",
                    scope.as_str(),
                    session.user_id()
                );
                self.remove(scope)?;
                continue;
            };

            let snapshot = UserSnapshot::from(&user);
            if snapshot != session.user {
                session.user = snapshot;
                self.write(scope, &session)?;
            }
            return Ok(Some(session));
        }

        Ok(None)
    }

    /// Log out: remove both scopes
    pub fn clear(&self) -> Result<(), SessionError> {
        self.remove(SessionScope::Ephemeral)?;
        self.remove(SessionScope::Persistent)?;
        tracing::info!("Session cleared");
        Ok(())
    }

    fn read(&self, scope: SessionScope) -> Result<Option<Session>, SessionError> {
        let path = self.path(scope);
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SessionError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!("Unreadable session at {}: {}", path.display(), e);
                self.remove(scope)?;
                Ok(None)
            }
        }
    }

    fn write(&self, scope: SessionScope, session: &Session) -> Result<(), SessionError> {
        let path = self.path(scope);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| SessionError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_vec_pretty(session)?;
        write_atomic(path, &json)?;
        Ok(())
    }

    fn remove(&self, scope: SessionScope) -> Result<(), SessionError> {
        let path = self.path(scope);
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{new_user, temp_store};
    use crate::store::UserUpdate;
    use tempfile::TempDir;

    fn session_store(dir: &TempDir) -> SessionStore {
        SessionStore::with_paths(
            dir.path().join("data").join("session.json"),
            dir.path().join("run").join("session.json"),
            24,
        )
    }

    #[test]
    fn test_ephemeral_dir_stays_private() {
        let data = Path::new("/home/jean/.local/share/parkinson-detect");
        assert_eq!(ephemeral_dir(None, data), data.join("run"));
        assert_eq!(
            ephemeral_dir(Some(PathBuf::from("/run/user/1000")), data),
            PathBuf::from("/run/user/1000").join(APP_DIR)
        );

        let config = SessionConfig::default();
        let sessions = SessionStore::new(data, &config);
        assert_ne!(
            sessions.path(SessionScope::Ephemeral),
            sessions.path(SessionScope::Persistent)
        );
        assert!(!sessions
            .path(SessionScope::Ephemeral)
            .starts_with(std::env::temp_dir()));
    }

    #[test]
    fn test_issue_and_restore_remembered() {
        let (dir, store) = temp_store();
        let sessions = session_store(&dir);
        let user = store.create_user(new_user("jean@x.com")).unwrap();

        let issued = sessions.issue(&store, &user, true).unwrap();
        assert_eq!(issued.scope(), SessionScope::Persistent);
        let days = (issued.expires_at - issued.created_at).num_days();
        assert_eq!(days, 30);

        let restored = sessions.restore(&store).unwrap().unwrap();
        assert_eq!(restored.user.id, user.id);
        assert!(restored.remember);
    }

    #[test]
    fn test_ephemeral_lifetime_and_scope_switch() {
        let (dir, store) = temp_store();
        let sessions = session_store(&dir);
        let user = store.create_user(new_user("jean@x.com")).unwrap();

        sessions.issue(&store, &user, true).unwrap();
        let issued = sessions.issue(&store, &user, false).unwrap();
        assert_eq!((issued.expires_at - issued.created_at).num_hours(), 24);
        assert!(!dir.path().join("data").join("session.json").exists());
        assert!(dir.path().join("run").join("session.json").exists());
    }

    #[test]
    fn test_expired_session_rejected_and_purged() {
        let (dir, store) = temp_store();
        let sessions = session_store(&dir);
        let user = store.create_user(new_user("jean@x.com")).unwrap();

        let mut session = sessions.issue(&store, &user, true).unwrap();
        session.expires_at = Utc::now() - Duration::minutes(1);
        sessions.write(SessionScope::Persistent, &session).unwrap();

        assert!(sessions.restore(&store).unwrap().is_none());
        assert!(!dir.path().join("data").join("session.json").exists());
    }

    #[test]
    fn test_session_for_deleted_user_purged() {
        let (dir, store) = temp_store();
        let sessions = session_store(&dir);
        let user = store.create_user(new_user("jean@x.com")).unwrap();
        sessions.issue(&store, &user, false).unwrap();

        store.delete_user(&user.id).unwrap();
        assert!(sessions.restore(&store).unwrap().is_none());
        assert!(!dir.path().join("run").join("session.json").exists());
    }

    #[test]
    fn test_restore_refreshes_snapshot() {
        let (dir, store) = temp_store();
        let sessions = session_store(&dir);
        let user = store.create_user(new_user("jean@x.com")).unwrap();
        sessions.issue(&store, &user, false).unwrap();

        store
            .update_user(
                &user.id,
                UserUpdate {
                    name: Some("Jean-Paul".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let restored = sessions.restore(&store).unwrap().unwrap();
        assert_eq!(restored.user.name, "Jean-Paul");
    }

    #[test]
    fn test_corrupt_session_ignored() {
        let (dir, store) = temp_store();
        let sessions = session_store(&dir);
        let path = dir.path().join("run").join("session.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{oops").unwrap();

        assert!(sessions.restore(&store).unwrap().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_clear_removes_both_scopes() {
        let (dir, store) = temp_store();
        let sessions = session_store(&dir);
        let user = store.create_user(new_user("jean@x.com")).unwrap();
        sessions.issue(&store, &user, true).unwrap();

        sessions.clear().unwrap();
        assert!(sessions.restore(&store).unwrap().is_none());
        // Clearing twice is fine
        sessions.clear().unwrap();
    }

    #[test]
    fn test_snapshot_has_no_password() {
        let (dir, store) = temp_store();
        let sessions = session_store(&dir);
        let user = store.create_user(new_user("jean@x.com")).unwrap();
        sessions.issue(&store, &user, true).unwrap();

        let raw = fs::read_to_string(dir.path().join("data").join("session.json")).unwrap();
        assert!(!raw.contains("pbkdf2"));
        assert!(raw.contains("\"loggedIn\": true"));
    }
}
