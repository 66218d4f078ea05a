//! Session persistence
//!
//! The session holds two keys: [`USER_KEY`] with the signed-in profile as
//! JSON and [`ACCESS_TOKEN_KEY`] with the bearer token. [`FileSessionStorage`]
//! keeps them in a JSON file so a session survives restarts.

use crate::types::User;
use marketplace_core::environment::{SessionError, SessionStorage};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

/// Key of the cached profile
pub const USER_KEY: &str = "user";

/// Key of the bearer token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Session storage backed by a JSON object on disk
///
/// The whole file is rewritten on every change.
#[derive(Debug)]
pub struct FileSessionStorage {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileSessionStorage {
    /// Open the session file, starting empty when it does not exist yet
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] if the file exists but cannot be read and
    /// [`SessionError::Serialization`] if it is not a JSON object of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| SessionError::Serialization(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(SessionError::Io(e.to_string())),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "Opened session file");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Location of the session file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy, write it, and keep it only once it is on disk
    fn update<F>(&self, change: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = entries.clone();
        change(&mut next);

        let raw = serde_json::to_string_pretty(&next)
            .map_err(|e| SessionError::Serialization(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SessionError::Io(e.to_string()))?;
        }
        std::fs::write(&self.path, raw).map_err(|e| SessionError::Io(e.to_string()))?;

        *entries = next;
        Ok(())
    }
}

impl SessionStorage for FileSessionStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<(), SessionError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value);
        })
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.update(BTreeMap::clear)
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), SessionError> {
        self.update(|stored| {
            stored.extend(entries.iter().map(|(key, value)| ((*key).to_string(), value.clone())));
        })
    }
}

/// Orders session writes made by responses against logout
///
/// A request reads the current [`epoch`](Self::epoch) when it is dispatched.
/// Logging out clears the storage and starts a new epoch under the same lock,
/// so a response to a request sent before the logout can no longer write the
/// session, whichever order the two complete in.
#[derive(Debug, Default)]
pub struct SessionGuard {
    epoch: Mutex<u64>,
}

impl SessionGuard {
    /// Start at epoch zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current epoch
    #[must_use]
    pub fn epoch(&self) -> u64 {
        *self.epoch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `write` unless the session was cleared after `epoch` was read
    ///
    /// Returns whether `write` ran.
    ///
    /// # Errors
    ///
    /// Returns the [`SessionError`] of `write`.
    pub fn write_since<F>(&self, epoch: u64, write: F) -> Result<bool, SessionError>
    where
        F: FnOnce() -> Result<(), SessionError>,
    {
        let current = self.epoch.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != epoch {
            tracing::debug!(epoch, current = *current, "Skipped session write after logout");
            return Ok(false);
        }
        write()?;
        Ok(true)
    }

    /// Clear `session` and start a new epoch
    ///
    /// The epoch only advances when the storage was actually cleared.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the storage cannot be cleared.
    pub fn clear(&self, session: &dyn SessionStorage) -> Result<(), SessionError> {
        let mut current = self.epoch.lock().unwrap_or_else(PoisonError::into_inner);
        session.clear()?;
        *current += 1;
        Ok(())
    }
}

/// The cached profile, if a readable one is stored
#[must_use]
pub fn cached_user(session: &dyn SessionStorage) -> Option<User> {
    let raw = session.get(USER_KEY)?;
    match serde_json::from_str(&raw) {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unreadable cached user");
            None
        },
    }
}

/// The stored bearer token
#[must_use]
pub fn access_token(session: &dyn SessionStorage) -> Option<String> {
    session
        .get(ACCESS_TOKEN_KEY)
        .filter(|token| !token.trim().is_empty())
}

/// Cache `user` as the signed-in profile
///
/// # Errors
///
/// Returns [`SessionError`] if the profile cannot be encoded or stored.
pub fn store_user(session: &dyn SessionStorage, user: &User) -> Result<(), SessionError> {
    let raw = serde_json::to_string(user).map_err(|e| SessionError::Serialization(e.to_string()))?;
    session.set(USER_KEY, raw)
}

/// Persist a fresh sign-in; both keys are written or neither is
///
/// # Errors
///
/// Returns [`SessionError`] if the profile cannot be encoded or the keys
/// cannot be stored.
pub fn store_sign_in(
    session: &dyn SessionStorage,
    user: &User,
    access_token: &str,
) -> Result<(), SessionError> {
    let raw = serde_json::to_string(user).map_err(|e| SessionError::Serialization(e.to_string()))?;
    session.set_many(&[(USER_KEY, raw), (ACCESS_TOKEN_KEY, access_token.to_string())])
}
