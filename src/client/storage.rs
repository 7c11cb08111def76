//! # Credential Storage
//!
//! Two key/value tiers hold the `(userId, userToken)` pair:
//!
//! - **Durable** (`FileStore`) - a JSON file that survives restarts
//! - **Volatile** (`MemoryStore`) - process memory, gone when the process exits
//!
//! [`CredentialStore`] keeps the pair in at most one tier at a time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::client::error::StorageError;
use crate::client::types::UserId;

/// Key holding the user id
pub const USER_ID_KEY: &str = "userId";
/// Key holding the token
pub const USER_TOKEN_KEY: &str = "userToken";

/// Minimal key/value storage, shaped like browser storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Write several keys as one change
    fn set_all(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Remove several keys as one change
    fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}

fn lock(entries: &Mutex<HashMap<String, String>>) -> MutexGuard<'_, HashMap<String, String>> {
    // A poisoned map is still a valid map.
    entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Volatile tier
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// Durable tier: a JSON object on disk, written through on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`.
    ///
    /// A missing file is an empty store. So is a file that is not a JSON object
    /// of strings: it is left on disk and replaced by the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(raw) if raw.iter().all(u8::is_ascii_whitespace) => HashMap::new(),
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|e| {
                tracing::warn!(
                    "[STORE] Ignoring unreadable credentials file {}: {}",
                    path.display(),
                    e
                );
                HashMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!("[STORE] Opened durable store at {}", path.display());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply `change` to a copy of the entries, write it out, and only then
    /// make it visible. A failed write leaves the store as it was.
    fn update(
        &self,
        change: impl FnOnce(&mut HashMap<String, String>) -> bool,
    ) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        let mut next = entries.clone();
        if !change(&mut next) {
            return Ok(());
        }
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.set_all(&[(key, value)])
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.remove_all(&[key])
    }

    fn set_all(&self, pairs: &[(&str, &str)]) -> Result<(), StorageError> {
        self.update(|entries| {
            for (key, value) in pairs {
                entries.insert(key.to_string(), value.to_string());
            }
            true
        })
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.update(|entries| {
            let mut changed = false;
            for key in keys {
                changed |= entries.remove(*key).is_some();
            }
            changed
        })
    }
}

/// Which tier a pair lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageTier {
    Durable,
    Volatile,
}

impl StorageTier {
    /// Tier chosen by a "remember me" checkbox
    pub fn for_remember(remember: bool) -> Self {
        if remember {
            StorageTier::Durable
        } else {
            StorageTier::Volatile
        }
    }
}

/// A stored `(userId, userToken)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub user_id: UserId,
    pub token: String,
}

impl CredentialPair {
    pub fn new(user_id: UserId, token: impl Into<String>) -> Self {
        Self {
            user_id,
            token: token.into(),
        }
    }
}

/// Both tiers behind one interface
#[derive(Clone)]
pub struct CredentialStore {
    durable: Arc<dyn KeyValueStore>,
    volatile: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(durable: Arc<dyn KeyValueStore>, volatile: Arc<dyn KeyValueStore>) -> Self {
        Self { durable, volatile }
    }

    /// Both tiers in memory, for tools and tests that must not touch disk
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    pub fn tier(&self, tier: StorageTier) -> &dyn KeyValueStore {
        match tier {
            StorageTier::Durable => self.durable.as_ref(),
            StorageTier::Volatile => self.volatile.as_ref(),
        }
    }

    /// Read the pair from `tier`, if both halves are there
    pub fn read(&self, tier: StorageTier) -> Option<CredentialPair> {
        let store = self.tier(tier);
        let user_id = store.get(USER_ID_KEY).filter(|v| !v.is_empty())?;
        let token = store.get(USER_TOKEN_KEY).filter(|v| !v.is_empty())?;
        Some(CredentialPair::new(UserId::new(user_id), token))
    }

    /// The durable pair, falling back to the volatile one
    pub fn load(&self) -> Option<CredentialPair> {
        self.read(StorageTier::Durable)
            .or_else(|| self.read(StorageTier::Volatile))
    }

    /// Write `pair` into `tier` and clear the other tier.
    ///
    /// On error both tiers hold what they held before the call.
    pub fn persist(&self, pair: &CredentialPair, tier: StorageTier) -> Result<(), StorageError> {
        let other = match tier {
            StorageTier::Durable => StorageTier::Volatile,
            StorageTier::Volatile => StorageTier::Durable,
        };
        let target = self.tier(tier);
        let previous = snapshot(target);

        target.set_all(&[
            (USER_ID_KEY, pair.user_id.as_str()),
            (USER_TOKEN_KEY, pair.token.as_str()),
        ])?;
        if let Err(e) = self.clear(other) {
            if let Err(restore) = restore(target, &previous) {
                tracing::error!("[STORE] Could not roll back {:?} tier: {}", tier, restore);
            }
            return Err(e);
        }
        tracing::debug!("[STORE] Credentials saved to {:?} tier", tier);
        Ok(())
    }

    pub fn clear(&self, tier: StorageTier) -> Result<(), StorageError> {
        self.tier(tier).remove_all(&[USER_ID_KEY, USER_TOKEN_KEY])
    }

    /// Clear both tiers. Attempts both even if the first one fails.
    pub fn clear_all(&self) -> Result<(), StorageError> {
        let durable = self.clear(StorageTier::Durable);
        let volatile = self.clear(StorageTier::Volatile);
        durable.and(volatile)
    }
}

/// Raw values of both credential keys in one tier
fn snapshot(store: &dyn KeyValueStore) -> [(&'static str, Option<String>); 2] {
    [
        (USER_ID_KEY, store.get(USER_ID_KEY)),
        (USER_TOKEN_KEY, store.get(USER_TOKEN_KEY)),
    ]
}

fn restore(
    store: &dyn KeyValueStore,
    previous: &[(&'static str, Option<String>); 2],
) -> Result<(), StorageError> {
    for (key, value) in previous {
        match value {
            Some(value) => store.set(key, value)?,
            None => store.remove(key)?,
        }
    }
    Ok(())
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}
