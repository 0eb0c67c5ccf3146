//! Thread-Safe Storage Engine
//!
//! `StorageEngine` puts one store-wide reader/writer lock around the
//! [`Keyspace`]. Every command acquires it exactly once, and `EXEC` holds the
//! exclusive side for a whole queued batch.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      StorageEngine                       │
//! │   ┌──────────────────────────────────────────────────┐   │
//! │   │             RwLock<Keyspace>                     │   │
//! │   │  strings │ lists │ hashes │ sets │ zsets │ ttl   │   │
//! │   └──────────────────────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────┘
//!        ▲ shared: GET, MGET, LRANGE, HGET, HGETALL, TTL
//!        ▲ exclusive: writes, lazy expiry, EXEC batches
//! ```
//!
//! Reads start on the shared side. If the key they are about to read turns
//! out to be expired, they drop the shared guard and redo the operation
//! under the exclusive guard, which reaps the key first.

use crate::storage::keyspace::{list_range, Keyspace, StorageError};
use crate::storage::ops::{KeyspaceOps, ListEnd};
use crate::storage::snapshot::{self, SnapshotError};
use parking_lot::{Mutex, RwLock, RwLockWriteGuard};
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, info};

/// Key counts reported at startup and shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    /// Keys across all namespaces
    pub keys: usize,
    /// Keys carrying a deadline
    pub volatile_keys: usize,
}

/// The shared store.
#[derive(Debug, Default)]
pub struct StorageEngine {
    keyspace: RwLock<Keyspace>,
    /// Serializes snapshot writers; they share one temp file per path
    save_lock: Mutex<()>,
}

impl StorageEngine {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keyspace(keyspace: Keyspace) -> Self {
        Self {
            keyspace: RwLock::new(keyspace),
            save_lock: Mutex::new(()),
        }
    }

    /// Restores the engine from a snapshot file.
    ///
    /// A missing file is not an error: the engine starts empty. Any other
    /// failure is returned to the caller.
    pub fn open(path: &Path) -> Result<Self, SnapshotError> {
        match snapshot::load(path) {
            Ok(keyspace) => {
                info!(
                    path = %path.display(),
                    keys = keyspace.key_count(),
                    "Snapshot loaded"
                );
                Ok(Self::from_keyspace(keyspace))
            }
            Err(e) if e.is_not_found() => {
                info!(path = %path.display(), "No snapshot found, starting empty");
                Ok(Self::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Takes the exclusive lock. Used to run a transaction batch atomically.
    pub fn lock_exclusive(&self) -> RwLockWriteGuard<'_, Keyspace> {
        self.keyspace.write()
    }

    /// Writes a snapshot of the current contents to `path`.
    ///
    /// Holds the shared lock while encoding, so writers wait but readers
    /// continue. Only one snapshot is written at a time; a transaction batch
    /// saving under the exclusive lock already excludes this path.
    pub fn snapshot(&self, path: &Path) -> Result<(), SnapshotError> {
        let _saving = self.save_lock.lock();
        let keyspace = self.keyspace.read();
        snapshot::save(&keyspace, path)?;
        debug!(path = %path.display(), keys = keyspace.key_count(), "Snapshot written");
        Ok(())
    }

    pub fn stats(&self) -> StorageStats {
        let keyspace = self.keyspace.read();
        StorageStats {
            keys: keyspace.key_count(),
            volatile_keys: keyspace.expirations.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.keyspace.read().key_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Locking implementation: each call takes the lock once.
impl KeyspaceOps for &StorageEngine {
    fn set(&mut self, key: &str, value: &str) {
        self.keyspace.write().set(key, value);
    }

    fn set_nx(&mut self, key: &str, value: &str) -> bool {
        self.keyspace.write().set_nx(key, value)
    }

    fn mset(&mut self, pairs: &[(String, String)]) {
        self.keyspace.write().mset(pairs);
    }

    fn get(&mut self, key: &str) -> Option<String> {
        // Fast path: shared lock for live or missing keys
        {
            let keyspace = self.keyspace.read();
            if !keyspace.string_expired(key) {
                return keyspace.peek_string(key).cloned();
            }
        }

        // Expired: take the write lock to reap it
        self.keyspace.write().get(key)
    }

    fn mget(&mut self, keys: &[String]) -> Vec<Option<String>> {
        {
            let keyspace = self.keyspace.read();
            if !keys.iter().any(|key| keyspace.string_expired(key)) {
                return keys
                    .iter()
                    .map(|key| keyspace.peek_string(key).cloned())
                    .collect();
            }
        }

        self.keyspace.write().mget(keys)
    }

    fn incr_by(&mut self, key: &str, delta: i64) -> Result<i64, StorageError> {
        self.keyspace.write().incr_by(key, delta)
    }

    fn push(&mut self, key: &str, values: &[String], end: ListEnd) -> usize {
        self.keyspace.write().push(key, values, end)
    }

    fn pop(&mut self, key: &str, end: ListEnd) -> Result<String, StorageError> {
        self.keyspace.write().pop(key, end)
    }

    fn lrange(&mut self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, StorageError> {
        {
            let keyspace = self.keyspace.read();
            if !keyspace.list_expired(key) {
                return keyspace
                    .peek_list(key)
                    .map(|list| list_range(list, start, stop))
                    .ok_or(StorageError::NoSuchKey);
            }
        }

        self.keyspace.write().lrange(key, start, stop)
    }

    fn hset(&mut self, key: &str, pairs: &[(String, String)]) -> usize {
        self.keyspace.write().hset(key, pairs)
    }

    fn hget(&mut self, key: &str, field: &str) -> Option<String> {
        {
            let keyspace = self.keyspace.read();
            if !keyspace.hash_expired(key) {
                return keyspace
                    .peek_hash(key)
                    .and_then(|hash| hash.get(field))
                    .cloned();
            }
        }

        self.keyspace.write().hget(key, field)
    }

    fn hdel(&mut self, key: &str, fields: &[String]) -> usize {
        self.keyspace.write().hdel(key, fields)
    }

    fn hgetall(&mut self, key: &str) -> Vec<(String, String)> {
        {
            let keyspace = self.keyspace.read();
            if !keyspace.hash_expired(key) {
                return keyspace
                    .peek_hash(key)
                    .map(|hash| {
                        hash.iter()
                            .map(|(field, value)| (field.clone(), value.clone()))
                            .collect()
                    })
                    .unwrap_or_default();
            }
        }

        self.keyspace.write().hgetall(key)
    }

    fn del(&mut self, keys: &[String]) -> usize {
        self.keyspace.write().del(keys)
    }

    fn expire(&mut self, key: &str, seconds: i64) -> bool {
        self.keyspace.write().expire(key, seconds)
    }

    fn ttl(&mut self, key: &str) -> i64 {
        let now = SystemTime::now();
        if let Some(ttl) = self.keyspace.read().remaining_ttl_at(key, now) {
            return ttl;
        }

        self.keyspace.write().ttl(key)
    }

    fn save_snapshot(&mut self, path: &Path) -> Result<(), SnapshotError> {
        self.snapshot(path)
    }
}
