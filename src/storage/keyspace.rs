//! The Keyspace: Typed Namespaces Plus Expiration Table
//!
//! `Keyspace` is plain owned data with no locking of its own. It is the
//! non-locking core behind every command: [`StorageEngine`] wraps it in the
//! store-wide lock for ordinary commands, and `EXEC` runs queued commands
//! directly against it while holding that lock for the whole batch.
//!
//! ## Lazy Expiry
//!
//! There is no background sweeper. Every path that reads a key first asks
//! the predicate of the namespace it is about to read (`string_expired`,
//! `list_expired`, `hash_expired`). If the key's deadline has passed, the key
//! is removed from every namespace and from the expiration table before the
//! operation continues, so the operation sees a key that never existed.
//!
//! Deadlines are absolute wall-clock times so they survive a snapshot.
//!
//! [`StorageEngine`]: crate::storage::StorageEngine

use crate::storage::ops::{KeyspaceOps, ListEnd};
use crate::storage::snapshot::{self, SnapshotError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::Path;
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// Used when `now + seconds` does not fit in a `SystemTime`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Errors raised by keyspace operations.
///
/// The messages are the exact texts clients see after `(error) `.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("ERR value is not an integer")]
    NotAnInteger,

    #[error("ERR increment or decrement would overflow")]
    Overflow,

    #[error("ERR no such key")]
    NoSuchKey,

    #[error("ERR list is empty")]
    EmptyList,
}

/// One member of a sorted set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortedSetMember {
    pub member: String,
    pub score: f64,
}

/// All stored data.
///
/// A key is expected to live in at most one namespace. Only INCR/DECR
/// enforce that; other commands address their own namespace and ignore the
/// rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Keyspace {
    pub(crate) strings: HashMap<String, String>,
    pub(crate) lists: HashMap<String, VecDeque<String>>,
    pub(crate) hashes: HashMap<String, BTreeMap<String, String>>,
    /// Reserved: no commands address sets yet.
    pub(crate) sets: HashMap<String, HashSet<String>>,
    /// Reserved: no commands address sorted sets yet.
    pub(crate) sorted_sets: HashMap<String, Vec<SortedSetMember>>,
    /// Absolute deadline per key. An entry exists only while the key does.
    pub(crate) expirations: HashMap<String, SystemTime>,
}

impl Keyspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys across all namespaces, expired-but-unreaped included.
    pub fn key_count(&self) -> usize {
        self.strings.len()
            + self.lists.len()
            + self.hashes.len()
            + self.sets.len()
            + self.sorted_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_count() == 0
    }

    /// Returns true if `key` is present in any namespace (expired or not).
    pub fn contains(&self, key: &str) -> bool {
        self.strings.contains_key(key)
            || self.lists.contains_key(key)
            || self.hashes.contains_key(key)
            || self.sets.contains_key(key)
            || self.sorted_sets.contains_key(key)
    }

    #[inline]
    fn deadline_passed(&self, key: &str) -> bool {
        self.expirations
            .get(key)
            .map(|deadline| SystemTime::now() >= *deadline)
            .unwrap_or(false)
    }

    // ========================================================================
    // Expiry predicates (one per namespace read path)
    // ========================================================================

    /// True if `key` is a string whose deadline has passed.
    pub fn string_expired(&self, key: &str) -> bool {
        self.strings.contains_key(key) && self.deadline_passed(key)
    }

    /// True if `key` is a list whose deadline has passed.
    pub fn list_expired(&self, key: &str) -> bool {
        self.lists.contains_key(key) && self.deadline_passed(key)
    }

    /// True if `key` is a hash whose deadline has passed.
    pub fn hash_expired(&self, key: &str) -> bool {
        self.hashes.contains_key(key) && self.deadline_passed(key)
    }

    /// True if `key` exists somewhere and its deadline has passed.
    pub fn key_expired(&self, key: &str) -> bool {
        self.deadline_passed(key) && self.contains(key)
    }

    // ========================================================================
    // Reaping
    // ========================================================================

    fn expire_string_if_due(&mut self, key: &str) {
        if self.string_expired(key) {
            self.evict(key);
        }
    }

    fn expire_list_if_due(&mut self, key: &str) {
        if self.list_expired(key) {
            self.evict(key);
        }
    }

    fn expire_hash_if_due(&mut self, key: &str) {
        if self.hash_expired(key) {
            self.evict(key);
        }
    }

    fn expire_key_if_due(&mut self, key: &str) {
        if self.key_expired(key) {
            self.evict(key);
        }
    }

    /// Removes `key` from every namespace and from the expiration table.
    ///
    /// Returns true if the key was present in any namespace.
    fn evict(&mut self, key: &str) -> bool {
        let mut removed = self.strings.remove(key).is_some();
        removed |= self.lists.remove(key).is_some();
        removed |= self.hashes.remove(key).is_some();
        removed |= self.sets.remove(key).is_some();
        removed |= self.sorted_sets.remove(key).is_some();
        self.expirations.remove(key);
        removed
    }

    /// Drops the deadline of a key that no longer lives in any namespace.
    fn forget_orphaned_deadline(&mut self, key: &str) {
        if !self.contains(key) {
            self.expirations.remove(key);
        }
    }

    // ========================================================================
    // Read-only views (used under the shared lock)
    // ========================================================================

    /// The live string value of `key`, if any.
    pub fn peek_string(&self, key: &str) -> Option<&String> {
        if self.string_expired(key) {
            return None;
        }
        self.strings.get(key)
    }

    /// The live list stored at `key`, if any.
    pub fn peek_list(&self, key: &str) -> Option<&VecDeque<String>> {
        if self.list_expired(key) {
            return None;
        }
        self.lists.get(key)
    }

    /// The live hash stored at `key`, if any.
    pub fn peek_hash(&self, key: &str) -> Option<&BTreeMap<String, String>> {
        if self.hash_expired(key) {
            return None;
        }
        self.hashes.get(key)
    }

    /// Remaining whole seconds to live as of `now`; -1 without a deadline,
    /// -2 if absent.
    ///
    /// Returns `None` when the key is still stored but its deadline is not
    /// after `now`, meaning it has to be reaped first.
    pub fn remaining_ttl_at(&self, key: &str, now: SystemTime) -> Option<i64> {
        if !self.contains(key) {
            return Some(-2);
        }
        match self.expirations.get(key) {
            None => Some(-1),
            Some(deadline) if *deadline <= now => None,
            Some(deadline) => deadline
                .duration_since(now)
                .ok()
                .map(|left| left.as_secs() as i64),
        }
    }

    /// Sets an absolute deadline on an existing key.
    ///
    /// Returns false if the key does not exist (or had already expired).
    pub fn expire_at(&mut self, key: &str, deadline: SystemTime) -> bool {
        self.expire_key_if_due(key);
        if !self.contains(key) {
            return false;
        }
        self.expirations.insert(key.to_string(), deadline);
        true
    }
}

/// Slices `list` by inclusive `start..=stop`, negative indices counting from
/// the end and out-of-range indices clamped to the list bounds.
pub(crate) fn list_range(list: &VecDeque<String>, start: i64, stop: i64) -> Vec<String> {
    let len = list.len() as i64;
    let start = if start < 0 { len + start } else { start }.max(0);
    let stop = if stop < 0 { len + stop } else { stop }.min(len - 1);

    if start > stop || start >= len {
        return Vec::new();
    }

    list.iter()
        .skip(start as usize)
        .take((stop - start + 1) as usize)
        .cloned()
        .collect()
}

impl KeyspaceOps for Keyspace {
    fn set(&mut self, key: &str, value: &str) {
        self.expire_string_if_due(key);
        self.strings.insert(key.to_string(), value.to_string());
    }

    fn set_nx(&mut self, key: &str, value: &str) -> bool {
        self.expire_string_if_due(key);
        if self.strings.contains_key(key) {
            return false;
        }
        self.strings.insert(key.to_string(), value.to_string());
        true
    }

    fn mset(&mut self, pairs: &[(String, String)]) {
        for (key, value) in pairs {
            self.set(key, value);
        }
    }

    fn get(&mut self, key: &str) -> Option<String> {
        self.expire_string_if_due(key);
        self.strings.get(key).cloned()
    }

    fn mget(&mut self, keys: &[String]) -> Vec<Option<String>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    fn incr_by(&mut self, key: &str, delta: i64) -> Result<i64, StorageError> {
        self.expire_key_if_due(key);

        if self.lists.contains_key(key) || self.hashes.contains_key(key) {
            return Err(StorageError::WrongType);
        }

        let current = match self.strings.get(key) {
            Some(value) => value
                .parse::<i64>()
                .map_err(|_| StorageError::NotAnInteger)?,
            None => 0,
        };
        let next = current.checked_add(delta).ok_or(StorageError::Overflow)?;

        self.strings.insert(key.to_string(), next.to_string());
        Ok(next)
    }

    fn push(&mut self, key: &str, values: &[String], end: ListEnd) -> usize {
        self.expire_list_if_due(key);

        let list = self.lists.entry(key.to_string()).or_default();
        for value in values {
            match end {
                // LPUSH l a b leaves [b, a]: each value becomes the new head.
                ListEnd::Head => list.push_front(value.clone()),
                ListEnd::Tail => list.push_back(value.clone()),
            }
        }
        list.len()
    }

    fn pop(&mut self, key: &str, end: ListEnd) -> Result<String, StorageError> {
        self.expire_list_if_due(key);

        let list = self.lists.get_mut(key).ok_or(StorageError::NoSuchKey)?;
        let value = match end {
            ListEnd::Head => list.pop_front(),
            ListEnd::Tail => list.pop_back(),
        }
        .ok_or(StorageError::EmptyList)?;

        if list.is_empty() {
            self.lists.remove(key);
            self.forget_orphaned_deadline(key);
        }
        Ok(value)
    }

    fn lrange(&mut self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, StorageError> {
        self.expire_list_if_due(key);
        self.lists
            .get(key)
            .map(|list| list_range(list, start, stop))
            .ok_or(StorageError::NoSuchKey)
    }

    fn hset(&mut self, key: &str, pairs: &[(String, String)]) -> usize {
        self.expire_hash_if_due(key);

        let hash = self.hashes.entry(key.to_string()).or_default();
        pairs
            .iter()
            .filter(|(field, value)| hash.insert(field.clone(), value.clone()).is_none())
            .count()
    }

    fn hget(&mut self, key: &str, field: &str) -> Option<String> {
        self.expire_hash_if_due(key);
        self.hashes.get(key).and_then(|hash| hash.get(field)).cloned()
    }

    fn hdel(&mut self, key: &str, fields: &[String]) -> usize {
        self.expire_hash_if_due(key);

        let Some(hash) = self.hashes.get_mut(key) else {
            return 0;
        };
        let removed = fields
            .iter()
            .filter(|field| hash.remove(field.as_str()).is_some())
            .count();

        if hash.is_empty() {
            self.hashes.remove(key);
            self.forget_orphaned_deadline(key);
        }
        removed
    }

    fn hgetall(&mut self, key: &str) -> Vec<(String, String)> {
        self.expire_hash_if_due(key);
        self.hashes
            .get(key)
            .map(|hash| {
                hash.iter()
                    .map(|(field, value)| (field.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn del(&mut self, keys: &[String]) -> usize {
        let mut removed = 0;
        for key in keys {
            self.expire_key_if_due(key);
            if self.evict(key) {
                removed += 1;
            }
        }
        removed
    }

    fn expire(&mut self, key: &str, seconds: i64) -> bool {
        let now = SystemTime::now();
        let offset = Duration::from_secs(seconds.unsigned_abs());
        let deadline = if seconds >= 0 {
            now.checked_add(offset).unwrap_or(now + FAR_FUTURE)
        } else {
            now.checked_sub(offset).unwrap_or(SystemTime::UNIX_EPOCH)
        };
        self.expire_at(key, deadline)
    }

    fn ttl(&mut self, key: &str) -> i64 {
        match self.remaining_ttl_at(key, SystemTime::now()) {
            Some(ttl) => ttl,
            None => {
                self.evict(key);
                -2
            }
        }
    }

    fn save_snapshot(&mut self, path: &Path) -> Result<(), SnapshotError> {
        snapshot::save(self, path)
    }
}
