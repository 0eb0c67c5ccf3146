//! The operation set shared by the locking and non-locking layers.
//!
//! Command handlers are written once against [`KeyspaceOps`]. The same
//! handler runs against `&StorageEngine` (one lock acquisition per operation)
//! or against a `&mut Keyspace` borrowed from an exclusive guard (no locking,
//! used by `EXEC`).

use crate::storage::keyspace::StorageError;
use crate::storage::snapshot::SnapshotError;
use std::path::Path;

/// Which end of a list a push or pop works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEnd {
    Head,
    Tail,
}

/// Keyspace operations. Every method reaps an expired key before acting on it.
pub trait KeyspaceOps {
    /// Stores a string value. An existing live deadline is kept.
    fn set(&mut self, key: &str, value: &str);

    /// Stores a string value only if the key holds no live string.
    fn set_nx(&mut self, key: &str, value: &str) -> bool;

    fn mset(&mut self, pairs: &[(String, String)]);

    fn get(&mut self, key: &str) -> Option<String>;

    /// One entry per requested key, `None` where no live string exists.
    fn mget(&mut self, keys: &[String]) -> Vec<Option<String>>;

    /// Adds `delta` to the integer stored at `key`, treating absent as 0.
    fn incr_by(&mut self, key: &str, delta: i64) -> Result<i64, StorageError>;

    /// Pushes each value in order and returns the new list length.
    fn push(&mut self, key: &str, values: &[String], end: ListEnd) -> usize;

    fn pop(&mut self, key: &str, end: ListEnd) -> Result<String, StorageError>;

    /// Inclusive range with clamping. An empty vector means an empty slice.
    fn lrange(&mut self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, StorageError>;

    /// Returns the number of fields that did not exist before.
    fn hset(&mut self, key: &str, pairs: &[(String, String)]) -> usize;

    fn hget(&mut self, key: &str, field: &str) -> Option<String>;

    /// Returns the number of fields removed. An emptied hash is deleted.
    fn hdel(&mut self, key: &str, fields: &[String]) -> usize;

    /// All field/value pairs in field order.
    fn hgetall(&mut self, key: &str) -> Vec<(String, String)>;

    /// Removes keys from every namespace and returns how many existed.
    fn del(&mut self, keys: &[String]) -> usize;

    /// Sets the deadline to now plus `seconds` (which may be negative).
    fn expire(&mut self, key: &str, seconds: i64) -> bool;

    fn ttl(&mut self, key: &str) -> i64;

    fn save_snapshot(&mut self, path: &Path) -> Result<(), SnapshotError>;
}
