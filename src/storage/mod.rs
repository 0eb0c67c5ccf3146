//! Storage Module
//!
//! Everything CinderKV keeps in memory, how it expires, and how it is saved
//! to disk.
//!
//! ## Architecture
//!
//! ```text
//!      connection tasks                  EXEC batches
//!            │                                │
//!            ▼                                ▼
//! ┌─────────────────────────┐   ┌──────────────────────────┐
//! │ KeyspaceOps for         │   │ KeyspaceOps for Keyspace │
//! │ &StorageEngine          │   │ (under the write guard)  │
//! │ (one lock per command)  │   └─────────────┬────────────┘
//! └────────────┬────────────┘                 │
//!              ▼                              ▼
//!      ┌──────────────────────────────────────────────┐
//!      │        StorageEngine: RwLock<Keyspace>       │
//!      └──────────────────────┬───────────────────────┘
//!                             │ bincode
//!                             ▼
//!                ┌──────────────────────────┐
//!                │ SnapshotScheduler / SAVE │
//!                └──────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Typed namespaces**: strings, lists, hashes (sets and sorted sets are
//!   reserved in the data model)
//! - **Lazy expiry**: expired keys are reaped by the next command touching them
//! - **Snapshots**: periodic, on `SAVE`, and at shutdown
//!
//! ## Example
//!
//! ```
//! use cinderkv::storage::{KeyspaceOps, StorageEngine};
//!
//! let engine = StorageEngine::new();
//! let mut db = &engine;
//!
//! db.set("name", "Ariz");
//! assert_eq!(db.get("name"), Some("Ariz".to_string()));
//!
//! db.expire("name", 3600);
//! assert!(db.ttl("name") > 0);
//! ```

pub mod engine;
pub mod keyspace;
pub mod ops;
pub mod scheduler;
pub mod snapshot;

pub use engine::{StorageEngine, StorageStats};
pub use keyspace::{Keyspace, SortedSetMember, StorageError};
pub use ops::{KeyspaceOps, ListEnd};
pub use scheduler::SnapshotScheduler;
pub use snapshot::SnapshotError;
