//! Command Processing Module
//!
//! Takes decoded commands, runs them against the storage engine, and
//! produces replies.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  Frame Parser   │  (protocol module)
//! └────────┬────────┘
//!          │ Command
//!          ▼
//! ┌─────────────────┐
//! │    Session      │  MULTI / EXEC / DISCARD, queuing
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  dispatch, validate, execute
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ StorageEngine   │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - Strings: `SET`, `SETNX`, `GET`, `MSET`, `MGET`, `INCR`, `DECR`
//! - Lists: `LPUSH`, `RPUSH`, `LPOP`, `RPOP`, `LRANGE`
//! - Hashes: `HSET`, `HGET`, `HDEL`, `HGETALL`
//! - Keys: `DEL`, `EXPIRE`, `TTL`
//! - Server: `PING`, `SAVE`
//! - Transactions: `MULTI`, `EXEC`, `DISCARD`

pub mod handler;
pub mod reply;
pub mod transaction;

pub use handler::CommandHandler;
pub use reply::{CommandError, Reply};
pub use transaction::{Session, TxState};
