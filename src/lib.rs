//! # CinderKV - An In-Memory Multi-Type Key-Value Server
//!
//! CinderKV keeps strings, lists and hashes in memory, expires keys lazily,
//! runs `MULTI`/`EXEC` transactions atomically, and snapshots everything to
//! disk on a timer.
//!
//! ## Features
//!
//! - **Typed namespaces**: strings, lists, hashes; sets and sorted sets are
//!   reserved in the data model
//! - **Lazy expiry**: a key past its deadline is removed by the next command
//!   that touches it
//! - **Transactions**: queued commands run under one exclusive lock
//! - **Snapshots**: bincode snapshots on `SAVE`, on a timer, and at shutdown
//! - **Async I/O**: built on Tokio, one task per connection
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              CinderKV                                   │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│  Session    │                  │
//! │  │ (Listener)  │    │  Handler    │    │ (MULTI/EXEC)│                  │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘                  │
//! │                            │                  ▼                         │
//! │                     ┌──────┴──────┐    ┌─────────────┐                  │
//! │                     │ FrameParser │    │  Command    │                  │
//! │                     │ (pure)      │    │  Handler    │                  │
//! │                     └─────────────┘    └──────┬──────┘                  │
//! │                                               ▼                         │
//! │                     ┌──────────────────────────────────────────────┐    │
//! │                     │     StorageEngine: RwLock<Keyspace>          │    │
//! │                     └──────────────────────┬───────────────────────┘    │
//! │                                            ▲                            │
//! │                     ┌──────────────────────┴──────────────────────┐     │
//! │                     │        SnapshotScheduler (Tokio task)       │     │
//! │                     └─────────────────────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use cinderkv::commands::CommandHandler;
//! use cinderkv::connection::{handle_connection, ConnectionStats};
//! use cinderkv::storage::StorageEngine;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let storage = Arc::new(StorageEngine::open("cinderkv.snap".as_ref()).unwrap());
//!     let stats = Arc::new(ConnectionStats::new());
//!     let listener = TcpListener::bind("127.0.0.1:6369").await.unwrap();
//!
//!     loop {
//!         let (stream, addr) = listener.accept().await.unwrap();
//!         let handler = CommandHandler::new(Arc::clone(&storage), "cinderkv.snap");
//!         tokio::spawn(handle_connection(stream, addr, handler, Arc::clone(&stats)));
//!     }
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`protocol`]: frame types, the incremental parser, and `Command`
//! - [`storage`]: keyspace, locking engine, snapshots
//! - [`commands`]: dispatch, replies, transactions
//! - [`connection`]: per-client connection loop
//! - [`config`]: command-line and environment configuration

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::{CommandHandler, Reply, Session};
pub use config::Config;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{Command, Frame, FrameParser, ParseError};
pub use storage::{KeyspaceOps, SnapshotScheduler, StorageEngine};

/// The default port CinderKV listens on
pub const DEFAULT_PORT: u16 = 6369;

/// The default host CinderKV binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of CinderKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
