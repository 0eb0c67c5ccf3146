//! Connection Handler Module
//!
//! Each client connection is served by its own async task owning a private
//! `Session`; all tasks share one `StorageEngine`.
//!
//! ## Architecture
//!
//! ```text
//!  TcpListener (main.rs)
//!      │ accept
//!      ├──▶ task ─ ConnectionHandler ─ Session ─┐
//!      ├──▶ task ─ ConnectionHandler ─ Session ─┼──▶ Arc<StorageEngine>
//!      └──▶ task ─ ConnectionHandler ─ Session ─┘
//! ```
//!
//! ## Features
//!
//! - **Async I/O**: Tokio tasks, no thread per client
//! - **Pipelining**: several frames in one read are answered in order
//! - **Fail closed**: malformed or oversized input drops the connection
//! - **Statistics**: connection, command, byte and protocol-error counters

pub mod handler;

pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
