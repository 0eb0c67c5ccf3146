//! Command results and their wire rendering.
//!
//! Replies travel as human-readable text inside bulk strings:
//!
//! | Reply              | Text on the wire        |
//! |--------------------|-------------------------|
//! | `Ok`               | `OK`                    |
//! | `Integer(3)`       | `(integer) 3`           |
//! | `Nil`              | `(nil)`                 |
//! | `Empty`            | `empty`                 |
//! | `Error(e)`         | `(error) <message>`     |
//! | `Batch([])`        | `(empty array)`         |
//!
//! A non-empty `Batch` (the result of `EXEC`) is the only reply sent as an
//! array, one bulk string per queued command.

use crate::protocol::{write_array, write_bulk_string};
use crate::storage::StorageError;
use std::fmt;
use thiserror::Error;

/// Errors a command reports back to its client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Carries the uppercase verb.
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArity(String),

    #[error("ERR unknown command")]
    UnknownCommand,

    #[error("ERR value is not an integer")]
    NotAnInteger,

    #[error("ERR MULTI calls can not be nested")]
    NestedMulti,

    #[error("ERR DISCARD without MULTI")]
    DiscardWithoutMulti,

    #[error("ERR EXEC without MULTI")]
    ExecWithoutMulti,

    #[error("ERR snapshot failed: {0}")]
    Snapshot(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The outcome of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Pong,
    /// Acknowledges a command queued inside `MULTI`
    Queued,
    /// A stored value (or several, already space-joined)
    Value(String),
    Integer(i64),
    Nil,
    /// An empty range or hash
    Empty,
    Error(CommandError),
    /// Rendered results of an `EXEC` batch
    Batch(Vec<String>),
}

impl Reply {
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// Encodes the reply onto `buf`.
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        match self {
            Reply::Batch(results) if !results.is_empty() => write_array(buf, results),
            other => write_bulk_string(buf, other.to_string()),
        }
    }

    /// Encodes the reply into a fresh buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_to(&mut buf);
        buf
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => write!(f, "OK"),
            Reply::Pong => write!(f, "PONG"),
            Reply::Queued => write!(f, "QUEUED"),
            Reply::Value(value) => write!(f, "{}", value),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Nil => write!(f, "(nil)"),
            Reply::Empty => write!(f, "empty"),
            Reply::Error(e) => write!(f, "(error) {}", e),
            Reply::Batch(results) if results.is_empty() => write!(f, "(empty array)"),
            Reply::Batch(results) => {
                for (i, result) in results.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {}", i + 1, result)?;
                }
                Ok(())
            }
        }
    }
}

impl From<CommandError> for Reply {
    fn from(e: CommandError) -> Self {
        Reply::Error(e)
    }
}

impl From<StorageError> for Reply {
    fn from(e: StorageError) -> Self {
        Reply::Error(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_plain_replies() {
        assert_eq!(Reply::Ok.to_string(), "OK");
        assert_eq!(Reply::Pong.to_string(), "PONG");
        assert_eq!(Reply::Queued.to_string(), "QUEUED");
        assert_eq!(Reply::Value("hello".into()).to_string(), "hello");
        assert_eq!(Reply::Integer(-2).to_string(), "(integer) -2");
        assert_eq!(Reply::Nil.to_string(), "(nil)");
        assert_eq!(Reply::Empty.to_string(), "empty");
    }

    #[test]
    fn test_render_errors() {
        assert_eq!(
            Reply::from(CommandError::WrongArity("GET".into())).to_string(),
            "(error) ERR wrong number of arguments for 'GET' command"
        );
        assert_eq!(
            Reply::from(StorageError::WrongType).to_string(),
            "(error) WRONGTYPE Operation against a key holding the wrong kind of value"
        );
        assert_eq!(
            Reply::from(CommandError::NestedMulti).to_string(),
            "(error) ERR MULTI calls can not be nested"
        );
        assert_eq!(
            Reply::from(CommandError::Snapshot("disk full".into())).to_string(),
            "(error) ERR snapshot failed: disk full"
        );
    }

    #[test]
    fn test_render_batch() {
        let batch = Reply::Batch(vec!["OK".into(), "1".into()]);
        assert_eq!(batch.to_string(), "1) OK\n2) 1");
        assert_eq!(Reply::Batch(vec![]).to_string(), "(empty array)");
    }

    #[test]
    fn test_wire_encoding() {
        assert_eq!(Reply::Ok.to_bytes(), b"$2\r\nOK\r\n");
        assert_eq!(Reply::Integer(7).to_bytes(), b"$11\r\n(integer) 7\r\n");
        assert_eq!(
            Reply::Batch(vec!["OK".into(), "1".into()]).to_bytes(),
            b"*2\r\n$2\r\nOK\r\n$1\r\n1\r\n"
        );
        assert_eq!(Reply::Batch(vec![]).to_bytes(), b"$13\r\n(empty array)\r\n");
    }

    #[test]
    fn test_is_error() {
        assert!(Reply::from(CommandError::UnknownCommand).is_error());
        assert!(!Reply::Nil.is_error());
    }
}
