//! Wire Frame Types
//!
//! This module defines the frames of the CinderKV wire protocol and how they
//! are written back onto a byte stream.
//!
//! ## Protocol Format
//!
//! Each frame starts with a type sigil byte:
//! - `+` Simple String
//! - `-` Error
//! - `:` Integer
//! - `$` Bulk String
//! - `*` Array
//!
//! All line-oriented parts are terminated with CRLF (`\r\n`).
//!
//! ## Examples
//!
//! Simple String: `+OK\r\n`
//! Error: `-ERR unknown command\r\n`
//! Integer: `:1000\r\n`
//! Bulk String: `$5\r\nhello\r\n`
//! Array: `*2\r\n$3\r\nGET\r\n$4\r\nname\r\n`
//! Null Bulk String: `$-1\r\n`

use bytes::Bytes;

/// The CRLF terminator used by every frame.
pub const CRLF: &[u8] = b"\r\n";

/// Frame type sigils.
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// One decoded (or to-be-encoded) protocol frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Format: `+<string>\r\n`
    SimpleString(String),

    /// Format: `-<error message>\r\n`
    Error(String),

    /// 64-bit signed integer.
    /// Format: `:<integer>\r\n`
    Integer(i64),

    /// Binary-safe, length-prefixed payload.
    /// Format: `$<length>\r\n<data>\r\n`
    BulkString(Bytes),

    /// Null bulk string: `$-1\r\n`
    Null,

    /// Format: `*<count>\r\n<frame1><frame2>...`
    Array(Vec<Frame>),
}

impl Frame {
    pub fn bulk_string(data: impl Into<Bytes>) -> Self {
        Frame::BulkString(data.into())
    }

    /// Builds an array of bulk strings, the shape every client command takes.
    pub fn command<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Bytes>,
    {
        Frame::Array(parts.into_iter().map(Frame::bulk_string).collect())
    }

    /// Serializes the frame into a fresh buffer.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the frame into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            Frame::SimpleString(s) => write_line(buf, prefix::SIMPLE_STRING, s.as_bytes()),
            Frame::Error(s) => write_line(buf, prefix::ERROR, s.as_bytes()),
            Frame::Integer(n) => write_line(buf, prefix::INTEGER, n.to_string().as_bytes()),
            Frame::BulkString(data) => write_bulk_string(buf, data),
            Frame::Null => write_line(buf, prefix::BULK_STRING, b"-1"),
            Frame::Array(frames) => {
                write_line(buf, prefix::ARRAY, frames.len().to_string().as_bytes());
                for frame in frames {
                    frame.serialize_into(buf);
                }
            }
        }
    }
}

#[inline]
fn write_line(buf: &mut Vec<u8>, sigil: u8, body: &[u8]) {
    buf.push(sigil);
    buf.extend_from_slice(body);
    buf.extend_from_slice(CRLF);
}

/// Emits `$<len>\r\n<value>\r\n`.
pub fn write_bulk_string(buf: &mut Vec<u8>, value: impl AsRef<[u8]>) {
    let value = value.as_ref();
    write_line(buf, prefix::BULK_STRING, value.len().to_string().as_bytes());
    buf.extend_from_slice(value);
    buf.extend_from_slice(CRLF);
}

/// Emits `*<count>\r\n` followed by each value bulk-encoded.
pub fn write_array<S: AsRef<[u8]>>(buf: &mut Vec<u8>, values: &[S]) {
    write_line(buf, prefix::ARRAY, values.len().to_string().as_bytes());
    for value in values {
        write_bulk_string(buf, value);
    }
}
