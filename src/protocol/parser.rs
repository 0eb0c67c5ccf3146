//! Incremental Frame Parser
//!
//! The parser is a pure function of the bytes buffered so far. It never
//! touches the connection: when a frame is incomplete it says so, and the
//! caller reads more bytes and tries again.
//!
//! ## How the Parser Works
//!
//! The parser reads from a buffer and returns either:
//! - `Ok(Some((frame, consumed)))` - Successfully parsed a frame, `consumed` bytes were used
//! - `Ok(None)` - Need more data, the frame is incomplete
//! - `Err(ParseError)` - Invalid protocol data; the connection must be dropped
//!
//! Any leading byte that is not one of the five type sigils is rejected
//! outright. Plain-text input such as an HTTP request is never interpreted as
//! a command (cross-protocol scripting).
//!
//! Input is bounded: a frame (complete or still buffering) larger than the
//! configured maximum is an error, so a client cannot grow the buffer without
//! limit.

use crate::protocol::types::{prefix, Frame, CRLF};
use bytes::Bytes;
use std::num::ParseIntError;
use thiserror::Error;

/// Errors that can occur while decoding frames.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// Leading byte is not a type sigil
    #[error("unknown type prefix {0:#04x}: possible cross protocol scripting attack")]
    UnknownPrefix(u8),

    /// Invalid integer format
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Invalid UTF-8 in a line-oriented frame
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Bulk string length is negative (but not -1 for null)
    #[error("invalid bulk string length: {0}")]
    InvalidBulkLength(i64),

    /// Array length is negative
    #[error("invalid array length: {0}")]
    InvalidArrayLength(i64),

    /// Protocol violation (missing CRLF, excessive nesting, etc.)
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// The input exceeds the maximum allowed size
    #[error("input too long: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum number of bytes a single frame may occupy (50 KiB).
pub const MAX_FRAME_SIZE: usize = 50 * 1024;

/// Maximum array nesting depth (prevent stack overflow)
pub const MAX_NESTING_DEPTH: usize = 32;

/// An incremental frame parser.
///
/// # Example
///
/// ```
/// use cinderkv::protocol::{Frame, FrameParser};
///
/// let mut parser = FrameParser::new();
/// let input = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
///
/// let (frame, consumed) = parser.parse(input).unwrap().unwrap();
/// assert_eq!(consumed, input.len());
/// assert_eq!(frame, Frame::command(["GET", "name"]));
///
/// // A truncated frame asks for more input instead of failing.
/// assert!(parser.parse(&input[..10]).unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct FrameParser {
    /// Current nesting depth (for array parsing)
    depth: usize,
    /// Upper bound on the size of one frame
    max_frame_size: usize,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Creates a parser with the default [`MAX_FRAME_SIZE`] limit.
    pub fn new() -> Self {
        Self::with_max_frame_size(MAX_FRAME_SIZE)
    }

    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            depth: 0,
            max_frame_size,
        }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Attempts to decode one frame from the front of `buf`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some((frame, consumed)))` - Successfully parsed a frame
    /// - `Ok(None)` - Incomplete data, need more bytes
    /// - `Err(e)` - Parse error
    pub fn parse(&mut self, buf: &[u8]) -> ParseResult<Option<(Frame, usize)>> {
        self.depth = 0;
        match self.parse_frame(buf)? {
            Some((_, consumed)) if consumed > self.max_frame_size => {
                Err(self.too_large(consumed))
            }
            Some(parsed) => Ok(Some(parsed)),
            None if buf.len() > self.max_frame_size => Err(self.too_large(buf.len())),
            None => Ok(None),
        }
    }

    fn too_large(&self, size: usize) -> ParseError {
        ParseError::MessageTooLarge {
            size,
            max: self.max_frame_size,
        }
    }

    /// Internal recursive parsing function.
    fn parse_frame(&mut self, buf: &[u8]) -> ParseResult<Option<(Frame, usize)>> {
        if buf.is_empty() {
            return Ok(None);
        }

        if self.depth > MAX_NESTING_DEPTH {
            return Err(ParseError::ProtocolError(format!(
                "maximum nesting depth exceeded: {}",
                MAX_NESTING_DEPTH
            )));
        }

        match buf[0] {
            prefix::SIMPLE_STRING => {
                Ok(read_line(buf)?.map(|(s, n)| (Frame::SimpleString(s.to_string()), n)))
            }
            prefix::ERROR => Ok(read_line(buf)?.map(|(s, n)| (Frame::Error(s.to_string()), n))),
            prefix::INTEGER => match read_line(buf)? {
                Some((s, n)) => Ok(Some((Frame::Integer(parse_int(s)?), n))),
                None => Ok(None),
            },
            prefix::BULK_STRING => self.parse_bulk_string(buf),
            prefix::ARRAY => self.parse_array(buf),
            other => Err(ParseError::UnknownPrefix(other)),
        }
    }

    /// Parses a bulk string: `$<length>\r\n<data>\r\n`
    fn parse_bulk_string(&mut self, buf: &[u8]) -> ParseResult<Option<(Frame, usize)>> {
        let (length_str, header_len) = match read_line(buf)? {
            Some(line) => line,
            None => return Ok(None),
        };
        let length = parse_int(length_str)?;

        if length == -1 {
            return Ok(Some((Frame::Null, header_len)));
        }
        if length < 0 {
            return Err(ParseError::InvalidBulkLength(length));
        }

        let length = length as usize;
        if length > self.max_frame_size {
            return Err(self.too_large(length));
        }

        let total_needed = header_len + length + 2;
        if buf.len() < total_needed {
            return Ok(None);
        }

        if &buf[header_len + length..total_needed] != CRLF {
            return Err(ParseError::ProtocolError(
                "bulk string missing trailing CRLF".to_string(),
            ));
        }

        let data = Bytes::copy_from_slice(&buf[header_len..header_len + length]);
        Ok(Some((Frame::BulkString(data), total_needed)))
    }

    /// Parses an array: `*<count>\r\n<elements...>`
    fn parse_array(&mut self, buf: &[u8]) -> ParseResult<Option<(Frame, usize)>> {
        let (count_str, mut consumed) = match read_line(buf)? {
            Some(line) => line,
            None => return Ok(None),
        };
        let count = parse_int(count_str)?;
        if count < 0 {
            return Err(ParseError::InvalidArrayLength(count));
        }

        let count = count as usize;
        // Every element needs at least 3 bytes; reject absurd counts before allocating.
        if count > self.max_frame_size / 3 {
            return Err(self.too_large(count));
        }

        let mut elements = Vec::with_capacity(count);
        self.depth += 1;

        for _ in 0..count {
            match self.parse_frame(&buf[consumed..])? {
                Some((frame, element_consumed)) => {
                    elements.push(frame);
                    consumed += element_consumed;
                }
                None => return Ok(None),
            }
        }

        self.depth -= 1;

        Ok(Some((Frame::Array(elements), consumed)))
    }
}

/// Reads the line following the sigil byte.
///
/// Returns the line body and the number of bytes up to and including CRLF.
fn read_line(buf: &[u8]) -> ParseResult<Option<(&str, usize)>> {
    match find_crlf(&buf[1..]) {
        Some(pos) => {
            let line = std::str::from_utf8(&buf[1..1 + pos])
                .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;
            Ok(Some((line, 1 + pos + 2)))
        }
        None => Ok(None),
    }
}

fn parse_int(s: &str) -> ParseResult<i64> {
    s.parse()
        .map_err(|e: ParseIntError| ParseError::InvalidInteger(e.to_string()))
}

/// Finds the position of CRLF in the buffer.
///
/// Returns the position of `\r` if found, or None if CRLF is not present.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}

/// Helper function to parse a single frame from bytes.
pub fn parse_frame(buf: &[u8]) -> ParseResult<Option<(Frame, usize)>> {
    FrameParser::new().parse(buf)
}
