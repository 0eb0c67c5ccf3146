//! Wire Protocol Implementation
//!
//! This module implements the length-prefixed, type-tagged protocol CinderKV
//! speaks with its clients.
//!
//! ## Modules
//!
//! - `types`: Defines the `Frame` enum and the encoder
//! - `parser`: Incremental, I/O-free decoder for incoming bytes
//! - `command`: Turns a decoded frame into a `Command`
//!
//! ## Example
//!
//! ```
//! use cinderkv::protocol::{parse_frame, Command, Frame};
//!
//! // Parsing incoming data
//! let data = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
//! let (frame, consumed) = parse_frame(data).unwrap().unwrap();
//! assert_eq!(consumed, data.len());
//!
//! let command = Command::from_frame(frame).unwrap();
//! assert_eq!(command.verb(), "GET");
//!
//! // Encoding a reply
//! let mut out = Vec::new();
//! cinderkv::protocol::write_bulk_string(&mut out, "Ariz");
//! assert_eq!(out, b"$4\r\nAriz\r\n");
//! ```

pub mod command;
pub mod parser;
pub mod types;

pub use command::Command;
pub use parser::{parse_frame, FrameParser, ParseError, ParseResult, MAX_FRAME_SIZE};
pub use types::{write_array, write_bulk_string, Frame};
