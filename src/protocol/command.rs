//! Client commands decoded from frames.

use crate::protocol::parser::ParseError;
use crate::protocol::types::Frame;

/// A command verb plus its ordered arguments.
///
/// The verb is always uppercase; arguments are kept exactly as sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    verb: String,
    args: Vec<String>,
}

impl Command {
    pub fn new(verb: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            verb: verb.into().to_uppercase(),
            args,
        }
    }

    /// Builds a command from string slices, first element being the verb.
    ///
    /// Returns `None` for an empty slice.
    pub fn from_parts(parts: &[&str]) -> Option<Self> {
        let (verb, args) = parts.split_first()?;
        Some(Self::new(
            *verb,
            args.iter().map(|s| s.to_string()).collect(),
        ))
    }

    /// Converts a decoded top-level frame into a command.
    ///
    /// Only a non-empty array of bulk strings is a command; anything else is
    /// a protocol violation.
    pub fn from_frame(frame: Frame) -> Result<Self, ParseError> {
        let elements = match frame {
            Frame::Array(elements) if !elements.is_empty() => elements,
            Frame::Array(_) => {
                return Err(ParseError::ProtocolError("empty command array".to_string()))
            }
            _ => {
                return Err(ParseError::ProtocolError(
                    "command must be an array of bulk strings".to_string(),
                ))
            }
        };

        let mut tokens = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                Frame::BulkString(data) => {
                    let token = String::from_utf8(data.to_vec())
                        .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;
                    tokens.push(token);
                }
                _ => {
                    return Err(ParseError::ProtocolError(
                        "command elements must be bulk strings".to_string(),
                    ))
                }
            }
        }

        let verb = tokens.remove(0);
        Ok(Self::new(verb, tokens))
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}
