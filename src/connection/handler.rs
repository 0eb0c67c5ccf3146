//! Connection Handler Module
//!
//! Each client gets its own handler task that reads frames, routes the
//! decoded commands through its `Session`, and writes replies back.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! accept ──▶ ConnectionHandler { Session::new() }
//!               │
//!               ▼
//!   ┌──▶ read_more_data ──▶ try_parse_command ──▶ Session::process ──▶ send_reply ──┐
//!   └──────────────────────────────────────────────────────────────────────────────┘
//!               │ EOF, I/O error, or malformed frame
//!               ▼
//!        task ends; a pending MULTI queue is dropped unexecuted
//! ```
//!
//! ## Buffer Management
//!
//! Incoming bytes accumulate in a `BytesMut`. The parser only ever looks at
//! what is buffered and says "need more" when a frame is incomplete; this
//! loop is the only place that reads from the socket. The parser bounds a
//! single frame, so the buffer cannot grow without limit.

use crate::commands::{CommandHandler, Reply, Session, TxState};
use crate::protocol::{Command, FrameParser, ParseError};
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, info, trace, warn};

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands processed
    pub commands_processed: AtomicU64,
    /// Connections dropped for protocol violations
    pub protocol_errors: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written.fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Handles a single client connection.
///
/// Generic over the stream so tests can drive it with an in-memory mock.
pub struct ConnectionHandler<S> {
    stream: BufWriter<S>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Buffer for incoming data
    buffer: BytesMut,

    /// Shared command executor
    command_handler: CommandHandler,

    /// This connection's transaction state
    session: Session,

    parser: FrameParser,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,

    /// Reused encode buffer for replies
    out: Vec<u8>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        addr: SocketAddr,
        command_handler: CommandHandler,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            command_handler,
            session: Session::new(),
            parser: FrameParser::new(),
            stats,
            out: Vec::with_capacity(256),
        }
    }

    /// Runs the connection until the client leaves or misbehaves.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "Client disconnected gracefully"),
            Err(ConnectionError::ClientDisconnected) => {
                debug!(client = %self.addr, "Client disconnected")
            }
            Err(ConnectionError::IoError(io_err))
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(client = %self.addr, "Connection reset by client")
            }
            Err(e) => warn!(client = %self.addr, error = %e, "Connection error"),
        }

        if self.session.state() == TxState::Queuing {
            debug!(
                client = %self.addr,
                queued = self.session.queued().len(),
                "Dropping unexecuted transaction"
            );
        }

        self.stats.connection_closed();
        result
    }

    /// The main read-execute-respond loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            while let Some(command) = self.try_parse_command()? {
                let reply = self.session.process(command, &self.command_handler);
                self.stats.command_processed();
                self.send_reply(&reply).await?;
            }

            self.read_more_data().await?;
        }
    }

    /// Attempts to decode one command from the buffer.
    fn try_parse_command(&mut self) -> Result<Option<Command>, ConnectionError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        let parsed = self
            .parser
            .parse(&self.buffer)
            .and_then(|parsed| match parsed {
                Some((frame, consumed)) => Command::from_frame(frame).map(|c| Some((c, consumed))),
                None => Ok(None),
            });

        match parsed {
            Ok(Some((command, consumed))) => {
                let _ = self.buffer.split_to(consumed);
                trace!(
                    client = %self.addr,
                    verb = command.verb(),
                    consumed = consumed,
                    remaining = self.buffer.len(),
                    "Parsed command"
                );
                Ok(Some(command))
            }
            Ok(None) => {
                trace!(
                    client = %self.addr,
                    buffered = self.buffer.len(),
                    "Incomplete frame, need more data"
                );
                Ok(None)
            }
            Err(e) => {
                self.stats.protocol_error();
                if let ParseError::UnknownPrefix(byte) = e {
                    warn!(
                        client = %self.addr,
                        byte = byte,
                        "Possible cross protocol scripting attack detected, dropping connection"
                    );
                } else {
                    warn!(client = %self.addr, error = %e, "Protocol error, dropping connection");
                }
                Err(ConnectionError::ParseError(e))
            }
        }
    }

    /// Reads more data from the socket into the buffer.
    async fn read_more_data(&mut self) -> Result<(), ConnectionError> {
        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(4096);
        }

        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;

        if n == 0 {
            if self.buffer.is_empty() {
                return Err(ConnectionError::ClientDisconnected);
            }
            return Err(ConnectionError::UnexpectedEof);
        }

        self.stats.bytes_read(n);
        trace!(client = %self.addr, bytes = n, "Read data");

        Ok(())
    }

    async fn send_reply(&mut self, reply: &Reply) -> Result<(), ConnectionError> {
        self.out.clear();
        reply.write_to(&mut self.out);

        self.stream.write_all(&self.out).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(self.out.len());
        trace!(client = %self.addr, bytes = self.out.len(), "Sent reply");
        Ok(())
    }
}

/// Errors that end a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed, oversized or untrusted input
    #[error("Protocol error: {0}")]
    ParseError(#[from] ParseError),

    /// Client disconnected normally
    #[error("Client disconnected")]
    ClientDisconnected,

    /// Stream ended in the middle of a frame
    #[error("Unexpected end of stream")]
    UnexpectedEof,
}

/// Runs a TCP client connection to completion.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    command_handler: CommandHandler,
    stats: Arc<ConnectionStats>,
) {
    let handler = ConnectionHandler::new(stream, addr, command_handler, stats);
    if let Err(e) = handler.run().await {
        match e {
            ConnectionError::ClientDisconnected => {}
            ConnectionError::IoError(ref io_err)
                if io_err.kind() == std::io::ErrorKind::ConnectionReset => {}
            _ => {
                debug!(client = %addr, error = %e, "Connection ended with error");
            }
        }
    }
}
