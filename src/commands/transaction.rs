//! Per-connection transaction state.
//!
//! ```text
//!            MULTI                       EXEC / DISCARD
//!   Normal ─────────────▶ Queuing ───────────────────────▶ Normal
//!     │                     │
//!     │ any command         │ any other command
//!     ▼                     ▼
//!   executed now         queued, replies QUEUED
//! ```
//!
//! Commands queued under `MULTI` are not validated until `EXEC`; an unknown
//! verb is queued like any other and fails inside the batch.

use crate::commands::handler::CommandHandler;
use crate::commands::reply::{CommandError, Reply};
use crate::protocol::Command;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxState {
    #[default]
    Normal,
    Queuing,
}

#[derive(Debug, Clone, Copy)]
enum Control {
    Multi,
    Exec,
    Discard,
}

impl Control {
    fn of(command: &Command) -> Option<Self> {
        match command.verb() {
            "MULTI" => Some(Control::Multi),
            "EXEC" => Some(Control::Exec),
            "DISCARD" => Some(Control::Discard),
            _ => None,
        }
    }
}

/// One connection's transaction state and pending queue.
#[derive(Debug, Default)]
pub struct Session {
    state: TxState,
    queue: Vec<Command>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TxState {
        self.state
    }

    /// Commands waiting for `EXEC`.
    pub fn queued(&self) -> &[Command] {
        &self.queue
    }

    /// Routes a command through the transaction state machine.
    pub fn process(&mut self, command: Command, handler: &CommandHandler) -> Reply {
        match (self.state, Control::of(&command)) {
            (TxState::Normal, Some(Control::Multi)) => {
                self.state = TxState::Queuing;
                debug!("Transaction started");
                Reply::Ok
            }
            (TxState::Queuing, Some(Control::Multi)) => CommandError::NestedMulti.into(),

            (TxState::Queuing, Some(Control::Exec)) => {
                let batch = std::mem::take(&mut self.queue);
                self.state = TxState::Normal;
                handler.execute_batch(&batch)
            }
            (TxState::Normal, Some(Control::Exec)) => CommandError::ExecWithoutMulti.into(),

            (TxState::Queuing, Some(Control::Discard)) => {
                debug!(discarded = self.queue.len(), "Transaction discarded");
                self.queue.clear();
                self.state = TxState::Normal;
                Reply::Ok
            }
            (TxState::Normal, Some(Control::Discard)) => CommandError::DiscardWithoutMulti.into(),

            (TxState::Queuing, None) => {
                self.queue.push(command);
                Reply::Queued
            }
            (TxState::Normal, None) => handler.execute(&command),
        }
    }
}
