//! Worker → master inter-process messages.
//!
//! # Data Flow
//! ```text
//! worker Logger → ForwardingSink → IpcMessage::Log → NDJSON line on stdout
//!     → master watcher task → decode → supervisor dispatch
//! ```
//!
//! # Design Decisions
//! - One JSON object per line; the channel is the worker's stdout pipe
//! - Numeric tag field keeps the wire shape `{ "type": 1, "payload": … }`
//! - Unknown tags decode to `Unknown` instead of failing, so new message
//!   kinds can be added without breaking old masters
//! - The channel is one-directional and best effort; send failures mean
//!   the master is gone and are ignored

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::logging::LogRecord;

/// Wire tag for log records.
pub const KIND_LOG: u32 = 1;

/// Wire tag for the worker ready signal.
pub const KIND_ONLINE: u32 = 2;

/// A message a worker sends to the master.
#[derive(Debug, Clone, PartialEq)]
pub enum IpcMessage {
    /// A log record to be relayed into the master's sinks.
    Log(LogRecord),
    /// Sent once, after the worker's listener has bound.
    Online,
    /// Anything with a tag this build does not know.
    Unknown(u32),
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
}

/// Error decoding a wire line.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed IPC line: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("log message carried no payload")]
    MissingPayload,
}

impl IpcMessage {
    /// Encode as a single NDJSON line (no trailing newline).
    pub fn encode(&self) -> String {
        let envelope = match self {
            IpcMessage::Log(record) => Envelope {
                kind: KIND_LOG,
                payload: serde_json::to_value(record).ok(),
            },
            IpcMessage::Online => Envelope {
                kind: KIND_ONLINE,
                payload: None,
            },
            IpcMessage::Unknown(kind) => Envelope {
                kind: *kind,
                payload: None,
            },
        };
        // Envelope is plain data; serialization cannot fail
        serde_json::to_string(&envelope).unwrap_or_default()
    }

    /// Decode one wire line.
    pub fn decode(line: &str) -> Result<Self, DecodeError> {
        let envelope: Envelope = serde_json::from_str(line)?;
        match envelope.kind {
            KIND_LOG => {
                let payload = envelope.payload.ok_or(DecodeError::MissingPayload)?;
                let record: LogRecord = serde_json::from_value(payload)?;
                Ok(IpcMessage::Log(record))
            }
            KIND_ONLINE => Ok(IpcMessage::Online),
            other => Ok(IpcMessage::Unknown(other)),
        }
    }
}

/// Shared line writer for the worker side of the channel.
///
/// Wraps stdout behind a mutex so the forwarding sink and the online
/// handshake interleave whole lines, never fragments.
#[derive(Clone)]
pub struct IpcSender {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl IpcSender {
    /// Sender over the process's stdout (the pipe to the master).
    pub fn stdout() -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(io::stdout()))),
        }
    }

    /// Sender over an arbitrary writer, for tests.
    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            out: Arc::new(Mutex::new(writer)),
        }
    }

    /// Write one message as a line. Best effort: errors are swallowed,
    /// since a write failure means the master end is gone.
    pub fn send(&self, message: &IpcMessage) {
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{}", message.encode());
            let _ = out.flush();
        }
    }
}
