//! Error types for the gateway core

use thiserror::Error;

/// Errors that can occur in the gateway core
#[derive(Debug, Error)]
pub enum HubError {
    /// Protocol error (validation, encoding, decoding)
    #[error("protocol error: {0}")]
    Protocol(#[from] glow_protocol::ProtocolError),

    /// The send queue is at capacity; the command was rejected whole
    #[error("send queue full: capacity {capacity}")]
    QueueFull {
        /// Configured queue capacity
        capacity: usize,
    },

    /// The transceiver is reconfiguring; retry on a later tick
    #[error("radio busy: settling for another {remaining_ms}ms")]
    RadioBusy {
        /// Time remaining in the settle window (milliseconds)
        remaining_ms: u64,
    },

    /// Radio driver I/O error
    #[error("radio driver error: {0}")]
    Io(#[from] std::io::Error),
}

impl HubError {
    /// Whether the caller can expect the same call to succeed later
    pub fn is_retryable(&self) -> bool {
        matches!(self, HubError::QueueFull { .. } | HubError::RadioBusy { .. })
    }
}
