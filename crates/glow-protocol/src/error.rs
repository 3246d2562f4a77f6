//! Error types for packet encoding and decoding

use thiserror::Error;

use crate::command::Field;

/// Errors that can occur while parsing a raw frame
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Frame is shorter than the variant's fixed length
    #[error("truncated frame: expected {expected} bytes, got {actual}")]
    TruncatedFrame { expected: usize, actual: usize },

    /// Frame is longer than the variant's fixed length
    #[error("oversized frame: expected {expected} bytes, got {actual}")]
    OversizedFrame { expected: usize, actual: usize },

    /// Unknown or unsupported command byte
    #[error("unknown command byte: 0x{0:02X}")]
    UnknownCommand(u8),

    /// Checksum mismatch
    #[error("checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// Group id in the frame is outside the variant's range
    #[error("invalid group id in frame: {0}")]
    InvalidGroup(u8),
}

/// Higher-level protocol errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Parse error
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The header byte does not name a registered protocol variant
    #[error("unknown protocol tag: 0x{0:02X}")]
    UnknownProtocol(u8),

    /// The variant's descriptor does not list this field as controllable
    #[error("field {field:?} is not controllable on {variant}")]
    UnsupportedField {
        variant: &'static str,
        field: Field,
    },

    /// The value fails the field's declared bounds
    #[error("value {value} out of range for {field:?}: expected {min}..={max}")]
    ValueOutOfRange {
        field: Field,
        value: u32,
        min: u32,
        max: u32,
    },

    /// Device/group identity is malformed for the variant
    #[error("invalid bulb id: {0}")]
    InvalidBulbId(String),
}
