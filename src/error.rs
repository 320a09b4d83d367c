//! Error handling for the multi-key layer.
//!
//! Every fallible operation returns [`MkError`]. Decoding never falls back to a
//! default object: a buffer either yields exactly the encoded value or one of
//! the variants below.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MkError {
    /// Input is structurally invalid (bad header field, impossible length).
    #[error("malformed input: {0}")]
    Malformed(String),

    /// Input ended before a field could be read.
    #[error("truncated input at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// A complete value was decoded but input bytes were left over.
    #[error("{0} unparsed bytes remain after decoding")]
    TrailingData(usize),

    /// Records decoded individually but contradict each other (duplicate keys,
    /// mismatched embedded identifiers, count mismatch).
    #[error("corrupted record: {0}")]
    Corrupted(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid party identifier: {0}")]
    InvalidPartyId(String),

    /// A capability set has no key for this party.
    #[error("no {kind} for party `{party}`")]
    MissingKey { kind: &'static str, party: String },

    #[error("no rotation key at index {rot_idx} for party `{party}`")]
    MissingRotationKey { party: String, rot_idx: i64 },

    #[error("no common reference string at index {0}")]
    MissingCrs(i64),

    /// A value does not fit its fixed-width wire field.
    #[error("value does not fit the wire format: {0}")]
    EncodingOverflow(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MkError>;

/// Create a `Corrupted` error with format string support
macro_rules! corrupted {
    ($($arg:tt)*) => {
        $crate::error::MkError::Corrupted(format!($($arg)*))
    };
}

/// Create a `Malformed` error with format string support
macro_rules! malformed {
    ($($arg:tt)*) => {
        $crate::error::MkError::Malformed(format!($($arg)*))
    };
}

pub(crate) use corrupted;
pub(crate) use malformed;
