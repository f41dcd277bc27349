//! Crate-wide error taxonomy.
//!
//! Nothing here is fatal to the process: the orchestrator catches every
//! variant, records it as a [`crate::ParseStatus`] and continues with the
//! remaining input. `Err` only propagates to the caller when the blob as a
//! whole is unusable (no recognizable container signature, or shorter than
//! one block).

use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EdidError>;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum EdidError {
    /// The blob starts with neither the EDID signature nor a DisplayID
    /// version byte this crate understands.
    #[error("unrecognized container: {reason}")]
    BadSignature { reason: String },

    /// A read would cross the end of the supplied buffer.
    #[error("truncated input at offset {offset}: {needed} more byte(s) required")]
    Truncated { offset: usize, needed: usize },

    /// A declared length field walks past the enclosing buffer budget.
    #[error("bad length field at offset {offset}: declared {declared}, {available} available")]
    BadLength {
        offset: usize,
        declared: usize,
        available: usize,
    },

    /// A 128-byte block whose bytes do not sum to zero.
    #[error("checksum mismatch in block {block}")]
    ChecksumMismatch { block: usize },

    /// A sub-block whose contents violate its own layout rules.
    #[error("malformed {block}: {reason}")]
    MalformedBlock {
        block: &'static str,
        reason: String,
    },

    /// A per-session registry hit its documented upper bound. Reported for
    /// the one registration that overflowed; parsing continues.
    #[error("{registry} full (capacity {capacity})")]
    CapacityExceeded {
        registry: &'static str,
        capacity: usize,
    },

    /// A video identification code outside the reference table.
    #[error("invalid video identification code {vic}")]
    InvalidVicId { vic: u8 },
}

impl EdidError {
    /// Capacity errors are reported once per registry and must not abort the
    /// surrounding block walk.
    #[must_use]
    pub fn is_capacity(&self) -> bool {
        matches!(self, EdidError::CapacityExceeded { .. })
    }
}
