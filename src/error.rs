//! Unified error types for the gatehouse firmware.
//!
//! Every operation the request layer can invoke returns [`Result`], so a
//! valid `0` reading can never be mistaken for a failure.  All variants are
//! `Copy`; none of them is fatal to the process.  A failed operation has no
//! effect on peripheral or configuration state.

use core::fmt;

use crate::app::ports::StorageError;
use crate::pins::PeripheralKind;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible core operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Peripheral id is zero, negative, or above the board maximum for its kind.
    InvalidId { kind: PeripheralKind, id: i32 },
    /// A value, duration or string is outside the allowed domain.
    InvalidValue(&'static str),
    /// Durable storage could not be mounted, opened or written.
    StorageUnavailable(StorageError),
    /// A persist got past the temporary file but failed while rotating
    /// generations.  The in-memory record is still dirty.
    IncompleteWrite(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId { kind, id } => write!(f, "invalid {kind} id {id}"),
            Self::InvalidValue(msg) => write!(f, "invalid value: {msg}"),
            Self::StorageUnavailable(e) => write!(f, "storage unavailable: {e}"),
            Self::IncompleteWrite(step) => write!(f, "incomplete write: {step}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::StorageUnavailable(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
