//! Error surface for record operations.
//!
//! Two families live here. [`Unavailable`] describes a failed acquisition
//! attempt; it is always transient and only ever seen by the open-retry loop.
//! [`RecordError`] describes everything else: misuse of a handle, malformed
//! frames, and I/O failures after a record was acquired. Those are structural
//! and are returned to the caller instead of being retried.

use std::io;

use crate::event::EventKind;
use crate::record::{OpenMode, PayloadClass, RecordId};

/// Convenience result alias for record operations.
pub type RecordResult<T, E = RecordError> = Result<T, E>;

/// Operation being performed on a record handle when an error surfaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Read,
    Write,
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::Read => f.write_str("read"),
            Op::Write => f.write_str("write"),
        }
    }
}

/// Reason a single acquisition attempt did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum Unavailable {
    /// Nothing has been written to the record yet (or it was consumed).
    #[error("record holds no payload")]
    Absent,
    /// The counterpart currently holds the record.
    #[error("record is held by another participant")]
    Busy,
    /// The backend failed to open the record this time around.
    #[error("backend refused the record: {0}")]
    Io(#[from] io::Error),
}

/// Structural failures surfaced by record handles and the wire codec.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("{op}: handle for {id} was opened for {mode:?}")]
    WrongMode {
        op: Op,
        id: RecordId,
        mode: OpenMode,
    },

    #[error("{op}: handle for {id} is closed")]
    Closed { op: Op, id: RecordId },

    #[error("read: invalid event kind byte 0x{byte:02x}")]
    InvalidKind { byte: u8 },

    #[error("event kind code {code} is outside [0,4]")]
    KindOutOfRange { code: u8 },

    #[error("{kind:?} carries {expected} parameters, found {found}")]
    Arity {
        kind: EventKind,
        expected: usize,
        found: usize,
    },

    #[error("write: parameter {index} contains the space delimiter")]
    Delimiter { index: usize },

    #[error("read: parameter {index} is not valid UTF-8")]
    InvalidUtf8 { index: usize },

    #[error("read: record is empty")]
    Empty,

    #[error("{op}: {id} carries {actual:?} payloads, not {expected:?}")]
    PayloadMismatch {
        op: Op,
        id: RecordId,
        expected: PayloadClass,
        actual: PayloadClass,
    },

    #[error("{op}: i/o failure on {id}: {source}")]
    Io {
        op: Op,
        id: RecordId,
        #[source]
        source: io::Error,
    },

    #[error("open of {id} was cancelled")]
    Cancelled { id: RecordId },
}

impl RecordError {
    /// Returns true when the error came from a cancelled open.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RecordError::Cancelled { .. })
    }
}
