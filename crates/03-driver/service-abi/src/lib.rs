//! Service ABI types shared between the driver and its triangulators.
//!
//! This crate defines the vocabulary that crosses the record boundary:
//! status values, pixel and depth layouts, and typed views over the string
//! parameters carried by draw and clear events.

mod buffer;
mod command;
mod participant;

use std::fmt;

pub use buffer::{Bgra, BufferError, DepthBuffer, Dimensions, RasterBuffer, Rgb};
pub use command::{ClearDepth, ClearRaster, DrawCommand};
pub use participant::{absorb, Participant, Step};

/// Outcome of a driver or triangulator operation.
pub type Status = Result<(), Failure>;

/// Closed set of failure classes reported by the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// A record could not be prepared at startup.
    Initialization,
    /// A draw or clear command carried malformed parameters.
    Command,
    /// A hard or insecure shutdown. Reserved; no flow produces it.
    Shutdown,
    /// An event could not be sent or received.
    Event,
}

impl FailureKind {
    /// Numeric status code; `0` is reserved for success.
    pub fn code(self) -> u8 {
        match self {
            FailureKind::Initialization => 1,
            FailureKind::Command => 2,
            FailureKind::Shutdown => 3,
            FailureKind::Event => 4,
        }
    }

    /// Symbolic name of the status code.
    pub fn name(self) -> &'static str {
        match self {
            FailureKind::Initialization => "CODE_FAILURE_INITIALIZATION",
            FailureKind::Command => "CODE_FAILURE_COMMAND",
            FailureKind::Shutdown => "CODE_FAILURE_SHUTDOWN",
            FailureKind::Event => "CODE_FAILURE_EVENT",
        }
    }

    fn summary(self) -> &'static str {
        match self {
            FailureKind::Initialization => {
                "An error was encountered during component initialization."
            }
            FailureKind::Command => "An error was encountered while processing a drawing command.",
            FailureKind::Shutdown => "The application invoked a hard or insecure shutdown procedure.",
            FailureKind::Event => "The application failed to send or receive an event.",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name(), self.summary())
    }
}

/// A failure kind plus the detail that caused it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind} ({detail})")]
pub struct Failure {
    pub kind: FailureKind,
    pub detail: String,
}

impl Failure {
    pub fn new(kind: FailureKind, detail: impl fmt::Display) -> Self {
        Self {
            kind,
            detail: detail.to_string(),
        }
    }

    pub fn initialization(detail: impl fmt::Display) -> Self {
        Self::new(FailureKind::Initialization, detail)
    }

    pub fn command(detail: impl fmt::Display) -> Self {
        Self::new(FailureKind::Command, detail)
    }

    pub fn event(detail: impl fmt::Display) -> Self {
        Self::new(FailureKind::Event, detail)
    }
}
