//! Record identity and per-record policies.

use serde::Deserialize;
use std::fmt;

/// Logical record families shared between the driver and its triangulators.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    DriverIn = 1,
    DriverOut = 2,
    /// Per-triangulator inbound commands; the record index selects the worker.
    TriangulatorIn = 3,
    /// Per-triangulator replies; the record index selects the worker.
    TriangulatorOut = 4,
    /// BGRA colour buffer.
    RasterMatrix = 5,
    /// Little-endian 32-bit depth buffer.
    DepthMatrix = 6,
}

impl RecordKind {
    /// Kind of payload the record carries.
    pub fn payload(self) -> PayloadClass {
        match self {
            RecordKind::DriverIn | RecordKind::TriangulatorIn => PayloadClass::Command,
            RecordKind::DriverOut | RecordKind::TriangulatorOut => PayloadClass::Reply,
            RecordKind::RasterMatrix | RecordKind::DepthMatrix => PayloadClass::Matrix,
        }
    }

    /// Whether the record index distinguishes separate instances.
    pub fn is_indexed(self) -> bool {
        matches!(
            self,
            RecordKind::TriangulatorIn | RecordKind::TriangulatorOut
        )
    }
}

/// Payload family carried by a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadClass {
    /// Parameterised [`Event`](crate::Event) frames.
    Command,
    /// [`Reply`](crate::Reply) acknowledgement frames.
    Reply,
    /// Raw pixel or depth matrices.
    Matrix,
}

/// Fully qualified record name: kind plus instance index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordId {
    kind: RecordKind,
    index: u32,
}

impl RecordId {
    /// Builds a record id. The index is dropped for non-triangulator kinds.
    pub fn new(kind: RecordKind, index: u32) -> Self {
        let index = if kind.is_indexed() { index } else { 0 };
        Self { kind, index }
    }

    pub fn driver_in() -> Self {
        Self::new(RecordKind::DriverIn, 0)
    }

    pub fn driver_out() -> Self {
        Self::new(RecordKind::DriverOut, 0)
    }

    pub fn triangulator_in(index: u32) -> Self {
        Self::new(RecordKind::TriangulatorIn, index)
    }

    pub fn triangulator_out(index: u32) -> Self {
        Self::new(RecordKind::TriangulatorOut, index)
    }

    pub fn raster_matrix() -> Self {
        Self::new(RecordKind::RasterMatrix, 0)
    }

    pub fn depth_matrix() -> Self {
        Self::new(RecordKind::DepthMatrix, 0)
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn payload(&self) -> PayloadClass {
        self.kind.payload()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RecordKind::DriverIn => f.write_str("driver_in"),
            RecordKind::DriverOut => f.write_str("driver_out"),
            RecordKind::TriangulatorIn => write!(f, "T{}_in", self.index),
            RecordKind::TriangulatorOut => write!(f, "T{}_out", self.index),
            RecordKind::RasterMatrix => f.write_str("rastermatrix"),
            RecordKind::DepthMatrix => f.write_str("depthmatrix"),
        }
    }
}

/// Direction a record handle was opened for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
}

/// What a successful read does to the stored payload of a command or reply
/// record. Matrix records are always retained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadSemantics {
    /// Reading removes the payload; the slot is empty until the next write.
    #[default]
    Consume,
    /// Reading leaves the payload in place; participants overwrite the slot
    /// with a `NONE` event to mark it handled.
    Retain,
}

impl ReadSemantics {
    /// Whether a read of `id` removes its payload under this policy.
    pub fn consumes(self, id: RecordId) -> bool {
        self == ReadSemantics::Consume && id.payload() != PayloadClass::Matrix
    }
}

/// Outcome reported after committing a write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Payload replaced an empty slot or one the reader already observed.
    Accepted,
    /// Payload overwrote a previous payload that had not been read yet.
    Coalesced,
}
