//! Event and reply messages exchanged over records.
//!
//! The parameter count of every event kind comes from [`ARITY`]; both the
//! constructor and the decoder consult it, so a frame can never carry a
//! parameter list that disagrees with its kind.

use smallvec::SmallVec;

use crate::error::{RecordError, RecordResult};

/// Inline parameter storage. Clear and control events fit without spilling.
pub type Params = SmallVec<[String; 4]>;

/// Number of wire parameters carried by each event kind, indexed by code.
///
/// `NONE` and `SHUTDOWN` carry a single empty placeholder.
pub const ARITY: [usize; 5] = [1, 19, 1, 3, 1];

/// Closed set of event kinds understood by the driver and triangulators.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    None = 0,
    Draw = 1,
    Shutdown = 2,
    ClearRaster = 3,
    ClearDepth = 4,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::None,
        EventKind::Draw,
        EventKind::Shutdown,
        EventKind::ClearRaster,
        EventKind::ClearDepth,
    ];

    /// Numeric code written on the wire as a single ASCII digit.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Maps a numeric code back to a kind, rejecting codes outside `[0,4]`.
    pub fn from_code(code: u8) -> RecordResult<Self> {
        EventKind::ALL
            .get(code as usize)
            .copied()
            .ok_or(RecordError::KindOutOfRange { code })
    }

    /// Number of parameters a frame of this kind carries.
    pub fn arity(self) -> usize {
        ARITY[self as usize]
    }

    /// True for kinds whose only parameter is an empty placeholder.
    pub fn is_placeholder(self) -> bool {
        matches!(self, EventKind::None | EventKind::Shutdown)
    }
}

/// A kind tag plus its fixed-arity string parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    kind: EventKind,
    params: Params,
}

impl Event {
    /// Builds an event, rejecting a parameter count that differs from the
    /// kind's arity.
    pub fn new<I, S>(kind: EventKind, params: I) -> RecordResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let params: Params = params.into_iter().map(Into::into).collect();
        if params.len() != kind.arity() {
            return Err(RecordError::Arity {
                kind,
                expected: kind.arity(),
                found: params.len(),
            });
        }
        Ok(Self { kind, params })
    }

    fn placeholder(kind: EventKind) -> Self {
        let mut params = Params::new();
        params.push(String::new());
        Self { kind, params }
    }

    pub fn none() -> Self {
        Self::placeholder(EventKind::None)
    }

    pub fn shutdown() -> Self {
        Self::placeholder(EventKind::Shutdown)
    }

    /// Clear-raster command carrying decimal red, green and blue channels.
    pub fn clear_raster(r: u8, g: u8, b: u8) -> Self {
        Self {
            kind: EventKind::ClearRaster,
            params: [r, g, b].iter().map(u8::to_string).collect(),
        }
    }

    /// Clear-depth command carrying one decimal depth value.
    pub fn clear_depth(depth: i32) -> Self {
        let mut params = Params::new();
        params.push(depth.to_string());
        Self {
            kind: EventKind::ClearDepth,
            params,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn into_params(self) -> Params {
        self.params
    }
}

/// Acknowledgement written on `*_OUT` records.
///
/// `Done` shares its wire digit with `DRAW` and signals that the most recent
/// command finished. `Idle` shares the digit of `NONE`.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reply {
    Idle = 0,
    Done = 1,
}

impl Reply {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Reply::Idle),
            1 => Some(Reply::Done),
            _ => None,
        }
    }
}
