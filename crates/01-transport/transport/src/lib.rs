//! Record transport shared by the driver and its triangulators.
//!
//! * [`Event`] / [`Reply`] – fixed-arity messages and their text framing ([`Frame`]).
//! * [`RecordStore`] – named single-slot records, in memory ([`MemoryStore`]) or on disk ([`FileStore`]).
//! * [`RecordHandle`] – the open-with-retry, operate once, close discipline.
//! * [`Endpoint`] – one participant's blocking view of the store.

mod endpoint;
mod error;
mod event;
mod file;
mod handle;
mod mailbox;
mod record;
mod store;
pub mod wait;
mod wire;

pub use endpoint::Endpoint;
pub use error::{Op, RecordError, RecordResult, Unavailable};
pub use event::{Event, EventKind, Params, Reply, ARITY};
pub use file::FileStore;
pub use handle::RecordHandle;
pub use mailbox::MemoryStore;
pub use record::{OpenMode, PayloadClass, ReadSemantics, RecordId, RecordKind, WriteOutcome};
pub use store::{RecordStore, StoreHandle};
pub use wait::{retry_open, CancelToken, WaitStrategy, Waiter};
pub use wire::Frame;
