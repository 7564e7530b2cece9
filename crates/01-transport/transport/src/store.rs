//! Backend contract shared by every record store.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Unavailable;
use crate::record::{RecordId, WriteOutcome};

/// Shared, type-erased store handle passed to every participant.
pub type StoreHandle = Arc<dyn RecordStore>;

/// A set of named single-slot records.
///
/// Every method is one non-blocking attempt. Blocking behaviour lives in the
/// open-retry loop, which calls [`RecordStore::park`] between attempts.
pub trait RecordStore: Send + Sync {
    /// Claims the payload of `id` for reading.
    ///
    /// Command and reply records are emptied by the claim when the store
    /// consumes on read; matrix records never are.
    fn try_acquire_read(&self, id: RecordId) -> Result<Vec<u8>, Unavailable>;

    /// Takes the exclusive writer lease on `id`.
    fn try_acquire_write(&self, id: RecordId) -> Result<(), Unavailable>;

    /// Replaces the payload of `id` and releases the writer lease.
    fn commit_write(&self, id: RecordId, payload: &[u8]) -> io::Result<WriteOutcome>;

    /// Releases a writer lease without touching the payload.
    fn release_write(&self, id: RecordId);

    /// Pauses the caller between two acquisition attempts on `id`.
    fn park(&self, id: RecordId, timeout: Duration) {
        let _ = id;
        std::thread::sleep(timeout);
    }
}
