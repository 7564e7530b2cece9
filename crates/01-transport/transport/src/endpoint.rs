use crate::error::RecordResult;
use crate::event::{Event, Reply};
use crate::handle::RecordHandle;
use crate::record::{OpenMode, RecordId, WriteOutcome};
use crate::store::StoreHandle;
use crate::wait::Waiter;
use crate::wire::Frame;

/// A participant's view of the record store.
///
/// Every call runs one complete open, operate, close cycle and blocks in the
/// open-retry loop until the record becomes available.
#[derive(Clone)]
pub struct Endpoint {
    store: StoreHandle,
    waiter: Waiter,
}

impl Endpoint {
    pub fn new(store: StoreHandle, waiter: Waiter) -> Self {
        Self { store, waiter }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn waiter(&self) -> &Waiter {
        &self.waiter
    }

    /// Pauses between two polls of `id` the same way a failed open would.
    pub fn pause(&self, id: RecordId) {
        self.waiter.pause(|timeout| self.store.park(id, timeout));
    }

    pub fn open(&self, id: RecordId, mode: OpenMode) -> RecordResult<RecordHandle<'_>> {
        RecordHandle::open(self.store.as_ref(), id, mode, &self.waiter)
    }

    pub fn receive<F: Frame>(&self, id: RecordId) -> RecordResult<F> {
        self.open(id, OpenMode::Read)?.read()
    }

    pub fn send<F: Frame>(&self, id: RecordId, frame: &F) -> RecordResult<WriteOutcome> {
        self.open(id, OpenMode::Write)?.write(frame)
    }

    pub fn receive_event(&self, id: RecordId) -> RecordResult<Event> {
        self.receive(id)
    }

    pub fn send_event(&self, id: RecordId, event: &Event) -> RecordResult<WriteOutcome> {
        self.send(id, event)
    }

    pub fn receive_reply(&self, id: RecordId) -> RecordResult<Reply> {
        self.receive(id)
    }

    pub fn send_reply(&self, id: RecordId, reply: Reply) -> RecordResult<WriteOutcome> {
        self.send(id, &reply)
    }

    pub fn load_matrix(&self, id: RecordId) -> RecordResult<Vec<u8>> {
        self.open(id, OpenMode::Read)?.read_matrix()
    }

    pub fn store_matrix(&self, id: RecordId, bytes: &[u8]) -> RecordResult<WriteOutcome> {
        self.open(id, OpenMode::Write)?.write_matrix(bytes)
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("waiter", &self.waiter)
            .finish_non_exhaustive()
    }
}
