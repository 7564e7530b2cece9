//! In-process record store built from single-slot mailboxes.
//!
//! Each record is a slot holding at most one payload. Writes overwrite the
//! slot and report [`WriteOutcome::Coalesced`] when the previous payload was
//! never read. Reads either take the payload or copy it, depending on the
//! store's [`ReadSemantics`]. Every state change wakes parked openers, so the
//! open-retry loop blocks on a condition variable instead of spinning.

use std::collections::HashMap;
use std::io;
use std::time::Duration;

use log::trace;
use parking_lot::{Condvar, Mutex};

use crate::error::Unavailable;
use crate::record::{ReadSemantics, RecordId, WriteOutcome};
use crate::store::RecordStore;

#[derive(Default)]
struct Slot {
    payload: Option<Vec<u8>>,
    write_seq: u32,
    read_seq: u32,
    writer_leased: bool,
}

/// Record store whose slots live in process memory.
pub struct MemoryStore {
    slots: Mutex<HashMap<RecordId, Slot>>,
    changed: Condvar,
    semantics: ReadSemantics,
}

impl MemoryStore {
    pub fn new(semantics: ReadSemantics) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            changed: Condvar::new(),
            semantics,
        }
    }

    pub fn semantics(&self) -> ReadSemantics {
        self.semantics
    }

    /// Returns true when `id` holds a payload that has not been read yet.
    pub fn has_unread(&self, id: RecordId) -> bool {
        self.slots
            .lock()
            .get(&id)
            .is_some_and(|slot| slot.payload.is_some() && slot.write_seq != slot.read_seq)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(ReadSemantics::default())
    }
}

impl RecordStore for MemoryStore {
    fn try_acquire_read(&self, id: RecordId) -> Result<Vec<u8>, Unavailable> {
        let mut slots = self.slots.lock();
        let slot = slots.entry(id).or_default();
        let payload = if self.semantics.consumes(id) {
            slot.payload.take()
        } else {
            slot.payload.clone()
        }
        .ok_or(Unavailable::Absent)?;
        slot.read_seq = slot.write_seq;
        drop(slots);
        self.changed.notify_all();
        trace!("mailbox: read {id} ({} bytes)", payload.len());
        Ok(payload)
    }

    fn try_acquire_write(&self, id: RecordId) -> Result<(), Unavailable> {
        let mut slots = self.slots.lock();
        let slot = slots.entry(id).or_default();
        if slot.writer_leased {
            return Err(Unavailable::Busy);
        }
        slot.writer_leased = true;
        Ok(())
    }

    fn commit_write(&self, id: RecordId, payload: &[u8]) -> io::Result<WriteOutcome> {
        let mut slots = self.slots.lock();
        let slot = slots.entry(id).or_default();
        let unread = slot.payload.is_some() && slot.write_seq != slot.read_seq;
        slot.payload = Some(payload.to_vec());
        slot.write_seq = slot.write_seq.wrapping_add(1);
        slot.writer_leased = false;
        drop(slots);
        self.changed.notify_all();
        trace!("mailbox: wrote {id} ({} bytes)", payload.len());
        Ok(if unread {
            WriteOutcome::Coalesced
        } else {
            WriteOutcome::Accepted
        })
    }

    fn release_write(&self, id: RecordId) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get_mut(&id) {
            slot.writer_leased = false;
        }
        drop(slots);
        self.changed.notify_all();
    }

    fn park(&self, _id: RecordId, timeout: Duration) {
        let mut slots = self.slots.lock();
        // A change that lands between the failed attempt and this wait is
        // picked up when the timeout elapses.
        let _ = self.changed.wait_for(&mut slots, timeout);
    }
}
