//! Single-use record handles: open with retry, one operation, close.

use log::{trace, warn};

use crate::error::{Op, RecordError, RecordResult};
use crate::record::{OpenMode, PayloadClass, RecordId, WriteOutcome};
use crate::store::RecordStore;
use crate::wait::{retry_open, Waiter};
use crate::wire::Frame;

enum State {
    /// Payload claimed at open time, waiting to be decoded.
    Reading(Vec<u8>),
    /// Writer lease held.
    Writing,
    Closed,
}

/// A record acquired for exactly one read or one write.
///
/// Completing the operation closes the handle. Dropping an unused write
/// handle releases its lease so the counterpart is not blocked forever.
pub struct RecordHandle<'s> {
    store: &'s dyn RecordStore,
    id: RecordId,
    mode: OpenMode,
    state: State,
    attempts: u64,
}

impl<'s> RecordHandle<'s> {
    /// Acquires `id` in `mode`, retrying until the store grants it or the
    /// waiter is cancelled.
    pub fn open(
        store: &'s dyn RecordStore,
        id: RecordId,
        mode: OpenMode,
        waiter: &Waiter,
    ) -> RecordResult<Self> {
        let park = |timeout| store.park(id, timeout);
        let (state, attempts) = match mode {
            OpenMode::Read => {
                let (payload, attempts) =
                    retry_open(waiter, id, || store.try_acquire_read(id), park)?;
                (State::Reading(payload), attempts)
            }
            OpenMode::Write => {
                let ((), attempts) =
                    retry_open(waiter, id, || store.try_acquire_write(id), park)?;
                (State::Writing, attempts)
            }
        };
        trace!("open {id} for {mode:?} after {attempts} attempt(s)");
        Ok(Self {
            store,
            id,
            mode,
            state,
            attempts,
        })
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Number of acquisition attempts the open took.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// Decodes the claimed payload as `F` and closes the handle.
    pub fn read<F: Frame>(&mut self) -> RecordResult<F> {
        let payload = self.take_payload(F::CLASS)?;
        F::decode(&payload)
    }

    /// Encodes `frame`, commits it and closes the handle.
    pub fn write<F: Frame>(&mut self, frame: &F) -> RecordResult<WriteOutcome> {
        self.check_write(F::CLASS)?;
        let payload = match frame.encode() {
            Ok(payload) => payload,
            Err(err) => {
                self.close();
                return Err(err);
            }
        };
        self.commit(&payload)
    }

    /// Returns the raw matrix bytes and closes the handle.
    pub fn read_matrix(&mut self) -> RecordResult<Vec<u8>> {
        self.take_payload(PayloadClass::Matrix)
    }

    /// Replaces the matrix bytes and closes the handle.
    pub fn write_matrix(&mut self, bytes: &[u8]) -> RecordResult<WriteOutcome> {
        self.check_write(PayloadClass::Matrix)?;
        self.commit(bytes)
    }

    /// Closes the handle, releasing an unused writer lease.
    pub fn close(&mut self) {
        if let State::Writing = std::mem::replace(&mut self.state, State::Closed) {
            self.store.release_write(self.id);
        }
    }

    fn check(&self, op: Op, class: PayloadClass) -> RecordResult<()> {
        let expected = match op {
            Op::Read => OpenMode::Read,
            Op::Write => OpenMode::Write,
        };
        if self.mode != expected {
            return Err(RecordError::WrongMode {
                op,
                id: self.id,
                mode: self.mode,
            });
        }
        if self.is_closed() {
            return Err(RecordError::Closed { op, id: self.id });
        }
        if class != self.id.payload() {
            return Err(RecordError::PayloadMismatch {
                op,
                id: self.id,
                expected: self.id.payload(),
                actual: class,
            });
        }
        Ok(())
    }

    fn take_payload(&mut self, class: PayloadClass) -> RecordResult<Vec<u8>> {
        self.check(Op::Read, class)?;
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Reading(payload) => Ok(payload),
            _ => Err(RecordError::Closed {
                op: Op::Read,
                id: self.id,
            }),
        }
    }

    fn check_write(&mut self, class: PayloadClass) -> RecordResult<()> {
        let checked = self.check(Op::Write, class);
        if checked.is_err() && matches!(self.state, State::Writing) {
            self.close();
        }
        checked
    }

    fn commit(&mut self, payload: &[u8]) -> RecordResult<WriteOutcome> {
        self.state = State::Closed;
        match self.store.commit_write(self.id, payload) {
            Ok(outcome) => {
                if outcome == WriteOutcome::Coalesced {
                    warn!("write {}: overwrote an unread payload", self.id);
                }
                Ok(outcome)
            }
            Err(source) => {
                self.store.release_write(self.id);
                Err(RecordError::Io {
                    op: Op::Write,
                    id: self.id,
                    source,
                })
            }
        }
    }
}

impl Drop for RecordHandle<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, Reply};
    use crate::mailbox::MemoryStore;

    fn waiter() -> Waiter {
        Waiter::default()
    }

    #[test]
    fn write_then_read_closes_each_handle() {
        let store = MemoryStore::default();
        let id = RecordId::driver_in();
        let mut writer = RecordHandle::open(&store, id, OpenMode::Write, &waiter()).unwrap();
        writer.write(&Event::clear_depth(1000)).unwrap();
        assert!(writer.is_closed());
        assert!(matches!(
            writer.write(&Event::none()),
            Err(RecordError::Closed { op: Op::Write, .. })
        ));

        let mut reader = RecordHandle::open(&store, id, OpenMode::Read, &waiter()).unwrap();
        assert_eq!(reader.attempts(), 1);
        let event: Event = reader.read().unwrap();
        assert_eq!(event, Event::clear_depth(1000));
        assert!(matches!(
            reader.read::<Event>(),
            Err(RecordError::Closed { op: Op::Read, .. })
        ));
    }

    #[test]
    fn operations_must_match_the_open_mode() {
        let store = MemoryStore::default();
        let id = RecordId::driver_out();
        let mut writer = RecordHandle::open(&store, id, OpenMode::Write, &waiter()).unwrap();
        assert!(matches!(
            writer.read::<Reply>(),
            Err(RecordError::WrongMode {
                op: Op::Read,
                mode: OpenMode::Write,
                ..
            })
        ));
        writer.write(&Reply::Done).unwrap();
        let mut reader = RecordHandle::open(&store, id, OpenMode::Read, &waiter()).unwrap();
        assert!(matches!(
            reader.write(&Reply::Idle),
            Err(RecordError::WrongMode { op: Op::Write, .. })
        ));
    }

    #[test]
    fn frames_must_match_the_record_payload_class() {
        let store = MemoryStore::default();
        let mut writer =
            RecordHandle::open(&store, RecordId::driver_out(), OpenMode::Write, &waiter()).unwrap();
        assert!(matches!(
            writer.write(&Event::shutdown()),
            Err(RecordError::PayloadMismatch {
                expected: PayloadClass::Reply,
                actual: PayloadClass::Command,
                ..
            })
        ));
        // The lease was released, so the record can be opened again.
        let mut again =
            RecordHandle::open(&store, RecordId::driver_out(), OpenMode::Write, &waiter()).unwrap();
        again.write(&Reply::Done).unwrap();
    }

    #[test]
    fn dropping_an_unused_writer_releases_the_lease() {
        let store = MemoryStore::default();
        let id = RecordId::raster_matrix();
        drop(RecordHandle::open(&store, id, OpenMode::Write, &waiter()).unwrap());
        let mut writer = RecordHandle::open(&store, id, OpenMode::Write, &waiter()).unwrap();
        assert_eq!(writer.attempts(), 1);
        writer.write_matrix(&[0, 0, 0, 255]).unwrap();
        let mut reader = RecordHandle::open(&store, id, OpenMode::Read, &waiter()).unwrap();
        assert_eq!(reader.read_matrix().unwrap(), [0, 0, 0, 255]);
    }
}
