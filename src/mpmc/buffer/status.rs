// Per-row status for the MPMC row protocol.

use std::sync::atomic::{AtomicU8, Ordering};

/// The synchronization state of one ring row.
///
/// A row cycles `ReadyForWrite -> Writing -> ReadyForRead -> Reading`
/// and back. The two `Ready*` states are the only ones a claim CAS can
/// take a row out of, so at most one thread ever holds `Writing` and at
/// most one holds `Reading` on the same row.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Available for a producer to claim.
    ReadyForWrite = 0,
    /// A producer holds the row and is filling its cells.
    Writing = 1,
    /// Published by a producer, available for a consumer to claim.
    ReadyForRead = 2,
    /// A consumer holds the row and is draining its cells.
    Reading = 3,
}

impl Status {
    fn from_raw(raw: u8) -> Status {
        match raw {
            0 => Status::ReadyForWrite,
            1 => Status::Writing,
            2 => Status::ReadyForRead,
            3 => Status::Reading,
            // The cell is only ever stored from a Status value.
            _ => unreachable!("invalid row status {raw}"),
        }
    }
}

/// One atomic status cell per ring row.
pub struct AtomicStatus(AtomicU8);

impl AtomicStatus {
    pub fn new(status: Status) -> Self {
        Self(AtomicU8::new(status as u8))
    }

    /// Try to move the row from `from` to `to` in one CAS.
    ///
    /// Success carries `Acquire` ordering so that everything the previous
    /// holder published before releasing the row is visible to the new
    /// holder. Failure is `Relaxed`; the caller re-reads its cursor and
    /// retries anyway.
    #[inline]
    pub fn claim(&self, from: Status, to: Status) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Unconditionally set the row status.
    #[inline]
    pub fn store(&self, status: Status, order: Ordering) {
        self.0.store(status as u8, order);
    }

    #[inline]
    pub fn load(&self, order: Ordering) -> Status {
        Status::from_raw(self.0.load(order))
    }
}
