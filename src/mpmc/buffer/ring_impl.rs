use std::cell::UnsafeCell;
use std::fmt;
use std::io;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64};

use crossbeam_utils::CachePadded;

use super::backoff::BackoffPolicy;
use super::ring::{Cursors, RowRing};
use super::status::{AtomicStatus, Status};

/// Generation tag value for a slot no producer has mapped yet.
const UNMAPPED: i64 = -1;

impl<T: Default> RowRing<T> {
    /// Create a buffer of `rows x columns` default-initialized cells.
    ///
    /// The product fixes the total capacity for the lifetime of the
    /// buffer; later [`reshape`](RowRing::reshape) calls may pick any
    /// other factorization of the same product.
    pub fn new(rows: usize, columns: usize) -> io::Result<Self> {
        Self::with_backoff(rows, columns, BackoffPolicy::default())
    }

    pub fn with_backoff(rows: usize, columns: usize, backoff: BackoffPolicy) -> io::Result<Self> {
        let total = rows.checked_mul(columns).filter(|&n| n > 0).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "RowRing::new(): invalid shape.\n\
                     ├─ Requested: {rows} rows x {columns} columns\n\
                     ╰─ Expected:  both dimensions nonzero, product within usize"
                ),
            )
        })?;

        let cells = (0..total)
            .map(|_| UnsafeCell::new(T::default()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        // Status and generation arrays are sized for the largest rows a
        // reshape can ask for, so reshaping never reallocates.
        let status = (0..total)
            .map(|_| AtomicStatus::new(Status::ReadyForWrite))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let generation = (0..total)
            .map(|_| AtomicI64::new(UNMAPPED))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Ok(Self {
            cells,
            total,
            rows,
            columns,
            status,
            generation,
            cursors: Cursors {
                prod_next: CachePadded::new(AtomicU64::new(0)),
                cons_next: CachePadded::new(AtomicU64::new(0)),
                stop: CachePadded::new(AtomicBool::new(false)),
            },
            backoff,
            generation_misses: AtomicU64::new(0),
        })
    }
}

impl<T> RowRing<T> {
    /// Current number of ring rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Cells per row.
    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Fixed total cell capacity, `rows() * columns()` under any shape.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.total
    }

    /// One past the highest row id claimed by any producer.
    pub fn produced(&self) -> u64 {
        self.cursors.prod_next.load(Relaxed)
    }

    /// One past the highest row id claimed by any consumer.
    pub fn consumed(&self) -> u64 {
        self.cursors.cons_next.load(Relaxed)
    }

    /// Times a consumer claimed a slot that had been refilled with a
    /// later generation and handed it back. Diagnostic only.
    pub fn generation_misses(&self) -> u64 {
        self.generation_misses.load(Relaxed)
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.cursors.stop.load(Acquire)
    }

    /// Claim the next row for writing.
    ///
    /// Blocks (spin plus back-off) until this thread wins the
    /// `ReadyForWrite -> Writing` CAS on the row `prod_next` points at.
    /// On success the caller owns the row's `columns` cells until it
    /// calls [`publish_filled`](RowRing::publish_filled).
    ///
    /// Returns `(ring_row, absolute_row)`, or `None` once the buffer has
    /// been stopped; a `None` means the caller must exit its loop without
    /// touching any row.
    pub fn acquire_produce(&self) -> Option<(usize, u64)> {
        let mut abs = self.cursors.prod_next.load(Relaxed);
        let mut ring = abs as usize % self.rows;
        loop {
            if self.status[ring].claim(Status::ReadyForWrite, Status::Writing) {
                if self.is_stopped() {
                    // The slot may have been force-released by stop();
                    // the claim is void either way.
                    return None;
                }
                if self.cursors.prod_next.load(Acquire) == abs {
                    // Map the slot to this generation before advancing the
                    // cursor, so a consumer that sees the next id can never
                    // observe a stale tag here.
                    self.generation[ring].store(abs as i64, Release);
                    self.cursors.prod_next.store(abs + 1, Release);
                    return Some((ring, abs));
                }
                // The cursor moved past `abs` while we were waiting: some
                // other producer already claimed this id and the slot has
                // since been recycled. Hand it back and retry with a
                // fresh view, otherwise the cursor would rewind.
                self.status[ring].store(Status::ReadyForWrite, Release);
            }
            if self.is_stopped() {
                return None;
            }
            abs = self.cursors.prod_next.load(Relaxed);
            ring = abs as usize % self.rows;
            self.backoff.wait();
        }
    }

    /// Claim the next published row for reading.
    ///
    /// Blocks until this thread wins the `ReadyForRead -> Reading` CAS on
    /// the row `cons_next` points at *and* the slot's generation tag
    /// still matches the id it meant to claim. On success the caller owns
    /// the row's cells until it calls
    /// [`publish_emptied`](RowRing::publish_emptied).
    ///
    /// The generation check is what defeats the ring's ABA hazard: while
    /// a claimant waits, other consumers can drain its target id and
    /// producers can refill the same slot with `id + rows`. Claiming that
    /// refill without the check would both deliver a row this thread was
    /// never assigned and skip the refill's rightful consumer.
    pub fn acquire_consume(&self) -> Option<(usize, u64)> {
        let mut abs = self.cursors.cons_next.load(Relaxed);
        let mut ring = abs as usize % self.rows;
        loop {
            if self.status[ring].claim(Status::ReadyForRead, Status::Reading) {
                if self.is_stopped() {
                    return None;
                }
                if self.generation[ring].load(Acquire) == abs as i64 {
                    self.cursors.cons_next.store(abs + 1, Release);
                    return Some((ring, abs));
                }
                // The slot holds a later generation. Its rightful
                // consumer has not run yet, so release back to
                // ReadyForRead rather than ReadyForWrite; a producer has
                // no business here until that row is drained.
                self.generation_misses.fetch_add(1, Relaxed);
                #[cfg(feature = "trace")]
                log::trace!(
                    "row {ring}: wanted generation {abs}, slot holds {}",
                    self.generation[ring].load(Relaxed)
                );
                self.status[ring].store(Status::ReadyForRead, Release);
            }
            if self.is_stopped() {
                return None;
            }
            abs = self.cursors.cons_next.load(Relaxed);
            ring = abs as usize % self.rows;
            self.backoff.wait();
        }
    }

    /// Publish a filled row to consumers.
    ///
    /// Caller must hold `Writing` on `ring_row` (a matching
    /// [`acquire_produce`](RowRing::acquire_produce) return) with all cell
    /// writes done; the Release store is what makes them visible to the
    /// claiming consumer.
    pub fn publish_filled(&self, ring_row: usize) {
        debug_assert!(
            self.status[ring_row].load(Relaxed) == Status::Writing || self.is_stopped(),
            "publish_filled on a row not held for writing"
        );
        self.status[ring_row].store(Status::ReadyForRead, Release);
    }

    /// Release a drained row back to producers.
    ///
    /// Caller must hold `Reading` on `ring_row`.
    pub fn publish_emptied(&self, ring_row: usize) {
        debug_assert!(
            self.status[ring_row].load(Relaxed) == Status::Reading || self.is_stopped(),
            "publish_emptied on a row not held for reading"
        );
        self.status[ring_row].store(Status::ReadyForWrite, Release);
    }

    /// Latch the terminator and unblock every waiting thread.
    ///
    /// All row statuses are force-stored `ReadyForWrite`, which yanks the
    /// exclusive marker from any thread mid-write or mid-read. That is
    /// safe only because stop is terminal: every acquirer observes the
    /// flag before using a row, and cell contents are undefined from here
    /// until [`reset`](RowRing::reset).
    pub fn stop(&self) {
        self.cursors.stop.store(true, Release);
        self.release_all();
        #[cfg(feature = "trace")]
        log::trace!("stopped at produced {} consumed {}", self.produced(), self.consumed());
    }

    /// Return the buffer to its initial state: cursors at zero, every row
    /// writable, every slot unmapped, stop flag cleared.
    ///
    /// Takes `&mut self`; all producer and consumer borrows must have
    /// ended, which is exactly the "no active threads" precondition.
    pub fn reset(&mut self) {
        self.cursors.prod_next.store(0, Release);
        self.cursors.cons_next.store(0, Release);
        self.generation_misses.store(0, Relaxed);
        self.release_all();
        self.cursors.stop.store(false, Release);
        #[cfg(feature = "trace")]
        log::trace!("reset to {} x {}", self.rows, self.columns);
    }

    /// Reconfigure the same storage as `rows x columns`.
    ///
    /// Fails if the product differs from the fixed capacity; the buffer
    /// is untouched on failure. Usually paired with
    /// [`reset`](RowRing::reset).
    pub fn reshape(&mut self, rows: usize, columns: usize) -> io::Result<()> {
        if rows.checked_mul(columns) != Some(self.total) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "RowRing::reshape(): rows x columns must equal the fixed capacity.\n\
                     ├─ Requested: {rows} x {columns}\n\
                     ╰─ Capacity:  {}",
                    self.total
                ),
            ));
        }
        self.rows = rows;
        self.columns = columns;
        #[cfg(feature = "trace")]
        log::trace!("reshaped to {rows} x {columns}");
        Ok(())
    }

    /// Shared read access to the cells of `ring_row`.
    ///
    /// # Safety
    /// The caller must hold `Reading` on `ring_row` (an un-released
    /// [`acquire_consume`](RowRing::acquire_consume) return). No bounds or
    /// ownership checks are performed; the row protocol is the guarantee
    /// that no other thread touches these cells.
    #[inline]
    pub unsafe fn row(&self, ring_row: usize) -> &[T] {
        debug_assert!(ring_row < self.rows);
        unsafe {
            std::slice::from_raw_parts(self.cells[ring_row * self.columns].get(), self.columns)
        }
    }

    /// Exclusive access to the cells of `ring_row`.
    ///
    /// # Safety
    /// The caller must hold `Writing` or `Reading` on `ring_row`. The
    /// returned borrow must end before the row is published or released.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn row_mut(&self, ring_row: usize) -> &mut [T] {
        debug_assert!(ring_row < self.rows);
        unsafe {
            std::slice::from_raw_parts_mut(self.cells[ring_row * self.columns].get(), self.columns)
        }
    }

    // Force every slot writable and unmapped. Covers the whole backing
    // array, not just the first `rows` entries, so state from a previous
    // shape can never leak into a later, larger one.
    fn release_all(&self) {
        for slot in self.status.iter() {
            slot.store(Status::ReadyForWrite, Release);
        }
        for tag in self.generation.iter() {
            tag.store(UNMAPPED, Release);
        }
    }
}

impl<T> fmt::Debug for RowRing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::debug::struct_debug::debug_row_ring(self, f)
    }
}
