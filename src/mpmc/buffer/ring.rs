// Row-batched bounded MPMC ring buffer, synchronized per row.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64};

use crossbeam_utils::CachePadded;

use super::backoff::BackoffPolicy;
use super::status::AtomicStatus;

/// The shared cursor block of a [`RowRing`].
///
/// It is marked `#[repr(C)]` so the layout test can assert that the two
/// contended cursors and the stop flag land on distinct cache lines.
///
/// - `prod_next` is one past the highest row id any producer has claimed.
/// - `cons_next` is one past the highest row id any consumer has claimed.
/// - Both are written by a plain store, and only by the thread that won
///   the row's status CAS for that id. Loads are hints; every claim is
///   re-validated against the row's status and generation tag.
#[repr(C)]
pub struct Cursors {
    /// Next absolute row id a producer will try to claim.
    /// Padded to keep producer traffic off the consumer cursor's line.
    pub prod_next: CachePadded<AtomicU64>,

    /// Next absolute row id a consumer will try to claim.
    pub cons_next: CachePadded<AtomicU64>,

    /// Latched by `stop()`; checked by every acquire iteration.
    pub stop: CachePadded<AtomicBool>,
}

/// A bounded multi-producer multi-consumer buffer of `rows x columns`
/// payload cells, synchronized entirely by atomics at row granularity.
///
/// A producer claims an entire row, writes its `columns` cells with no
/// further synchronization, and publishes it. A consumer claims a
/// published row, reads all cells, and releases it. One CAS therefore
/// covers a batch of `columns` messages, which is what makes wide rows
/// cheap.
///
/// ### Ring mapping
///
/// Row ids are absolute and ever increasing; ring slot `r` holds id
/// `a` whenever `a % rows == r`, so each slot cycles through the
/// generations `r, r + rows, r + 2*rows, ...`. A per-slot generation tag
/// records which id currently occupies the slot. Consumers compare the
/// tag against the id they meant to claim and hand the slot back on a
/// mismatch, which is what makes the ring mapping safe against a slot
/// being refilled while a claimant was waiting.
///
/// ### Reshaping
///
/// The total capacity `rows * columns` is fixed at construction, but the
/// same storage can be reused as any other factorization via
/// [`reshape`](RowRing::reshape), which takes `&mut self` so it cannot
/// race the protocol.
pub struct RowRing<T> {
    /// Flat `rows * columns` payload storage, indexed `row * columns + col`.
    pub(crate) cells: Box<[UnsafeCell<T>]>,

    /// Fixed total number of cells. `rows * columns == total` always.
    pub(crate) total: usize,

    /// Current ring size, in rows.
    pub(crate) rows: usize,

    /// Cells per row.
    pub(crate) columns: usize,

    /// One status per ring slot, sized for the largest possible `rows`.
    pub(crate) status: Box<[AtomicStatus]>,

    /// Ring slot to absolute row id map; `-1` until first mapped.
    pub(crate) generation: Box<[AtomicI64]>,

    pub(crate) cursors: Cursors,

    /// Wait strategy for contended claims.
    pub(crate) backoff: BackoffPolicy,

    /// Times a consumer claimed a slot whose generation had moved on.
    /// Each hit is a recovered overwrite race, not an error.
    pub(crate) generation_misses: AtomicU64,
}

// The payload cells are shared storage, but the row protocol hands out
// exclusive windows: a row's cells are touched only by the thread holding
// Writing or Reading on that row.
unsafe impl<T: Send> Send for RowRing<T> {}
unsafe impl<T: Send> Sync for RowRing<T> {}
