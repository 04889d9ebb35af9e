use std::fmt;

use crate::mpmc::buffer::RowRing;

/// Debug function for RowRing
///
/// Shows the shape and cursor snapshot without touching payload cells;
/// cells may be concurrently owned by a producer or consumer.
pub fn debug_row_ring<T>(ring: &RowRing<T>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RowRing")
        .field("rows", &ring.rows())
        .field("columns", &ring.columns())
        .field("capacity", &ring.capacity())
        .field("produced", &ring.produced())
        .field("consumed", &ring.consumed())
        .field("generation_misses", &ring.generation_misses())
        .field("stopped", &ring.is_stopped())
        .finish_non_exhaustive()
}
