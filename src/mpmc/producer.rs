use std::time::{Duration, Instant};

use super::buffer::RowRing;
use crate::stamp::Stamp;

/// What a produce loop accomplished before it returned.
#[derive(Debug, Clone, Default)]
pub struct ProduceReport {
    /// Rows claimed, filled and published.
    pub rows: u64,
    /// Cells written (`rows * columns`).
    pub cells: u64,
    /// Absolute index of the last cell written, `-1` if none.
    pub last_index: i64,
    pub elapsed: Duration,
}

/// Drive the produce side of `ring` until `limit` rows have been
/// published or the buffer is stopped, whichever comes first.
///
/// Each claimed row is filled with [`Stamp::stamp`] values of the cells'
/// absolute indices (`abs_row * columns + col`). The function owns no
/// thread; harnesses launch it themselves, typically one call per
/// producer thread inside `std::thread::scope`.
pub fn produce_loop<T: Stamp>(ring: &RowRing<T>, limit: Option<u64>) -> ProduceReport {
    let columns = ring.columns() as u64;
    let mut report = ProduceReport {
        last_index: -1,
        ..ProduceReport::default()
    };
    let start = Instant::now();

    while limit.map_or(true, |n| report.rows < n) {
        let Some((ring_row, abs_row)) = ring.acquire_produce() else {
            break;
        };
        let base = abs_row * columns;
        // Safety: acquire_produce granted us Writing on ring_row, and the
        // borrow ends before publish_filled.
        let cells = unsafe { ring.row_mut(ring_row) };
        for (col, cell) in cells.iter_mut().enumerate() {
            *cell = T::stamp(base + col as u64);
        }
        ring.publish_filled(ring_row);

        report.rows += 1;
        report.cells += columns;
        report.last_index = (base + columns - 1) as i64;
    }

    report.elapsed = start.elapsed();
    report
}
