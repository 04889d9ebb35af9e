use std::time::{Duration, Instant};

use super::buffer::RowRing;
use crate::stamp::Stamp;

/// What a consume loop accomplished before it returned.
#[derive(Debug, Clone, Default)]
pub struct ConsumeReport {
    /// Rows claimed, drained and released.
    pub rows: u64,
    /// Cells read.
    pub cells: u64,
    /// Absolute index of the last cell read, `-1` if none.
    pub last_index: i64,
    /// Cells whose stamped index went backwards within this thread.
    pub sequence_errors: u64,
    /// Cells whose stamped index did not match their absolute position.
    pub stamp_errors: u64,
    pub elapsed: Duration,
}

/// Drive the consume side of `ring` until `limit` rows have been drained
/// or the buffer is stopped.
///
/// Every cell is audited against its absolute index via
/// [`Stamp::index_of`] and reset to `T::default()` after reading, so the
/// next producer taking the slot starts from a clean row. Audit failures
/// are counted in the report rather than aborting the loop; a harness
/// asserts on the counts after joining.
pub fn consume_loop<T: Stamp + Default>(ring: &RowRing<T>, limit: Option<u64>) -> ConsumeReport {
    let columns = ring.columns() as u64;
    let mut report = ConsumeReport {
        last_index: -1,
        ..ConsumeReport::default()
    };
    let mut prev_index: i64 = -1;
    let start = Instant::now();

    while limit.map_or(true, |n| report.rows < n) {
        let Some((ring_row, abs_row)) = ring.acquire_consume() else {
            break;
        };
        let base = abs_row * columns;
        // Safety: acquire_consume granted us Reading on ring_row; the
        // mutable borrow is needed to clear cells and ends before release.
        let cells = unsafe { ring.row_mut(ring_row) };
        for (col, cell) in cells.iter_mut().enumerate() {
            let expected = (base + col as u64) as i64;
            let got = cell.index_of();
            if got < prev_index {
                report.sequence_errors += 1;
            }
            if got != expected {
                report.stamp_errors += 1;
            }
            prev_index = got;
            report.cells += 1;
            report.last_index = got;
            *cell = T::default();
        }
        ring.publish_emptied(ring_row);
        report.rows += 1;
    }

    report.elapsed = start.elapsed();
    report
}
