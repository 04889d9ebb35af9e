use std::io;
use std::time::Duration;

use super::buffer::{BackoffPolicy, RowRing};

/// Configures and constructs a [`RowRing`].
pub struct RingBuilder {
    rows: usize,
    columns: usize,
    backoff: BackoffPolicy,
}

impl Default for RingBuilder {
    fn default() -> Self {
        Self {
            rows: 1024,
            columns: 1,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl RingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ring rows (the unit of synchronization).
    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    /// Cells per row, written and read without per-cell synchronization.
    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    /// Wait strategy for contended claims.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Shorthand for the sleeping back-off with a custom interval.
    pub fn with_sleep_backoff(self, interval: Duration) -> Self {
        self.with_backoff(BackoffPolicy::Sleep(interval))
    }

    pub fn build<T: Default>(self) -> io::Result<RowRing<T>> {
        RowRing::with_backoff(self.rows, self.columns, self.backoff)
    }
}
