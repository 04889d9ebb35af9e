//! Row-batched bounded MPMC ring buffer.
//!
//! The buffer is a grid of `rows x columns` payload cells. Producers and
//! consumers synchronize per row, then touch the row's `columns` cells
//! with no further coordination, amortizing one CAS over a whole batch.

pub mod mpmc;

// Debug implementations for various types
pub mod debug {
    pub mod struct_debug;
}

pub mod stamp;
