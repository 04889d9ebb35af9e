mod builder;
mod consumer;
mod producer;

pub use builder::RingBuilder;
pub use consumer::{consume_loop, ConsumeReport};
pub use producer::{produce_loop, ProduceReport};

pub mod buffer {
    pub mod backoff;
    pub mod ring;
    mod ring_impl;
    pub mod status;
    pub use backoff::BackoffPolicy;
    pub use ring::{Cursors, RowRing}; // re-export for stable path
    pub use status::Status;
}
