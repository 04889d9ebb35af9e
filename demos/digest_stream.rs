// Streams digest-stamped payloads through the buffer.
//
// Each cell carries the SHA-256 of its own index; the consume side
// re-derives the digest to prove that every delivered cell is the one
// produced for its position, even with a non-trivial payload type.

use std::env;
use std::thread;

use rowring::mpmc::{consume_loop, produce_loop, RingBuilder};
use rowring::stamp::Stamp;
use sha2::{Digest, Sha256};

#[derive(Clone, Default)]
struct DigestCell {
    index: i64,
    digest: String,
}

fn digest_for(index: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("cell_{index}").as_bytes());
    format!("{:x}", hasher.finalize())
}

impl Stamp for DigestCell {
    fn stamp(index: u64) -> Self {
        Self {
            index: index as i64,
            digest: digest_for(index as i64),
        }
    }

    // A cell only counts as its index if the digest checks out, so a
    // corrupted or misdelivered payload surfaces as a stamp error.
    fn index_of(&self) -> i64 {
        if self.digest == digest_for(self.index) {
            self.index
        } else {
            -1
        }
    }
}

fn main() -> std::io::Result<()> {
    let args: Vec<String> = env::args().collect();
    let rows_to_stream: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(10_000);

    let ring = RingBuilder::new()
        .with_rows(256)
        .with_columns(16)
        .build::<DigestCell>()?;

    println!(
        "Streaming {} rows of {} digest cells each",
        rows_to_stream,
        ring.columns()
    );

    let (produced, consumed) = thread::scope(|s| {
        let producer = s.spawn(|| produce_loop(&ring, Some(rows_to_stream)));
        let consumer = s.spawn(|| consume_loop(&ring, Some(rows_to_stream)));
        (
            producer.join().expect("producer panicked"),
            consumer.join().expect("consumer panicked"),
        )
    });

    println!("{}", "=".repeat(80));
    println!("Cells produced:     {}", produced.cells);
    println!("Cells verified:     {}", consumed.cells - consumed.stamp_errors);
    println!("Digest mismatches:  {}", consumed.stamp_errors);
    println!("Order violations:   {}", consumed.sequence_errors);
    println!("Elapsed:            {:.3?}", consumed.elapsed);
    println!(
        "Throughput:         {:.2} cells/sec",
        consumed.cells as f64 / consumed.elapsed.as_secs_f64()
    );
    println!("{}", "=".repeat(80));

    if consumed.stamp_errors > 0 || consumed.sequence_errors > 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "digest verification failed",
        ));
    }
    Ok(())
}
