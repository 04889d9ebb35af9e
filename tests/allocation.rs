// Allocation accounting: the buffer allocates its storage at
// construction and the produce/consume cycle must run allocation-free.
//
// # Run with output
// cargo test --test allocation -- --nocapture

use memory_stats::memory_stats;
use rowring::mpmc::buffer::RowRing;
use rowring::mpmc::{consume_loop, produce_loop};

#[test]
#[serial_test::serial]
fn steady_state_traffic_allocates_nothing() {
    let ring: RowRing<i64> = RowRing::new(1024, 8).unwrap();

    // Warm up so lazily mapped pages and test-runner noise settle.
    produce_loop(&ring, Some(1024));
    consume_loop(&ring, Some(1024));

    let before = memory_stats().expect("memory stats unavailable on this platform");
    println!("Memory before: {} KiB physical", before.physical_mem / 1024);

    for _ in 0..8 {
        produce_loop(&ring, Some(1024));
        consume_loop(&ring, Some(1024));
    }

    let after = memory_stats().expect("memory stats unavailable on this platform");
    println!("Memory after:  {} KiB physical", after.physical_mem / 1024);

    // i64 cells and pre-sized arrays: eight full sweeps should not grow
    // the process by more than scheduler noise.
    let growth = after.physical_mem.saturating_sub(before.physical_mem);
    assert!(
        growth < 4 * 1024 * 1024,
        "unexpected growth of {growth} bytes during steady-state traffic"
    );
}
