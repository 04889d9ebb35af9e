// Multi-threaded protocol tests. The timed tests share the machine's
// cores, so they run under one lock to keep their timing observations
// meaningful.

use std::thread;
use std::time::{Duration, Instant};

use rowring::mpmc::buffer::{BackoffPolicy, RowRing};
use rowring::mpmc::{consume_loop, produce_loop, ConsumeReport, ProduceReport, RingBuilder};

static TEST_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());

/// Poll `pred` until it holds or `timeout` expires.
fn wait_until(pred: impl Fn() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if pred() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    pred()
}

#[test]
fn spsc_drains_every_produced_row() {
    let ring: RowRing<i64> = RingBuilder::new()
        .with_rows(10)
        .with_columns(1)
        .build()
        .unwrap();

    thread::scope(|s| {
        let producer = s.spawn(|| produce_loop(&ring, Some(1000)));
        let consumer = s.spawn(|| consume_loop(&ring, None));

        assert!(
            wait_until(|| ring.consumed() == 1000, Duration::from_secs(30)),
            "consumer failed to drain: produced {} consumed {}",
            ring.produced(),
            ring.consumed()
        );
        ring.stop();

        let produced = producer.join().unwrap();
        let consumed = consumer.join().unwrap();

        assert_eq!(produced.rows, 1000);
        assert_eq!(consumed.rows, 1000);
        // Single consumer, single producer: the read sequence is exactly
        // 0..=999 in order.
        assert_eq!(consumed.last_index, 999);
        assert_eq!(consumed.sequence_errors, 0);
        assert_eq!(consumed.stamp_errors, 0);
    });
}

#[test]
fn wide_rows_deliver_exact_cell_batches() {
    // Row id a must yield cells 5a..5a+4, bit for bit.
    let ring: RowRing<i64> = RingBuilder::new()
        .with_rows(2)
        .with_columns(5)
        .build()
        .unwrap();

    thread::scope(|s| {
        let producer = s.spawn(|| produce_loop(&ring, Some(200)));
        let consumer = s.spawn(|| consume_loop(&ring, Some(200)));

        let produced = producer.join().unwrap();
        let consumed = consumer.join().unwrap();

        assert_eq!(produced.cells, 1000);
        assert_eq!(consumed.cells, 1000);
        assert_eq!(consumed.stamp_errors, 0);
        assert_eq!(consumed.sequence_errors, 0);
    });
}

#[test]
fn mpmc_accounting_is_exact_after_stop() {
    let _guard = TEST_LOCK.lock();

    let ring: RowRing<i64> = RingBuilder::new()
        .with_rows(1000)
        .with_columns(1)
        .with_backoff(BackoffPolicy::Yield)
        .build()
        .unwrap();

    let (produce_reports, consume_reports) = run_timed(&ring, 4, 4, Duration::from_millis(300));

    let produced_rows: u64 = produce_reports.iter().map(|r| r.rows).sum();
    let consumed_rows: u64 = consume_reports.iter().map(|r| r.rows).sum();

    // Every claim is unique, so the per-thread tallies must add up to the
    // cursor positions exactly: nothing lost, nothing duplicated.
    assert_eq!(produced_rows, ring.produced());
    assert_eq!(consumed_rows, ring.consumed());
    assert!(consumed_rows <= produced_rows);
    // The gap is bounded by the in-flight capacity.
    assert!(
        produced_rows - consumed_rows <= 1000,
        "occupancy {} exceeds ring size",
        produced_rows - consumed_rows
    );
    for report in &consume_reports {
        assert_eq!(report.sequence_errors, 0);
        assert_eq!(report.stamp_errors, 0);
    }
}

#[test]
fn generation_check_recovers_slot_overwrites() {
    let _guard = TEST_LOCK.lock();

    // A tiny ring and a long back-off make a waiting claimant's view go
    // stale while the rest of the threads lap the ring, which is exactly
    // the overwrite race the generation tag exists to catch.
    let ring: RowRing<i64> = RingBuilder::new()
        .with_rows(4)
        .with_columns(8)
        .with_sleep_backoff(Duration::from_micros(10))
        .build()
        .unwrap();

    thread::scope(|s| {
        let mut fillers = Vec::new();
        for _ in 0..2 {
            fillers.push(s.spawn(|| produce_loop(&ring, None)));
        }
        let mut drains = Vec::new();
        for _ in 0..2 {
            drains.push(s.spawn(|| consume_loop(&ring, None)));
        }

        // Run until at least one stale claim has been caught, bounded so
        // the test cannot spin forever on a pathological scheduler.
        wait_until(|| ring.generation_misses() > 0, Duration::from_secs(10));
        thread::sleep(Duration::from_millis(50));
        ring.stop();

        let consume_reports: Vec<ConsumeReport> =
            drains.into_iter().map(|h| h.join().unwrap()).collect();
        for h in fillers {
            h.join().unwrap();
        }

        println!(
            "generation misses observed: {} over {} consumed rows",
            ring.generation_misses(),
            ring.consumed()
        );
        assert!(
            ring.generation_misses() > 0,
            "stress run never produced a stale claim; raise the run time"
        );
        // The recovery must be invisible in the data: every delivered
        // cell carries its own index and per-thread order never regresses.
        for report in &consume_reports {
            assert_eq!(report.stamp_errors, 0);
            assert_eq!(report.sequence_errors, 0);
        }
    });
}

#[test]
fn stop_unblocks_producers_on_a_full_ring() {
    let _guard = TEST_LOCK.lock();

    let ring: RowRing<i64> = RingBuilder::new()
        .with_rows(8)
        .with_columns(1)
        .build()
        .unwrap();

    thread::scope(|s| {
        let a = s.spawn(|| produce_loop(&ring, None));
        let b = s.spawn(|| produce_loop(&ring, None));

        // No consumer: the ring fills and both producers spin.
        assert!(wait_until(|| ring.produced() == 8, Duration::from_secs(10)));
        thread::sleep(Duration::from_millis(20));
        ring.stop();

        let ra = a.join().unwrap();
        let rb = b.join().unwrap();
        assert_eq!(ra.rows + rb.rows, 8);
        assert_eq!(ring.produced(), 8);
    });
}

#[test]
fn stop_unblocks_consumers_on_an_empty_ring() {
    let _guard = TEST_LOCK.lock();

    let ring: RowRing<i64> = RowRing::new(8, 1).unwrap();

    thread::scope(|s| {
        let a = s.spawn(|| consume_loop(&ring, None));
        let b = s.spawn(|| consume_loop(&ring, None));

        // No producer: both consumers spin on an empty ring.
        thread::sleep(Duration::from_millis(50));
        ring.stop();

        assert_eq!(a.join().unwrap().rows, 0);
        assert_eq!(b.join().unwrap().rows, 0);
    });
}

/// Launch `producers` + `consumers` unlimited driver loops against
/// `ring`, stop after `run_for`, and hand back the joined reports.
fn run_timed(
    ring: &RowRing<i64>,
    producers: usize,
    consumers: usize,
    run_for: Duration,
) -> (Vec<ProduceReport>, Vec<ConsumeReport>) {
    thread::scope(|s| {
        let mut fillers = Vec::new();
        for _ in 0..producers {
            fillers.push(s.spawn(move || produce_loop(ring, None)));
        }
        let mut drains = Vec::new();
        for _ in 0..consumers {
            drains.push(s.spawn(move || consume_loop(ring, None)));
        }

        thread::sleep(run_for);
        ring.stop();

        (
            fillers.into_iter().map(|h| h.join().unwrap()).collect(),
            drains.into_iter().map(|h| h.join().unwrap()).collect(),
        )
    })
}
