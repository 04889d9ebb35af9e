// Row-width sweep benchmark.
//
// Reuses one fixed-capacity buffer across every power-of-ten
// factorization of its capacity and reports how the cost of a message
// falls as rows get wider (one claim CAS amortized over more cells).

use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rowring::mpmc::buffer::{BackoffPolicy, RowRing};
use rowring::mpmc::{consume_loop, produce_loop, RingBuilder};

const CAPACITY: usize = 1_000_000;

fn main() -> std::io::Result<()> {
    let args: Vec<String> = env::args().collect();
    let num_producers: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(2);
    let num_consumers: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(2);
    let secs_per_run: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(2);

    if args.len() < 3 {
        eprintln!("Usage: {} <num_producers> <num_consumers> [secs_per_run]", args[0]);
        eprintln!("Taking defaults: 2 producers, 2 consumers, 2s per run");
    }

    let mut ring: RowRing<i64> = RingBuilder::new()
        .with_rows(CAPACITY)
        .with_columns(1)
        .with_backoff(BackoffPolicy::Sleep(Duration::from_micros(1)))
        .build()?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_for_handler = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        interrupted_for_handler.store(true, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    println!(
        "Sweeping {} producers / {} consumers over {} cells, {}s per shape",
        num_producers, num_consumers, CAPACITY, secs_per_run
    );
    println!("{}", "=".repeat(80));
    println!(
        "{:>10} {:>10} {:>14} {:>14} {:>12} {:>10}",
        "rows", "columns", "produced", "consumed", "msgs/sec", "us/msg"
    );
    println!("{:-<80}", "");

    let mut columns = 1usize;
    while columns <= CAPACITY {
        // Mirror the half-steps of a decade sweep: 1, 5, 10, 50, 100 ...
        if columns >= 10 {
            run_shape(&mut ring, columns / 2, num_producers, num_consumers, secs_per_run);
        }
        run_shape(&mut ring, columns, num_producers, num_consumers, secs_per_run);
        if interrupted.load(Ordering::SeqCst) {
            println!("Interrupted, stopping sweep");
            break;
        }
        columns *= 10;
    }

    println!("{}", "=".repeat(80));
    Ok(())
}

fn run_shape(
    ring: &mut RowRing<i64>,
    columns: usize,
    num_producers: usize,
    num_consumers: usize,
    secs_per_run: u64,
) {
    let rows = CAPACITY / columns;
    ring.reset();
    ring.reshape(rows, columns).expect("factorization of the fixed capacity");
    let ring = &*ring;

    let (produced_cells, consumed_cells, busy) = thread::scope(|s| {
        let mut fillers = Vec::new();
        for _ in 0..num_producers {
            fillers.push(s.spawn(|| produce_loop(ring, None)));
        }
        let mut drains = Vec::new();
        for _ in 0..num_consumers {
            drains.push(s.spawn(|| consume_loop(ring, None)));
        }

        thread::sleep(Duration::from_secs(secs_per_run));
        ring.stop();

        let mut produced_cells = 0u64;
        let mut busy = Duration::ZERO;
        for h in fillers {
            let report = h.join().expect("producer panicked");
            produced_cells += report.cells;
            busy += report.elapsed;
        }
        let mut consumed_cells = 0u64;
        for h in drains {
            let report = h.join().expect("consumer panicked");
            consumed_cells += report.cells;
            assert_eq!(report.stamp_errors, 0, "consumed a cell it was never assigned");
        }
        (produced_cells, consumed_cells, busy)
    });

    let usec_per_msg = busy.as_secs_f64() * 1e6 / produced_cells.max(1) as f64;
    let msgs_per_sec = produced_cells as f64 / secs_per_run as f64;
    println!(
        "{:>10} {:>10} {:>14} {:>14} {:>12.0} {:>10.4}",
        rows, columns, produced_cells, consumed_cells, msgs_per_sec, usec_per_msg
    );
}
