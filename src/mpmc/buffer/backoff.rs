use std::time::Duration;

/// Wait strategy applied between failed row claims.
///
/// The acquire loops never park on an OS primitive; this only controls
/// what a thread does between a failed CAS and the next attempt.
/// `Sleep` is the default and trades latency for idle CPU, `Spin` burns a
/// core for the lowest latency, `Yield` sits in between and behaves well
/// when threads outnumber cores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffPolicy {
    /// Sleep for the given interval after each failed claim.
    Sleep(Duration),
    /// Busy-spin with a CPU relax hint.
    Spin,
    /// Yield the thread to the OS scheduler.
    Yield,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy::Sleep(Duration::from_micros(1))
    }
}

impl BackoffPolicy {
    #[inline]
    pub fn wait(&self) {
        match self {
            BackoffPolicy::Sleep(interval) => std::thread::sleep(*interval),
            BackoffPolicy::Spin => std::hint::spin_loop(),
            BackoffPolicy::Yield => std::thread::yield_now(),
        }
    }
}
