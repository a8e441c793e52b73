/*!
 * Adaptive Spin-Wait Strategy
 *
 * Optimized for low-latency scenarios where waits are typically very short.
 *
 * Spinning uses `crossbeam_utils::Backoff`: exponential `spin_loop` hints
 * first, then `yield_now` once the spin phase is completed. The same backoff
 * drives the spin lock, the ticket publisher, and the busy-loop read
 * strategies. `SpinWait` layers it in front of the condvar backend for the
 * wait-word layer.
 */

use super::condvar::CondvarWait;
use super::traits::{WaitStrategy, WakeResult};
use super::wait::{WaitError, WaitResult};
use crossbeam_utils::Backoff;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// Busy-wait while `blocked()` holds, never parking the thread
///
/// Returns `Err(WaitError::Timeout)` if the deadline passes first.
pub fn spin_while<F>(timeout: Option<Duration>, mut blocked: F) -> WaitResult<()>
where
    F: FnMut() -> bool,
{
    let deadline = timeout.map(|t| Instant::now() + t);
    let backoff = Backoff::new();

    while blocked() {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return Err(WaitError::Timeout);
            }
        }
        backoff.snooze();
    }
    Ok(())
}

/// Adaptive spin-wait strategy
///
/// # Performance
///
/// - Ultra-low latency for short waits (< 10µs)
/// - Falls back to condvar for long waits
pub struct SpinWait {
    /// Fallback condvar for long waits
    fallback: CondvarWait,
    /// Spin duration before falling back
    spin_duration: Duration,
    /// Maximum spin iterations
    max_spins: u32,
}

impl SpinWait {
    /// Create a new adaptive spin-wait strategy
    pub fn new(spin_duration: Duration, max_spins: u32) -> Self {
        Self {
            fallback: CondvarWait::new(),
            spin_duration,
            max_spins,
        }
    }

    /// Create with default parameters (optimized for <100µs waits)
    pub fn with_defaults() -> Self {
        Self::new(Duration::from_micros(50), 500)
    }

    /// Spin until the word moves or the spin budget runs out
    ///
    /// Returns true if the word moved while spinning.
    fn spin(&self, word: &AtomicU32, expected: u32, budget: Duration) -> bool {
        let start = Instant::now();
        let backoff = Backoff::new();
        let mut spins = 0u32;

        loop {
            if word.load(Ordering::Acquire) != expected {
                return true;
            }
            if spins >= self.max_spins || start.elapsed() >= budget {
                return false;
            }
            backoff.snooze();
            spins += 1;
        }
    }
}

impl Default for SpinWait {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl WaitStrategy for SpinWait {
    fn wait(&self, word: &AtomicU32, expected: u32, timeout: Option<Duration>) -> bool {
        let start = Instant::now();
        let budget = match timeout {
            Some(timeout) => timeout.min(self.spin_duration),
            None => self.spin_duration,
        };

        if self.spin(word, expected, budget) {
            return true;
        }

        let remaining = match timeout {
            Some(timeout) => {
                let elapsed = start.elapsed();
                if elapsed >= timeout {
                    return false;
                }
                Some(timeout - elapsed)
            }
            None => None,
        };

        // Fall back to condvar for longer waits
        self.fallback.wait(word, expected, remaining)
    }

    fn wake_one(&self, word: &AtomicU32) -> WakeResult {
        self.fallback.wake_one(word)
    }

    fn wake_all(&self, word: &AtomicU32) -> WakeResult {
        self.fallback.wake_all(word)
    }

    fn name(&self) -> &'static str {
        "spinwait"
    }
}
