/*!
 * Condvar-Based Wait Strategy
 *
 * Cross-platform fallback using parking_lot::Condvar for platforms without a
 * futex-equivalent.
 *
 * # Design
 *
 * Each instance owns one mutex/condvar pair and serves exactly one wait word.
 * The word comparison happens with the mutex held, and wakers take the same
 * mutex before notifying, so a waker can never slip between a waiter's check
 * and its sleep.
 */

use super::traits::{WaitStrategy, WakeResult};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

/// Condvar-based wait strategy bound to a single word
#[repr(C, align(64))] // Cache-line aligned to prevent false sharing
pub struct CondvarWait {
    condvar: Condvar,
    mutex: Mutex<()>,
    waiters: AtomicUsize,
}

impl CondvarWait {
    /// Create a new condvar-based wait strategy
    pub fn new() -> Self {
        Self {
            condvar: Condvar::new(),
            mutex: Mutex::new(()),
            waiters: AtomicUsize::new(0),
        }
    }
}

impl Default for CondvarWait {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitStrategy for CondvarWait {
    fn wait(&self, word: &AtomicU32, expected: u32, timeout: Option<Duration>) -> bool {
        let mut guard = self.mutex.lock();

        if word.load(Ordering::SeqCst) != expected {
            return true;
        }

        self.waiters.fetch_add(1, Ordering::Relaxed);
        let timed_out = match timeout {
            Some(timeout) => self.condvar.wait_for(&mut guard, timeout).timed_out(),
            None => {
                self.condvar.wait(&mut guard);
                false
            }
        };
        self.waiters.fetch_sub(1, Ordering::Relaxed);

        !timed_out
    }

    fn wake_one(&self, _word: &AtomicU32) -> WakeResult {
        // Serialize against a waiter between its check and its sleep
        let _guard = self.mutex.lock();
        if self.waiters.load(Ordering::Relaxed) == 0 {
            return WakeResult::NoWaiters;
        }
        WakeResult::from_count(self.condvar.notify_one() as usize)
    }

    fn wake_all(&self, _word: &AtomicU32) -> WakeResult {
        let _guard = self.mutex.lock();
        if self.waiters.load(Ordering::Relaxed) == 0 {
            return WakeResult::NoWaiters;
        }
        WakeResult::from_count(self.condvar.notify_all())
    }

    fn name(&self) -> &'static str {
        "condvar"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    struct Shared {
        word: AtomicU32,
        cv: CondvarWait,
    }

    #[test]
    fn test_condvar_wake_one() {
        let shared = Arc::new(Shared {
            word: AtomicU32::new(0),
            cv: CondvarWait::new(),
        });
        let shared_clone = shared.clone();

        let handle = thread::spawn(move || {
            shared_clone
                .cv
                .wait(&shared_clone.word, 0, Some(Duration::from_secs(1)))
        });

        // Give thread time to wait
        thread::sleep(Duration::from_millis(50));

        shared.word.store(1, Ordering::SeqCst);
        let result = shared.cv.wake_one(&shared.word);
        assert!(matches!(result, WakeResult::Woken(1)));

        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_condvar_timeout() {
        let word = AtomicU32::new(0);
        let cv = CondvarWait::new();
        let start = Instant::now();
        let result = cv.wait(&word, 0, Some(Duration::from_millis(50)));
        let elapsed = start.elapsed();

        assert!(!result); // Should timeout
        assert!(elapsed >= Duration::from_millis(50));
    }

    #[test]
    fn test_condvar_wake_all() {
        let shared = Arc::new(Shared {
            word: AtomicU32::new(0),
            cv: CondvarWait::new(),
        });

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let shared_clone = shared.clone();
                thread::spawn(move || {
                    shared_clone
                        .cv
                        .wait(&shared_clone.word, 0, Some(Duration::from_secs(1)))
                })
            })
            .collect();

        // Give threads time to wait
        thread::sleep(Duration::from_millis(100));

        shared.word.store(1, Ordering::SeqCst);
        let result = shared.cv.wake_all(&shared.word);
        assert!(result.is_woken());

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
