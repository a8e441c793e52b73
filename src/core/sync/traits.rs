/*!
 * Synchronization Traits
 *
 * Core abstraction for futex-style wait/wake on a 32-bit word.
 *
 * # Design: Trait-Based Abstraction for Implementations
 *
 * `WaitWord` itself uses enum dispatch; this trait is the seam every
 * backend implements so they stay interchangeable and individually testable.
 */

use std::sync::atomic::AtomicU32;
use std::time::Duration;

/// Result of a wake operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeResult {
    /// Successfully woke N waiters (N >= 1)
    Woken(usize),
    /// No waiters were waiting
    NoWaiters,
}

impl WakeResult {
    /// Check if any waiters were woken
    #[inline(always)]
    pub fn is_woken(&self) -> bool {
        matches!(self, WakeResult::Woken(_))
    }

    /// Get number of woken waiters (0 if none)
    #[inline(always)]
    pub fn count(&self) -> usize {
        match self {
            WakeResult::Woken(n) => *n,
            WakeResult::NoWaiters => 0,
        }
    }

    #[inline(always)]
    pub(crate) fn from_count(n: usize) -> Self {
        if n == 0 {
            WakeResult::NoWaiters
        } else {
            WakeResult::Woken(n)
        }
    }
}

/// Strategy for blocking on a word until it changes
///
/// Implementations must:
/// - Block only while `*word == expected`, checked atomically with respect to
///   concurrent wakes (no lost wakeups)
/// - Tolerate spurious returns; callers always re-check their condition
/// - Treat wakes with no waiters as a no-op
pub trait WaitStrategy: Send + Sync {
    /// Block while `word` holds `expected`
    ///
    /// Returns `false` only if the timeout elapsed. `true` means the thread
    /// was woken, the word had already changed, or the wake was spurious.
    fn wait(&self, word: &AtomicU32, expected: u32, timeout: Option<Duration>) -> bool;

    /// Wake at most one thread blocked on `word`
    fn wake_one(&self, word: &AtomicU32) -> WakeResult;

    /// Wake every thread blocked on `word`
    fn wake_all(&self, word: &AtomicU32) -> WakeResult;

    /// Get strategy name for debugging
    fn name(&self) -> &'static str;
}
