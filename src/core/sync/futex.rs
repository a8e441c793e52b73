/*!
 * Futex-Based Wait Strategy
 *
 * Uses parking_lot_core's address-keyed parking lot. The word's own address
 * is the park key and the "still equal to expected" check runs inside the
 * validate callback, under the parking bucket lock, which is exactly the
 * futex(2) contract: a wake that races the check is never lost.
 *
 * # Design
 *
 * - Stateless: the parking lot is global, the key is the word address
 * - Lock-free fast path when the word has already moved
 * - Multiple words may hash to one bucket (spurious wakeups are acceptable)
 */

use super::traits::{WaitStrategy, WakeResult};
use crate::core::limits::PARK_TOKEN;
use parking_lot_core::{park, unpark_all, unpark_one, ParkResult, ParkToken, UnparkToken};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// Futex-style wait strategy over the global parking lot
#[derive(Debug, Default, Clone, Copy)]
pub struct FutexWait;

impl FutexWait {
    /// Create a new futex-based wait strategy
    pub const fn new() -> Self {
        Self
    }

    #[inline(always)]
    fn key(word: &AtomicU32) -> usize {
        word as *const AtomicU32 as usize
    }
}

impl WaitStrategy for FutexWait {
    fn wait(&self, word: &AtomicU32, expected: u32, timeout: Option<Duration>) -> bool {
        let deadline = timeout.map(|d| Instant::now() + d);

        // SAFETY: the validate and timed-out callbacks do not call back into
        // the parking lot and do not panic.
        let result = unsafe {
            park(
                Self::key(word),
                || word.load(Ordering::SeqCst) == expected,
                || {},
                |_key, _was_last| {},
                ParkToken(PARK_TOKEN),
                deadline,
            )
        };

        match result {
            ParkResult::Unparked(_) => true,
            // Word already moved before we could sleep
            ParkResult::Invalid => true,
            ParkResult::TimedOut => false,
        }
    }

    fn wake_one(&self, word: &AtomicU32) -> WakeResult {
        // SAFETY: the callback does not touch the parking lot.
        let result = unsafe { unpark_one(Self::key(word), |_| UnparkToken(PARK_TOKEN)) };
        WakeResult::from_count(result.unparked_threads)
    }

    fn wake_all(&self, word: &AtomicU32) -> WakeResult {
        // SAFETY: no callbacks involved.
        let unparked = unsafe { unpark_all(Self::key(word), UnparkToken(PARK_TOKEN)) };
        WakeResult::from_count(unparked)
    }

    fn name(&self) -> &'static str {
        "futex"
    }
}
