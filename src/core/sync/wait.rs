/*!
 * Wait Word
 *
 * A 32-bit atomic word with futex-style block/wake, the primitive every
 * blocking path in the crate sits on. The backend is chosen once at
 * construction from `SyncConfig` and never changes for the instance.
 *
 * # Design: Enum Dispatch for Zero-Cost Abstraction
 *
 * Backends are held in a closed enum instead of `Box<dyn WaitStrategy>`, so
 * hot-path calls are a predictable branch instead of a vtable load.
 *
 * # Lost-wakeup freedom
 *
 * Waiters bump `waiters` before the backend re-checks the word; wakers change
 * the word before reading `waiters`. Both sides use `SeqCst`, so at least one
 * of them observes the other and a wake is never skipped for a thread that
 * is about to sleep.
 */

use super::condvar::CondvarWait;
use super::config::{StrategyType, SyncConfig};
use super::futex::FutexWait;
use super::spinwait::SpinWait;
use super::traits::{WaitStrategy, WakeResult};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Result type for wait operations
pub type WaitResult<T> = Result<T, WaitError>;

/// Wait operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WaitError {
    #[error("Wait operation timed out")]
    Timeout,
}

/// Wait strategy implementation (enum dispatch for zero overhead)
enum WaitBackend {
    Futex(FutexWait),
    Condvar(CondvarWait),
    SpinWait(SpinWait),
}

impl WaitBackend {
    fn from_config(config: &SyncConfig) -> Self {
        match config.select_strategy() {
            StrategyType::Futex => Self::Futex(FutexWait::new()),
            StrategyType::Condvar => Self::Condvar(CondvarWait::new()),
            StrategyType::SpinWait => {
                Self::SpinWait(SpinWait::new(config.spin_duration, config.max_spins))
            }
            // select_strategy never yields Auto
            StrategyType::Auto => Self::Condvar(CondvarWait::new()),
        }
    }

    #[inline(always)]
    fn wait(&self, word: &AtomicU32, expected: u32, timeout: Option<Duration>) -> bool {
        match self {
            Self::Futex(s) => s.wait(word, expected, timeout),
            Self::Condvar(s) => s.wait(word, expected, timeout),
            Self::SpinWait(s) => s.wait(word, expected, timeout),
        }
    }

    #[inline(always)]
    fn wake_one(&self, word: &AtomicU32) -> WakeResult {
        match self {
            Self::Futex(s) => s.wake_one(word),
            Self::Condvar(s) => s.wake_one(word),
            Self::SpinWait(s) => s.wake_one(word),
        }
    }

    #[inline(always)]
    fn wake_all(&self, word: &AtomicU32) -> WakeResult {
        match self {
            Self::Futex(s) => s.wake_all(word),
            Self::Condvar(s) => s.wake_all(word),
            Self::SpinWait(s) => s.wake_all(word),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Futex(s) => s.name(),
            Self::Condvar(s) => s.name(),
            Self::SpinWait(s) => s.name(),
        }
    }
}

/// A 32-bit word threads can block on until it changes
///
/// # Examples
///
/// ```
/// use ai_os_sync::core::sync::WaitWord;
/// use std::time::Duration;
///
/// let word = WaitWord::with_defaults(0);
///
/// // Value differs from expected: returns immediately
/// assert!(word.wait(1, Some(Duration::from_millis(10))));
///
/// // Value matches: blocks until the timeout
/// assert!(!word.wait(0, Some(Duration::from_millis(10))));
/// ```
pub struct WaitWord {
    word: AtomicU32,
    waiters: AtomicU32,
    backend: WaitBackend,
}

impl WaitWord {
    /// Create a word holding `value` with the backend `config` selects
    pub fn new(value: u32, config: &SyncConfig) -> Self {
        Self {
            word: AtomicU32::new(value),
            waiters: AtomicU32::new(0),
            backend: WaitBackend::from_config(config),
        }
    }

    /// Create with default configuration (auto-selects best backend)
    pub fn with_defaults(value: u32) -> Self {
        Self::new(value, &SyncConfig::default())
    }

    #[inline(always)]
    pub fn load(&self) -> u32 {
        self.word.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub fn store(&self, value: u32) {
        self.word.store(value, Ordering::SeqCst);
    }

    /// Wrapping add, returning the previous value
    #[inline(always)]
    pub fn fetch_add(&self, delta: u32) -> u32 {
        self.word.fetch_add(delta, Ordering::SeqCst)
    }

    #[inline(always)]
    pub fn compare_exchange(&self, current: u32, new: u32) -> Result<u32, u32> {
        self.word
            .compare_exchange(current, new, Ordering::SeqCst, Ordering::Relaxed)
    }

    #[inline(always)]
    pub fn compare_exchange_weak(&self, current: u32, new: u32) -> Result<u32, u32> {
        self.word
            .compare_exchange_weak(current, new, Ordering::SeqCst, Ordering::Relaxed)
    }

    /// Block while the word equals `expected`
    ///
    /// Returns `false` only on timeout. A `true` return does not promise the
    /// word changed; re-check the condition (see [`WaitWord::wait_while`]).
    #[inline]
    pub fn wait(&self, expected: u32, timeout: Option<Duration>) -> bool {
        self.waiters.fetch_add(1, Ordering::SeqCst);
        let woken = self.backend.wait(&self.word, expected, timeout);
        self.waiters.fetch_sub(1, Ordering::Release);
        woken
    }

    /// Block while `blocked()` holds, re-checking after every wake
    ///
    /// The word is sampled before each predicate check, so any writer that
    /// updates the predicate's state and then moves the word either is seen
    /// by the predicate or makes the following `wait` return.
    pub fn wait_while<F>(&self, timeout: Option<Duration>, mut blocked: F) -> WaitResult<()>
    where
        F: FnMut() -> bool,
    {
        let deadline = timeout.map(|t| Instant::now() + t);

        loop {
            let seen = self.load();
            if !blocked() {
                return Ok(());
            }

            let remaining = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(WaitError::Timeout);
                    }
                    Some(deadline - now)
                }
                None => None,
            };

            self.wait(seen, remaining);
        }
    }

    /// Wake one blocked thread; no-op if none are waiting
    #[inline]
    pub fn wake_one(&self) -> WakeResult {
        if self.waiters.load(Ordering::SeqCst) == 0 {
            return WakeResult::NoWaiters;
        }
        self.backend.wake_one(&self.word)
    }

    /// Wake every blocked thread; no-op if none are waiting
    #[inline]
    pub fn wake_all(&self) -> WakeResult {
        if self.waiters.load(Ordering::SeqCst) == 0 {
            return WakeResult::NoWaiters;
        }
        self.backend.wake_all(&self.word)
    }

    /// Approximate number of threads inside `wait` (diagnostics only)
    #[inline]
    pub fn waiter_count(&self) -> usize {
        self.waiters.load(Ordering::Relaxed) as usize
    }

    /// Get the name of the active backend
    #[inline]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

impl std::fmt::Debug for WaitWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitWord")
            .field("value", &self.load())
            .field("waiters", &self.waiter_count())
            .field("backend", &self.backend_name())
            .finish()
    }
}
