/*!
 * Sync Lock
 *
 * Futex-assisted mutex: a CAS fast path on a wait word, falling back to
 * blocking on that word when contended. Equivalent to a mutex, without the
 * OS mutex cost when nobody else holds it.
 */

use crate::core::sync::config::SyncConfig;
use crate::core::sync::wait::WaitWord;
use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};
use std::time::Instant;

const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;

/// Mutex built on [`WaitWord`]
pub struct SyncLock<T: ?Sized> {
    word: WaitWord,
    value: UnsafeCell<T>,
}

// SAFETY: access to `value` is serialized by `word`.
unsafe impl<T: ?Sized + Send> Send for SyncLock<T> {}
unsafe impl<T: ?Sized + Send> Sync for SyncLock<T> {}

impl<T> SyncLock<T> {
    /// Create with the platform's default wait backend
    pub fn new(value: T) -> Self {
        Self::with_config(value, &SyncConfig::default())
    }

    pub fn with_config(value: T, config: &SyncConfig) -> Self {
        Self {
            word: WaitWord::new(UNLOCKED, config),
            value: UnsafeCell::new(value),
        }
    }

    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

impl<T: ?Sized> SyncLock<T> {
    /// Acquire the lock, blocking on the wait word while it is held
    #[inline]
    pub fn lock(&self) -> SyncLockGuard<'_, T> {
        while self.word.compare_exchange(UNLOCKED, LOCKED).is_err() {
            self.word.wait(LOCKED, None);
        }
        SyncLockGuard { lock: self }
    }

    /// Acquire the lock, giving up once `deadline` passes
    ///
    /// A woken waiter retries the CAS before it checks the deadline.
    pub fn try_lock_until(&self, deadline: Instant) -> Option<SyncLockGuard<'_, T>> {
        loop {
            if self.word.compare_exchange(UNLOCKED, LOCKED).is_ok() {
                return Some(SyncLockGuard { lock: self });
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            self.word.wait(LOCKED, Some(deadline - now));
        }
    }

    #[inline]
    pub fn try_lock(&self) -> Option<SyncLockGuard<'_, T>> {
        self.word
            .compare_exchange(UNLOCKED, LOCKED)
            .ok()
            .map(|_| SyncLockGuard { lock: self })
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.word.load() == LOCKED
    }

    /// Name of the wait backend used under contention
    pub fn backend_name(&self) -> &'static str {
        self.word.backend_name()
    }
}

impl<T: Default> Default for SyncLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// RAII guard; unlocks and wakes one waiter on drop
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct SyncLockGuard<'a, T: ?Sized> {
    lock: &'a SyncLock<T>,
}

impl<T: ?Sized> Deref for SyncLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the guard proves exclusive access.
        unsafe { &*self.lock.value.get() }
    }
}

impl<T: ?Sized> DerefMut for SyncLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: the guard proves exclusive access.
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<T: ?Sized> Drop for SyncLockGuard<'_, T> {
    #[inline]
    fn drop(&mut self) {
        self.lock.word.store(UNLOCKED);
        self.lock.word.wake_one();
    }
}
