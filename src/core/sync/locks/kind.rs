/*!
 * Cursor Lock Selection
 * Picks the lock guarding multi-writer / multi-reader cursor bookkeeping
 */

use super::spin::{SpinLock, SpinLockGuard};
use super::sync_lock::{SyncLock, SyncLockGuard};
use crate::core::sync::config::{futex_available, SyncConfig};
use parking_lot::{Mutex, MutexGuard};
use std::time::Instant;

/// Which lock a queue uses where more than one thread may touch a cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockKind {
    /// parking_lot OS-assisted mutex
    Mutex,
    /// Busy-wait spin lock (short sections only)
    Spin,
    /// Futex-assisted `SyncLock`
    Sync,
    /// `Sync` where a native futex exists, `Mutex` otherwise
    #[default]
    Auto,
}

impl LockKind {
    pub fn resolve(self) -> LockKind {
        match self {
            LockKind::Auto => {
                if futex_available() {
                    LockKind::Sync
                } else {
                    LockKind::Mutex
                }
            }
            other => other,
        }
    }
}

/// A lock over nothing, selected at construction
///
/// `Unsynchronized` is bound when the queue's flags promise a single thread
/// on that side; locking it is free.
pub enum CursorLock {
    Unsynchronized,
    Mutex(Mutex<()>),
    Spin(SpinLock<()>),
    Sync(SyncLock<()>),
}

/// Guard returned by [`CursorLock::lock`]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub enum CursorGuard<'a> {
    Unsynchronized,
    Mutex(MutexGuard<'a, ()>),
    Spin(SpinLockGuard<'a, ()>),
    Sync(SyncLockGuard<'a, ()>),
}

impl CursorLock {
    pub fn new(kind: LockKind, config: &SyncConfig) -> Self {
        match kind.resolve() {
            LockKind::Mutex => Self::Mutex(Mutex::new(())),
            LockKind::Spin => Self::Spin(SpinLock::new(())),
            // resolve() never yields Auto
            LockKind::Sync | LockKind::Auto => Self::Sync(SyncLock::with_config((), config)),
        }
    }

    #[inline(always)]
    pub fn lock(&self) -> CursorGuard<'_> {
        match self {
            Self::Unsynchronized => CursorGuard::Unsynchronized,
            Self::Mutex(m) => CursorGuard::Mutex(m.lock()),
            Self::Spin(s) => CursorGuard::Spin(s.lock()),
            Self::Sync(s) => CursorGuard::Sync(s.lock()),
        }
    }

    /// [`CursorLock::lock`] bounded by `deadline`; `None` once it passes
    pub fn lock_until(&self, deadline: Instant) -> Option<CursorGuard<'_>> {
        match self {
            Self::Unsynchronized => Some(CursorGuard::Unsynchronized),
            Self::Mutex(m) => m.try_lock_until(deadline).map(CursorGuard::Mutex),
            Self::Spin(s) => s.try_lock_until(deadline).map(CursorGuard::Spin),
            Self::Sync(s) => s.try_lock_until(deadline).map(CursorGuard::Sync),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Unsynchronized => "none",
            Self::Mutex(_) => "mutex",
            Self::Spin(_) => "spin",
            Self::Sync(_) => "sync",
        }
    }
}

impl std::fmt::Debug for CursorLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
