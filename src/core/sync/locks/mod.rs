/*!
 * Lock-Based Synchronization Primitives
 *
 * - Spin lock (busy-wait, short sections)
 * - Sync lock (CAS fast path, wait-word slow path)
 * - Cursor lock (construction-time choice among the above)
 */

mod kind;
mod spin;
mod sync_lock;

// Re-export public API
pub use kind::{CursorGuard, CursorLock, LockKind};
pub use spin::{SpinLock, SpinLockGuard};
pub use sync_lock::{SyncLock, SyncLockGuard};
