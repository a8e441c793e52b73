/*!
 * Synchronization Primitives
 *
 * Wait/wake and locking building blocks for the queues:
 * - Futex-based (address-keyed parking) for minimal overhead
 * - Condvar-based (cross-platform) for reliability
 * - Adaptive spinwait for low-latency scenarios
 *
 * # Architecture
 *
 * `WaitWord` is the single blocking primitive: a 32-bit word plus a backend
 * chosen once from `SyncConfig`. `SpinLock` and `SyncLock` sit on top of it,
 * and `CursorLock` picks between them per queue.
 *
 * # Performance
 *
 * - Enum dispatch, no vtables on hot paths
 * - Wakes skip the backend entirely when nobody is waiting
 * - Cache-line aligned fallback state to prevent false sharing
 */

mod condvar;
mod config;
mod futex;
mod locks;
mod spinwait;
mod traits;
mod wait;

pub use config::{futex_available, StrategyType, SyncConfig};
pub use locks::{
    CursorGuard, CursorLock, LockKind, SpinLock, SpinLockGuard, SyncLock, SyncLockGuard,
};
pub use spinwait::spin_while;
pub use traits::{WaitStrategy, WakeResult};
pub use wait::{WaitError, WaitResult, WaitWord};

// Re-export specific strategies for advanced users
pub use condvar::CondvarWait;
pub use futex::FutexWait;
pub use spinwait::SpinWait;
