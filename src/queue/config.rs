/*!
 * Queue Configuration
 */

use super::flags::QueueFlags;
use crate::core::sync::{LockKind, SyncConfig};

/// Everything a queue needs at construction
///
/// ```
/// use ai_os_sync::core::sync::{LockKind, SyncConfig};
/// use ai_os_sync::queue::{Channel, QueueConfig, QueueFlags};
///
/// let config = QueueConfig::new(64)
///     .flags(QueueFlags::SINGLE_READER)
///     .lock(LockKind::Spin)
///     .sync(SyncConfig::low_latency());
/// let channel = Channel::with_config(config).unwrap();
/// assert_eq!(channel.capacity(), 64);
/// ```
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Requested capacity; rounded up to a power of two
    pub capacity: usize,
    pub flags: QueueFlags,
    /// Lock for cursors shared by several writers or readers
    pub lock: LockKind,
    /// Wait backend for blocking readers and `SyncLock`s
    pub sync: SyncConfig,
}

impl QueueConfig {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            flags: QueueFlags::empty(),
            lock: LockKind::default(),
            sync: SyncConfig::default(),
        }
    }

    pub fn flags(mut self, flags: QueueFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn lock(mut self, lock: LockKind) -> Self {
        self.lock = lock;
        self
    }

    pub fn sync(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }
}
