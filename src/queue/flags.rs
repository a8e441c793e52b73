/*!
 * Queue Flags
 * Construction-time mode bits; never changed afterwards
 */

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Mode selection for [`RingBuffer`](super::RingBuffer) and
    /// [`Channel`](super::Channel)
    ///
    /// An empty set means: many writers (locked), many readers, blocking
    /// reads, broadcast delivery (ring buffer only).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct QueueFlags: u32 {
        /// Caller guarantees at most one thread ever writes
        const SINGLE_WRITER = 1 << 0;
        /// Caller guarantees at most one thread ever reads
        const SINGLE_READER = 1 << 1;
        /// Readers spin (with yields) instead of blocking
        const BUSY_LOOP = 1 << 2;
        /// Ring buffer only: each item goes to exactly one reader
        const READ_ONCE = 1 << 3;
    }
}

impl QueueFlags {
    #[inline]
    pub fn single_writer(self) -> bool {
        self.contains(Self::SINGLE_WRITER)
    }

    #[inline]
    pub fn single_reader(self) -> bool {
        self.contains(Self::SINGLE_READER)
    }

    #[inline]
    pub fn busy_loop(self) -> bool {
        self.contains(Self::BUSY_LOOP)
    }

    #[inline]
    pub fn read_once(self) -> bool {
        self.contains(Self::READ_ONCE)
    }
}
