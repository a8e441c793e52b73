/*!
 * Slot Array and Cursor Arithmetic
 *
 * Shared by both queues. Cursors are monotonically increasing u64 counters;
 * the slot a cursor names is `cursor & mask`. At one billion writes per
 * second a u64 cursor wraps after ~584 years, so wraparound is only ever
 * handled in the masked index, never in the cursor comparisons.
 */

use super::handle::Handle;
use crate::core::errors::{QueueError, QueueResult};
use crate::core::limits::MAX_QUEUE_CAPACITY;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

/// Round a requested capacity up to the next power of two
pub fn round_capacity(requested: usize) -> QueueResult<usize> {
    if requested == 0 {
        return Err(QueueError::InvalidParam(
            "capacity must be greater than 0".into(),
        ));
    }

    requested
        .checked_next_power_of_two()
        .filter(|capacity| *capacity <= MAX_QUEUE_CAPACITY)
        .ok_or_else(|| {
            QueueError::InvalidParam(format!(
                "capacity {} rounds past the maximum of {}",
                requested, MAX_QUEUE_CAPACITY
            ))
        })
}

/// Fixed power-of-two array of payload slots
///
/// Slots are plain atomics so a lossy reader racing an overwrite reads some
/// published pointer instead of a torn value. All ordering between a slot and
/// its reader comes from the owning queue's cursor release/acquire pair;
/// slot accesses themselves are `Relaxed`.
pub(crate) struct Slots {
    slots: Box<[AtomicPtr<()>]>,
    mask: u64,
}

impl Slots {
    /// Allocate `capacity` null slots; `capacity` must already be rounded
    pub(crate) fn allocate(capacity: usize) -> QueueResult<Self> {
        debug_assert!(capacity.is_power_of_two());

        let mut slots: Vec<AtomicPtr<()>> = Vec::new();
        slots.try_reserve_exact(capacity).map_err(|e| {
            QueueError::MemAlloc(format!("failed to allocate {} slots: {}", capacity, e))
        })?;
        slots.extend((0..capacity).map(|_| AtomicPtr::new(ptr::null_mut())));

        Ok(Self {
            slots: slots.into_boxed_slice(),
            mask: (capacity - 1) as u64,
        })
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline(always)]
    pub(crate) fn index(&self, cursor: u64) -> usize {
        (cursor & self.mask) as usize
    }

    #[inline(always)]
    pub(crate) fn store(&self, cursor: u64, handle: Handle) {
        self.slots[self.index(cursor)].store(handle.as_ptr(), Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn load(&self, cursor: u64) -> Handle {
        Handle::from_ptr(self.slots[self.index(cursor)].load(Ordering::Relaxed))
    }
}
