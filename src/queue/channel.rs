/*!
 * Backpressured Channel
 *
 * Bounded FIFO of payload handles. A write into a saturated channel fails
 * with `QueueError::Full` instead of overwriting or blocking; only readers
 * block.
 *
 * # Cursors
 *
 * `write_cursor` and `read_cursor` are monotonically increasing. The channel
 * is empty when they are equal and full when
 * `write_cursor - read_cursor == capacity - 1`, i.e. when
 * `(write_cursor + 1) & mask == read_cursor & mask`. One slot is always left
 * unused so the two states stay distinguishable without a count field.
 *
 * ```text
 * EMPTY ──write──▶ PARTIAL ──write──▶ FULL ──write──▶ Err(Full)
 *   ▲                │  ▲                │
 *   └─────read───────┘  └──────read──────┘
 * ```
 *
 * There is no closed state. End of stream is a caller convention, usually a
 * null [`Handle`] written once per reader.
 */

use super::config::QueueConfig;
use super::flags::QueueFlags;
use super::handle::Handle;
use super::slots::{round_capacity, Slots};
use super::strategy::{ReadWait, StrategyInfo, WakePolicy};
use crate::core::errors::{QueueError, QueueResult};
use crate::core::hints::unlikely;
use crate::core::limits::MIN_CHANNEL_CAPACITY;
use crate::core::sync::{CursorLock, WaitWord};
use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Lossless bounded queue of payload handles
///
/// # Examples
///
/// ```
/// use ai_os_sync::queue::{Channel, Handle, QueueFlags};
/// use ai_os_sync::QueueError;
///
/// let channel = Channel::new(4, QueueFlags::empty()).unwrap();
/// for i in 1..=3 {
///     channel.write(Handle::from_token(i)).unwrap();
/// }
/// assert_eq!(channel.write(Handle::from_token(4)), Err(QueueError::Full));
///
/// assert_eq!(channel.read(), Handle::from_token(1));
/// assert!(channel.write(Handle::from_token(4)).is_ok());
/// ```
pub struct Channel {
    /// Writer-side cursor
    write_cursor: CachePadded<AtomicU64>,
    /// Reader-side cursor
    read_cursor: CachePadded<AtomicU64>,
    /// Bumped after every publish; empty-channel readers sleep here
    seq: CachePadded<WaitWord>,

    /// Serializes writers; on its own line so writers never contend with
    /// the reader-side lock word
    write_lock: CachePadded<CursorLock>,
    /// Serializes readers; held across the empty-channel wait
    read_lock: CachePadded<CursorLock>,

    slots: Slots,
    flags: QueueFlags,
    read_wait: ReadWait,
    wake: WakePolicy,
}

impl Channel {
    /// Create a channel with default locking and wait backend
    ///
    /// `capacity` is rounded up to a power of two and must round to at least
    /// 2; at most `capacity - 1` items are in flight.
    pub fn new(capacity: usize, flags: QueueFlags) -> QueueResult<Self> {
        Self::with_config(QueueConfig::new(capacity).flags(flags))
    }

    pub fn with_config(config: QueueConfig) -> QueueResult<Self> {
        let capacity = round_capacity(config.capacity)?;
        if capacity < MIN_CHANNEL_CAPACITY {
            return Err(QueueError::InvalidParam(format!(
                "channel capacity {} leaves no room beside the sentinel slot",
                capacity
            )));
        }
        let slots = Slots::allocate(capacity)?;
        let flags = config.flags;

        let write_lock = if flags.single_writer() {
            CursorLock::Unsynchronized
        } else {
            CursorLock::new(config.lock, &config.sync)
        };
        let read_lock = if flags.single_reader() {
            CursorLock::Unsynchronized
        } else {
            CursorLock::new(config.lock, &config.sync)
        };

        // Only the read-lock holder ever sleeps on `seq`
        let (read_wait, wake) = if flags.busy_loop() {
            (ReadWait::BusyLoop, WakePolicy::Silent)
        } else {
            (ReadWait::Block, WakePolicy::One)
        };

        if flags.read_once() {
            debug!("READ_ONCE has no effect on a channel; every item is read once");
        }

        let channel = Self {
            write_cursor: CachePadded::new(AtomicU64::new(0)),
            read_cursor: CachePadded::new(AtomicU64::new(0)),
            seq: CachePadded::new(WaitWord::new(0, &config.sync)),
            write_lock: CachePadded::new(write_lock),
            read_lock: CachePadded::new(read_lock),
            slots,
            flags,
            read_wait,
            wake,
        };

        debug!(
            requested = config.capacity,
            capacity,
            flags = ?flags,
            strategies = ?channel.strategies(),
            "Channel initialized"
        );

        Ok(channel)
    }

    /// Append `handle`, or fail with `QueueError::Full`
    ///
    /// Never blocks on readers and never retries internally.
    #[inline]
    pub fn write(&self, handle: Handle) -> QueueResult<()> {
        {
            let _guard = self.write_lock.lock();
            let write = self.write_cursor.load(Ordering::Relaxed);
            let read = self.read_cursor.load(Ordering::Acquire);

            if unlikely(write - read >= self.max_in_flight() as u64) {
                trace!(write, read, "Channel full, write rejected");
                return Err(QueueError::Full);
            }

            self.slots.store(write, handle);
            self.write_cursor.store(write + 1, Ordering::Release);
        }

        self.wake.publish(&self.seq);
        Ok(())
    }

    /// Remove the oldest item, blocking while the channel is empty
    pub fn read(&self) -> Handle {
        match self.read_inner(None) {
            Ok(handle) => handle,
            // Untimed waits cannot time out
            Err(_) => Handle::null(),
        }
    }

    /// [`Channel::read`] with a bound on the whole call
    ///
    /// The deadline covers both waiting for another reader to release the
    /// read lock and waiting for data.
    pub fn read_timeout(&self, timeout: Duration) -> QueueResult<Handle> {
        self.read_inner(Some(timeout)).map_err(|err| {
            trace!(?timeout, "Channel read timed out");
            err
        })
    }

    /// Remove the oldest item if there is one
    pub fn try_read(&self) -> Option<Handle> {
        let _guard = self.read_lock.lock();
        let read = self.read_cursor.load(Ordering::Relaxed);
        if self.write_cursor.load(Ordering::Acquire) == read {
            return None;
        }
        Some(self.take(read))
    }

    fn read_inner(&self, timeout: Option<Duration>) -> QueueResult<Handle> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let _guard = match deadline {
            Some(deadline) => self
                .read_lock
                .lock_until(deadline)
                .ok_or(QueueError::Timeout)?,
            None => self.read_lock.lock(),
        };
        let read = self.read_cursor.load(Ordering::Relaxed);

        let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
        self.read_wait
            .wait_while(&self.seq, remaining, || {
                self.write_cursor.load(Ordering::Acquire) == read
            })
            .map_err(|_| QueueError::Timeout)?;

        Ok(self.take(read))
    }

    /// Consume the slot at `read`; caller holds the read lock
    #[inline]
    fn take(&self, read: u64) -> Handle {
        let handle = self.slots.load(read);
        // Release: the slot is free for the writer only after we loaded it
        self.read_cursor.store(read + 1, Ordering::Release);
        handle
    }

    /// Items currently in flight (a snapshot)
    #[inline]
    pub fn len(&self) -> usize {
        let read = self.read_cursor.load(Ordering::Acquire);
        let write = self.write_cursor.load(Ordering::Acquire);
        write.saturating_sub(read) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.max_in_flight()
    }

    /// Rounded capacity, including the sentinel slot
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Most items the channel holds at once (`capacity - 1`)
    #[inline]
    pub fn max_in_flight(&self) -> usize {
        self.slots.capacity() - 1
    }

    #[inline]
    pub fn flags(&self) -> QueueFlags {
        self.flags
    }

    /// Wake a blocked reader without publishing anything
    ///
    /// The reader re-checks the cursors and goes back to sleep if the channel
    /// is still empty.
    pub fn wake_readers(&self) {
        self.seq.wake_all();
    }

    pub fn strategies(&self) -> StrategyInfo {
        StrategyInfo {
            write: self.write_lock.name(),
            read: self.read_wait.name(),
            wake: self.wake.name(),
            backend: self.seq.backend_name(),
        }
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("flags", &self.flags)
            .finish()
    }
}
