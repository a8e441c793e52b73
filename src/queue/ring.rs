/*!
 * Broadcast Ring Buffer
 *
 * Fixed power-of-two array of payload handles with one shared write cursor.
 * Writes never block and never fail: a writer that laps a slow reader
 * overwrites unread slots without any signal. Newest data always wins.
 *
 * # Delivery modes
 *
 * - **Broadcast** (default): every reader keeps its own index and sees every
 *   item it does not fall behind on. `read(idx)` waits until the write cursor
 *   passes `idx`.
 * - **Read-once** (`READ_ONCE`): one shared read cursor behind a lock; each
 *   item goes to whichever reader arrives next. `idx` is ignored.
 *
 * # Write strategies
 *
 * | flags                       | strategy                                  |
 * |-----------------------------|-------------------------------------------|
 * | `SINGLE_WRITER`             | store + release-publish, no lock          |
 * | `BUSY_LOOP` (multi-writer)  | ticket reserve, then in-order publish     |
 * | otherwise                   | cursor lock around store + publish        |
 *
 * # Memory Layout
 *
 * ```text
 * ┌──────────────────────────────┐
 * │ cursor      (writer line)    │  published write cursor
 * │ next        (writer line)    │  ticket counter
 * │ read_cursor (reader line)    │  read-once shared cursor
 * │ seq         (wait line)      │  readers sleep here
 * │ write       (lock line)      │  write strategy + its lock word
 * │ delivery    (lock line)      │  read-once lock word
 * ├──────────────────────────────┤
 * │ slots, strategies (cold)     │
 * └──────────────────────────────┘
 * ```
 */

use super::config::QueueConfig;
use super::flags::QueueFlags;
use super::handle::Handle;
use super::slots::{round_capacity, Slots};
use super::strategy::{ReadWait, StrategyInfo, WakePolicy};
use crate::core::errors::{QueueError, QueueResult};
use crate::core::sync::{CursorLock, WaitWord};
use crossbeam_utils::{Backoff, CachePadded};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

enum WriteStrategy {
    /// Multi-writer, serialized by a lock
    Locked(CursorLock),
    /// Single writer, no synchronization between writers
    Unsynchronized,
    /// Multi-writer: fetch-add reservation, ticket-ordered publish
    Ticket,
}

impl WriteStrategy {
    fn name(&self) -> &'static str {
        match self {
            Self::Locked(_) => "lock",
            Self::Unsynchronized => "single_writer",
            Self::Ticket => "ticket",
        }
    }
}

enum Delivery {
    Broadcast,
    /// Shared read cursor, serialized by the lock
    ReadOnce(CursorLock),
}

/// Lossy broadcast queue of payload handles
///
/// Created by [`RingBuffer::new`] / [`RingBuffer::with_config`]; dropping it
/// releases the slot array and locks. Payloads still referenced by slots are
/// not touched.
pub struct RingBuffer {
    /// Published write cursor: slots `[0, cursor)` have been written
    cursor: CachePadded<AtomicU64>,
    /// Next ticket for the ticket strategy
    next: CachePadded<AtomicU64>,
    /// Read-once shared cursor
    read_cursor: CachePadded<AtomicU64>,
    /// Bumped after every publish when readers block
    seq: CachePadded<WaitWord>,

    /// Holds the writer lock word, if any, on its own line
    write: CachePadded<WriteStrategy>,
    /// Holds the read-once lock word, if any, on its own line
    delivery: CachePadded<Delivery>,

    slots: Slots,
    flags: QueueFlags,
    read_wait: ReadWait,
    wake: WakePolicy,
}

impl RingBuffer {
    /// Create a ring buffer with default locking and wait backend
    ///
    /// `capacity` is rounded up to a power of two; zero is rejected.
    pub fn new(capacity: usize, flags: QueueFlags) -> QueueResult<Self> {
        Self::with_config(QueueConfig::new(capacity).flags(flags))
    }

    pub fn with_config(config: QueueConfig) -> QueueResult<Self> {
        let capacity = round_capacity(config.capacity)?;
        let slots = Slots::allocate(capacity)?;
        let flags = config.flags;

        let write = if flags.single_writer() {
            WriteStrategy::Unsynchronized
        } else if flags.busy_loop() {
            WriteStrategy::Ticket
        } else {
            WriteStrategy::Locked(CursorLock::new(config.lock, &config.sync))
        };

        let delivery = if !flags.read_once() {
            Delivery::Broadcast
        } else if flags.single_reader() {
            Delivery::ReadOnce(CursorLock::Unsynchronized)
        } else {
            Delivery::ReadOnce(CursorLock::new(config.lock, &config.sync))
        };

        let read_wait = if flags.busy_loop() {
            ReadWait::BusyLoop
        } else {
            ReadWait::Block
        };

        // Read-once readers wait one at a time behind the read lock
        let wake = if flags.busy_loop() {
            WakePolicy::Silent
        } else if flags.single_reader() || flags.read_once() {
            WakePolicy::One
        } else {
            WakePolicy::All
        };

        let ring = Self {
            cursor: CachePadded::new(AtomicU64::new(0)),
            next: CachePadded::new(AtomicU64::new(0)),
            read_cursor: CachePadded::new(AtomicU64::new(0)),
            seq: CachePadded::new(WaitWord::new(0, &config.sync)),
            write: CachePadded::new(write),
            delivery: CachePadded::new(delivery),
            slots,
            flags,
            read_wait,
            wake,
        };

        debug!(
            requested = config.capacity,
            capacity,
            flags = ?flags,
            strategies = ?ring.strategies(),
            "Ring buffer initialized"
        );

        Ok(ring)
    }

    /// Publish `handle`; never blocks, never fails
    ///
    /// If writers are more than `capacity` slots ahead of a reader, the
    /// oldest unread slot is overwritten silently.
    #[inline]
    pub fn write(&self, handle: Handle) {
        match &*self.write {
            WriteStrategy::Locked(lock) => {
                let _guard = lock.lock();
                let cursor = self.cursor.load(Ordering::Relaxed);
                self.slots.store(cursor, handle);
                self.cursor.store(cursor + 1, Ordering::Release);
            }
            WriteStrategy::Unsynchronized => {
                let cursor = self.cursor.load(Ordering::Relaxed);
                self.slots.store(cursor, handle);
                self.cursor.store(cursor + 1, Ordering::Release);
            }
            WriteStrategy::Ticket => {
                // Reservation is wait-free; the store may land out of order
                let ticket = self.next.fetch_add(1, Ordering::Relaxed);
                self.slots.store(ticket, handle);

                // Publication is strictly in ticket order
                let backoff = Backoff::new();
                while self
                    .cursor
                    .compare_exchange_weak(ticket, ticket + 1, Ordering::AcqRel, Ordering::Relaxed)
                    .is_err()
                {
                    backoff.snooze();
                }
            }
        }

        self.wake.publish(&self.seq);
    }

    /// Read the item at `idx`, waiting until it has been published
    ///
    /// In broadcast mode `idx` is the caller's private cursor. If the caller
    /// fell `capacity` or more items behind, the slot holds a newer payload
    /// and that is what is returned. In read-once mode `idx` is ignored.
    pub fn read(&self, idx: u64) -> Handle {
        match self.read_inner(idx, None) {
            Ok(handle) => handle,
            // Untimed waits cannot time out
            Err(_) => Handle::null(),
        }
    }

    /// [`RingBuffer::read`] with a bound on how long to wait for data
    ///
    /// In read-once mode the deadline also covers waiting for another reader
    /// to release the read lock.
    pub fn read_timeout(&self, idx: u64, timeout: Duration) -> QueueResult<Handle> {
        self.read_inner(idx, Some(timeout)).map_err(|err| {
            trace!(idx, ?timeout, "Ring buffer read timed out");
            err
        })
    }

    /// Non-blocking read; `None` if nothing is published at `idx` yet
    pub fn try_read(&self, idx: u64) -> Option<Handle> {
        match &*self.delivery {
            Delivery::Broadcast => {
                if self.cursor.load(Ordering::Acquire) > idx {
                    Some(self.slots.load(idx))
                } else {
                    None
                }
            }
            Delivery::ReadOnce(lock) => {
                let _guard = lock.lock();
                let read = self.read_cursor.load(Ordering::Relaxed);
                if self.cursor.load(Ordering::Acquire) > read {
                    Some(self.take(read))
                } else {
                    None
                }
            }
        }
    }

    fn read_inner(&self, idx: u64, timeout: Option<Duration>) -> QueueResult<Handle> {
        let deadline = timeout.map(|t| Instant::now() + t);
        match &*self.delivery {
            Delivery::Broadcast => {
                self.read_wait
                    .wait_while(&self.seq, timeout, || {
                        self.cursor.load(Ordering::Acquire) <= idx
                    })
                    .map_err(|_| QueueError::Timeout)?;
                Ok(self.slots.load(idx))
            }
            Delivery::ReadOnce(lock) => {
                let _guard = match deadline {
                    Some(deadline) => lock.lock_until(deadline).ok_or(QueueError::Timeout)?,
                    None => lock.lock(),
                };
                let read = self.read_cursor.load(Ordering::Relaxed);
                let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
                self.read_wait
                    .wait_while(&self.seq, remaining, || {
                        self.cursor.load(Ordering::Acquire) <= read
                    })
                    .map_err(|_| QueueError::Timeout)?;
                Ok(self.take(read))
            }
        }
    }

    /// Consume the read-once slot at `read`; caller holds the read lock
    #[inline]
    fn take(&self, read: u64) -> Handle {
        let handle = self.slots.load(read);
        self.read_cursor.store(read + 1, Ordering::Release);
        handle
    }

    /// Start a broadcast subscription at the current write cursor
    pub fn subscribe(&self) -> Subscriber<'_> {
        Subscriber {
            ring: self,
            next: self.cursor(),
        }
    }

    /// Start a broadcast subscription at an explicit index
    pub fn subscribe_from(&self, idx: u64) -> Subscriber<'_> {
        Subscriber {
            ring: self,
            next: idx,
        }
    }

    /// Published write cursor (number of items ever written)
    #[inline]
    pub fn cursor(&self) -> u64 {
        self.cursor.load(Ordering::Acquire)
    }

    /// Rounded capacity
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    #[inline]
    pub fn flags(&self) -> QueueFlags {
        self.flags
    }

    /// Wake blocked readers without publishing anything
    ///
    /// Woken readers re-check the cursor and go back to sleep if it has not
    /// moved.
    pub fn wake_readers(&self) {
        self.seq.wake_all();
    }

    pub fn strategies(&self) -> StrategyInfo {
        StrategyInfo {
            write: self.write.name(),
            read: match *self.delivery {
                Delivery::Broadcast => self.read_wait.name(),
                Delivery::ReadOnce(_) => "read_once",
            },
            wake: self.wake.name(),
            backend: self.seq.backend_name(),
        }
    }
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("cursor", &self.cursor())
            .field("flags", &self.flags)
            .finish()
    }
}

/// A broadcast reader's private cursor
pub struct Subscriber<'a> {
    ring: &'a RingBuffer,
    next: u64,
}

impl Subscriber<'_> {
    /// Wait for and return the next item
    pub fn next(&mut self) -> Handle {
        let handle = self.ring.read(self.next);
        self.next += 1;
        handle
    }

    pub fn next_timeout(&mut self, timeout: Duration) -> QueueResult<Handle> {
        let handle = self.ring.read_timeout(self.next, timeout)?;
        self.next += 1;
        Ok(handle)
    }

    pub fn try_next(&mut self) -> Option<Handle> {
        let handle = self.ring.try_read(self.next)?;
        self.next += 1;
        Some(handle)
    }

    /// Index the next read will use
    #[inline]
    pub fn position(&self) -> u64 {
        self.next
    }

    /// Items published but not yet read by this subscriber
    #[inline]
    pub fn pending(&self) -> u64 {
        self.ring.cursor().saturating_sub(self.next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::limits::CACHE_LINE_SIZE;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::thread;

    fn token(i: u64) -> Handle {
        Handle::from_token(i as usize + 1)
    }

    #[test]
    fn test_capacity_rounding() {
        let ring = RingBuffer::new(5, QueueFlags::empty()).unwrap();
        assert_eq!(ring.capacity(), 8);
        assert!(matches!(
            RingBuffer::new(0, QueueFlags::empty()),
            Err(QueueError::InvalidParam(_))
        ));
    }

    #[test]
    fn test_hot_fields_on_separate_lines() {
        assert!(std::mem::align_of::<CachePadded<AtomicU64>>() >= CACHE_LINE_SIZE);
    }

    #[test]
    fn test_write_then_read_in_order() {
        let ring = RingBuffer::new(8, QueueFlags::SINGLE_WRITER).unwrap();
        for i in 0..5 {
            ring.write(token(i));
        }
        assert_eq!(ring.cursor(), 5);
        for i in 0..5 {
            assert_eq!(ring.read(i), token(i));
        }
    }

    #[test]
    fn test_try_read_unpublished() {
        let ring = RingBuffer::new(4, QueueFlags::empty()).unwrap();
        assert_eq!(ring.try_read(0), None);
        ring.write(token(0));
        assert_eq!(ring.try_read(0), Some(token(0)));
        assert_eq!(ring.try_read(1), None);
    }

    #[test]
    fn test_overwrite_keeps_newest() {
        let ring = RingBuffer::new(4, QueueFlags::empty()).unwrap();
        for i in 0..6 {
            ring.write(token(i));
        }
        // Items 2..6 survive; 0 and 1 were overwritten by 4 and 5
        for i in 2..6 {
            assert_eq!(ring.read(i), token(i));
        }
        assert_eq!(ring.read(0), token(4));
        assert_eq!(ring.read(1), token(5));
    }

    #[test]
    fn test_lapped_read_once_repeats_handles() {
        let ring = RingBuffer::new(4, QueueFlags::READ_ONCE).unwrap();
        for i in 0..6 {
            ring.write(token(i));
        }

        // The shared cursor trails by six; slots 0 and 1 now hold 4 and 5
        let read: Vec<_> = (0..6).map(|_| ring.read(0)).collect();
        assert_eq!(
            read,
            vec![token(4), token(5), token(2), token(3), token(4), token(5)]
        );
    }

    #[test]
    fn test_lock_words_on_own_lines() {
        assert!(std::mem::align_of::<CachePadded<Delivery>>() >= CACHE_LINE_SIZE);
        assert!(std::mem::align_of::<CachePadded<WriteStrategy>>() >= CACHE_LINE_SIZE);
    }

    #[test]
    fn test_read_once_timeout_behind_blocked_reader() {
        let ring = Arc::new(RingBuffer::new(4, QueueFlags::READ_ONCE).unwrap());
        let ring_clone = ring.clone();
        let blocked = thread::spawn(move || ring_clone.read(0));

        thread::sleep(Duration::from_millis(30));

        let start = Instant::now();
        assert_eq!(
            ring.read_timeout(0, Duration::from_millis(40)),
            Err(QueueError::Timeout)
        );
        assert!(start.elapsed() < Duration::from_secs(2));

        ring.write(token(3));
        assert_eq!(blocked.join().unwrap(), token(3));
    }

    #[test]
    fn test_read_timeout_on_empty() {
        let ring = RingBuffer::new(4, QueueFlags::empty()).unwrap();
        let result = ring.read_timeout(0, Duration::from_millis(30));
        assert_eq!(result, Err(QueueError::Timeout));
    }

    #[test]
    fn test_blocked_reader_woken_by_write() {
        let ring = Arc::new(RingBuffer::new(4, QueueFlags::empty()).unwrap());
        let ring_clone = ring.clone();

        let handle = thread::spawn(move || ring_clone.read(0));

        thread::sleep(Duration::from_millis(50));
        ring.write(token(7));

        assert_eq!(handle.join().unwrap(), token(7));
    }

    #[test]
    fn test_read_once_delivers_each_item_once() {
        let ring = RingBuffer::new(8, QueueFlags::READ_ONCE).unwrap();
        for i in 0..3 {
            ring.write(token(i));
        }
        // Index is ignored in read-once mode
        assert_eq!(ring.read(99), token(0));
        assert_eq!(ring.read(99), token(1));
        assert_eq!(ring.try_read(0), Some(token(2)));
        assert_eq!(ring.try_read(0), None);
    }

    #[test]
    fn test_strategy_selection() {
        let locked = RingBuffer::new(4, QueueFlags::empty()).unwrap();
        assert_eq!(locked.strategies().write, "lock");
        assert_eq!(locked.strategies().wake, "wake_all");

        let single =
            RingBuffer::new(4, QueueFlags::SINGLE_WRITER | QueueFlags::SINGLE_READER).unwrap();
        assert_eq!(single.strategies().write, "single_writer");
        assert_eq!(single.strategies().wake, "wake_one");

        let busy = RingBuffer::new(4, QueueFlags::BUSY_LOOP).unwrap();
        assert_eq!(busy.strategies().write, "ticket");
        assert_eq!(busy.strategies().read, "busy_loop");
        assert_eq!(busy.strategies().wake, "none");

        let once = RingBuffer::new(4, QueueFlags::READ_ONCE).unwrap();
        assert_eq!(once.strategies().read, "read_once");
    }

    #[test]
    fn test_subscriber_tracks_position() {
        let ring = RingBuffer::new(8, QueueFlags::empty()).unwrap();
        ring.write(token(0));

        let mut sub = ring.subscribe();
        assert_eq!(sub.position(), 1);
        assert_eq!(sub.try_next(), None);

        ring.write(token(1));
        ring.write(token(2));
        assert_eq!(sub.pending(), 2);
        assert_eq!(sub.next(), token(1));
        assert_eq!(sub.next_timeout(Duration::from_secs(1)), Ok(token(2)));
        assert_eq!(sub.pending(), 0);
    }
}
