/*!
 * Ring Buffer Tests
 * Broadcast delivery, overwrite semantics, and multi-writer publication
 */

use ai_os_sync::core::sync::LockKind;
use ai_os_sync::queue::{Handle, QueueConfig, QueueFlags, RingBuffer};
use ai_os_sync::QueueError;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn token(i: u64) -> Handle {
    Handle::from_token(i as usize + 1)
}

#[test]
fn test_broadcast_every_subscriber_sees_every_item() {
    const ITEMS: u64 = 500;
    let ring = Arc::new(RingBuffer::new(1024, QueueFlags::SINGLE_WRITER).unwrap());

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let ring = ring.clone();
            thread::spawn(move || {
                let mut sub = ring.subscribe_from(0);
                (0..ITEMS).map(|_| sub.next()).collect::<Vec<_>>()
            })
        })
        .collect();

    for i in 0..ITEMS {
        ring.write(token(i));
    }

    let expected: Vec<_> = (0..ITEMS).map(token).collect();
    for reader in readers {
        assert_eq!(reader.join().unwrap(), expected);
    }
}

#[test]
fn test_ticket_writers_publish_every_item() {
    const WRITERS: u64 = 4;
    const PER_WRITER: u64 = 1_000;
    const TOTAL: u64 = WRITERS * PER_WRITER;
    let ring = Arc::new(RingBuffer::new(4096, QueueFlags::BUSY_LOOP).unwrap());
    assert_eq!(ring.strategies().write, "ticket");

    // Busy-loop subscriber reading while tickets are still being published
    let live = {
        let ring = ring.clone();
        thread::spawn(move || {
            let mut sub = ring.subscribe_from(0);
            (0..TOTAL).map(|_| sub.next().token()).collect::<Vec<_>>()
        })
    };

    let writers: Vec<_> = (0..WRITERS)
        .map(|w| {
            let ring = ring.clone();
            thread::spawn(move || {
                for i in 0..PER_WRITER {
                    ring.write(token(w * PER_WRITER + i));
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    assert_eq!(ring.cursor(), TOTAL);

    let items: Vec<usize> = (0..TOTAL).map(|i| ring.read(i).token()).collect();
    let unique: HashSet<_> = items.iter().copied().collect();
    assert_eq!(unique.len(), TOTAL as usize);

    // Published order is ticket order, so the live view matches the final one
    assert_eq!(live.join().unwrap(), items);

    // Each writer's items keep their program order
    for w in 0..WRITERS {
        let lo = (w * PER_WRITER + 1) as usize;
        let hi = lo + PER_WRITER as usize;
        let mine: Vec<_> = items.iter().copied().filter(|t| (lo..hi).contains(t)).collect();
        assert!(mine.windows(2).all(|pair| pair[0] < pair[1]));
    }
}

#[test]
fn test_locked_writers_publish_every_item() {
    for lock in [LockKind::Mutex, LockKind::Spin, LockKind::Sync] {
        let ring = Arc::new(RingBuffer::with_config(QueueConfig::new(2048).lock(lock)).unwrap());

        let writers: Vec<_> = (0..4u64)
            .map(|w| {
                let ring = ring.clone();
                thread::spawn(move || {
                    for i in 0..500 {
                        ring.write(token(w * 500 + i));
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(ring.cursor(), 2000);
        let unique: HashSet<_> = (0..2000).map(|i| ring.read(i).token()).collect();
        assert_eq!(unique.len(), 2000);
    }
}

#[test]
fn test_read_once_delivers_exactly_once_across_readers() {
    const ITEMS: u64 = 3_000;
    const READERS: usize = 4;
    let ring = Arc::new(RingBuffer::new(4096, QueueFlags::READ_ONCE).unwrap());

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let ring = ring.clone();
            thread::spawn(move || {
                let mut seen = Vec::new();
                loop {
                    let handle = ring.read(0);
                    if handle.is_null() {
                        return seen;
                    }
                    seen.push(handle.token());
                }
            })
        })
        .collect();

    for i in 0..ITEMS {
        ring.write(token(i));
    }
    for _ in 0..READERS {
        ring.write(Handle::null());
    }

    let mut all = HashSet::new();
    let mut total = 0;
    for reader in readers {
        let seen = reader.join().unwrap();
        total += seen.len();
        all.extend(seen);
    }
    assert_eq!(total, ITEMS as usize);
    assert_eq!(all.len(), ITEMS as usize);
}

#[test]
fn test_spurious_wake_does_not_return_unpublished_slot() {
    let ring = Arc::new(RingBuffer::new(4, QueueFlags::empty()).unwrap());
    let ring_clone = ring.clone();

    let reader = thread::spawn(move || ring_clone.read(0));

    for _ in 0..5 {
        thread::sleep(Duration::from_millis(20));
        ring.wake_readers();
    }
    assert!(!reader.is_finished());

    ring.write(token(11));
    assert_eq!(reader.join().unwrap(), token(11));
}

#[test]
fn test_busy_loop_read_timeout() {
    let ring = RingBuffer::new(4, QueueFlags::BUSY_LOOP).unwrap();
    let start = Instant::now();

    assert_eq!(
        ring.read_timeout(0, Duration::from_millis(40)),
        Err(QueueError::Timeout)
    );
    assert!(start.elapsed() >= Duration::from_millis(40));
}

#[test]
fn test_slow_subscriber_skips_to_newer_data() {
    let ring = RingBuffer::new(4, QueueFlags::SINGLE_WRITER).unwrap();
    let mut sub = ring.subscribe();

    for i in 0..10 {
        ring.write(token(i));
    }

    // Lapped twice: indices 0..6 now hold the last four items
    assert_eq!(sub.pending(), 10);
    assert_eq!(sub.next(), token(8));
    assert_eq!(sub.next(), token(9));
    assert_eq!(sub.next(), token(6));
}

proptest! {
    #[test]
    fn prop_newest_capacity_items_survive(requested in 1usize..64, writes in 0u64..300) {
        let ring = RingBuffer::new(requested, QueueFlags::empty()).unwrap();
        let capacity = ring.capacity() as u64;
        prop_assert!(capacity.is_power_of_two());
        prop_assert!(capacity >= requested as u64);

        for i in 0..writes {
            ring.write(token(i));
        }
        prop_assert_eq!(ring.cursor(), writes);

        for idx in writes.saturating_sub(capacity)..writes {
            prop_assert_eq!(ring.read(idx), token(idx));
        }
    }
}
