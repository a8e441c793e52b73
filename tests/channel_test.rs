/*!
 * Channel Tests
 * Backpressure, FIFO, conservation, and wake behavior of the bounded channel
 */

use ai_os_sync::core::sync::{LockKind, StrategyType, SyncConfig};
use ai_os_sync::queue::{Channel, Handle, QueueConfig, QueueFlags};
use ai_os_sync::QueueError;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn token(i: usize) -> Handle {
    Handle::from_token(i + 1)
}

fn write_retrying(channel: &Channel, handle: Handle) {
    while let Err(QueueError::Full) = channel.write(handle) {
        thread::yield_now();
    }
}

#[test]
fn test_power_of_two_rounding() {
    let channel = Channel::new(5, QueueFlags::empty()).unwrap();
    assert_eq!(channel.capacity(), 8);
    assert_eq!(channel.max_in_flight(), 7);

    assert!(matches!(
        Channel::new(0, QueueFlags::empty()),
        Err(QueueError::InvalidParam(_))
    ));
}

#[test]
fn test_backpressure_bound() {
    let channel = Channel::new(4, QueueFlags::empty()).unwrap();

    for i in 0..3 {
        assert_eq!(channel.write(token(i)), Ok(()));
    }
    assert_eq!(channel.write(token(3)), Err(QueueError::Full));
    // Rejection is not retried and leaves the channel untouched
    assert_eq!(channel.len(), 3);

    assert_eq!(channel.read(), token(0));
    assert_eq!(channel.write(token(3)), Ok(()));
}

#[test]
fn test_timed_read_on_never_written_channel() {
    let channel = Channel::new(8, QueueFlags::empty()).unwrap();
    let start = Instant::now();

    let result = channel.read_timeout(Duration::from_millis(50));

    assert_eq!(result, Err(QueueError::Timeout));
    assert!(start.elapsed() >= Duration::from_millis(50));
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
fn test_spurious_wake_does_not_return_stale_data() {
    let channel = Arc::new(Channel::new(4, QueueFlags::empty()).unwrap());
    let channel_clone = channel.clone();

    let reader = thread::spawn(move || channel_clone.read());

    // Wake the blocked reader with nothing published
    for _ in 0..5 {
        thread::sleep(Duration::from_millis(20));
        channel.wake_readers();
    }
    assert!(!reader.is_finished());

    channel.write(token(42)).unwrap();
    assert_eq!(reader.join().unwrap(), token(42));
}

#[test]
fn test_timed_read_not_starved_by_blocked_reader() {
    for lock in [LockKind::Mutex, LockKind::Spin, LockKind::Sync] {
        let channel = Arc::new(Channel::with_config(QueueConfig::new(4).lock(lock)).unwrap());
        let channel_clone = channel.clone();
        let blocked = thread::spawn(move || channel_clone.read());

        // Untimed reader now holds the read lock while the channel is empty
        thread::sleep(Duration::from_millis(30));

        let start = Instant::now();
        let result = channel.read_timeout(Duration::from_millis(50));
        let elapsed = start.elapsed();

        assert_eq!(result, Err(QueueError::Timeout), "{:?}", lock);
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_secs(2), "{:?} took {:?}", lock, elapsed);

        channel.write(Handle::null()).unwrap();
        assert!(blocked.join().unwrap().is_null());
    }
}

#[test]
fn test_single_writer_matches_locked_path() {
    fn run(flags: QueueFlags) -> Vec<Result<Option<Handle>, QueueError>> {
        let channel = Channel::new(8, flags).unwrap();
        let mut log = Vec::new();
        for round in 0..5 {
            for i in 0..(round + 5) {
                log.push(channel.write(token(round * 100 + i)).map(|_| None));
            }
            for _ in 0..(round + 2) {
                log.push(Ok(channel.try_read()));
            }
        }
        while let Some(handle) = channel.try_read() {
            log.push(Ok(Some(handle)));
        }
        log
    }

    let locked = run(QueueFlags::empty());
    assert_eq!(run(QueueFlags::SINGLE_WRITER), locked);
    assert_eq!(run(QueueFlags::SINGLE_WRITER | QueueFlags::SINGLE_READER), locked);
}

fn conservation(config: QueueConfig, producers: usize, consumers: usize, items: usize) {
    let channel = Arc::new(Channel::with_config(config).unwrap());

    let producer_handles: Vec<_> = (0..producers)
        .map(|p| {
            let channel = channel.clone();
            thread::spawn(move || {
                for i in 0..items {
                    write_retrying(&channel, token(p * items + i));
                }
            })
        })
        .collect();

    let consumer_handles: Vec<_> = (0..consumers)
        .map(|_| {
            let channel = channel.clone();
            thread::spawn(move || {
                let mut seen = Vec::new();
                loop {
                    let handle = channel.read();
                    if handle.is_null() {
                        return seen;
                    }
                    seen.push(handle.token());
                }
            })
        })
        .collect();

    for handle in producer_handles {
        handle.join().unwrap();
    }
    for _ in 0..consumers {
        write_retrying(&channel, Handle::null());
    }

    let mut all = HashSet::new();
    let mut total = 0;
    for handle in consumer_handles {
        let seen = handle.join().unwrap();
        total += seen.len();
        all.extend(seen);
    }

    // No loss, no duplication
    assert_eq!(total, producers * items);
    assert_eq!(all.len(), producers * items);
    assert!(channel.is_empty());
}

#[test]
fn test_mpmc_conservation_every_lock_kind() {
    for lock in [LockKind::Mutex, LockKind::Spin, LockKind::Sync, LockKind::Auto] {
        conservation(QueueConfig::new(16).lock(lock), 4, 3, 2_000);
    }
}

#[test]
fn test_mpmc_conservation_condvar_backend() {
    let config = QueueConfig::new(8).sync(SyncConfig::default().with_strategy(StrategyType::Condvar));
    conservation(config, 3, 3, 2_000);
}

#[test]
fn test_mpmc_conservation_busy_loop() {
    conservation(QueueConfig::new(32).flags(QueueFlags::BUSY_LOOP), 2, 2, 2_000);
}

#[test]
fn test_spsc_conservation_unsynchronized() {
    let flags = QueueFlags::SINGLE_WRITER | QueueFlags::SINGLE_READER;
    conservation(QueueConfig::new(4).flags(flags), 1, 1, 10_000);
}

#[test]
fn test_single_producer_order_seen_by_single_consumer() {
    let channel = Arc::new(Channel::new(8, QueueFlags::SINGLE_WRITER).unwrap());
    let channel_clone = channel.clone();

    let reader = thread::spawn(move || (0..5_000).map(|_| channel_clone.read()).collect::<Vec<_>>());

    for i in 0..5_000 {
        write_retrying(&channel, token(i));
    }

    let received = reader.join().unwrap();
    let expected: Vec<_> = (0..5_000).map(token).collect();
    assert_eq!(received, expected);
}

proptest! {
    #[test]
    fn prop_fifo_order(values in prop::collection::vec(1usize..1_000_000, 0..63)) {
        let channel = Channel::new(64, QueueFlags::empty()).unwrap();
        for v in &values {
            prop_assert_eq!(channel.write(Handle::from_token(*v)), Ok(()));
        }
        for v in &values {
            prop_assert_eq!(channel.read().token(), *v);
        }
        prop_assert!(channel.is_empty());
    }

    #[test]
    fn prop_capacity_rounds_up(requested in 2usize..100_000) {
        let channel = Channel::new(requested, QueueFlags::empty()).unwrap();
        prop_assert!(channel.capacity().is_power_of_two());
        prop_assert!(channel.capacity() >= requested);
        prop_assert!(channel.capacity() / 2 < requested);
    }
}
