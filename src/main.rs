/*!
 * AI-OS Sync - Demo Entry Point
 *
 * Drives both queues under real threads:
 * - P producers / C consumers over a backpressured channel, terminated by
 *   null sentinels
 * - one writer / C subscribers over a broadcast ring buffer
 *
 * Environment variables (all optional):
 * - AI_OS_SYNC_PRODUCERS (default 4)
 * - AI_OS_SYNC_CONSUMERS (default 4)
 * - AI_OS_SYNC_ITEMS     per producer (default 100000)
 * - AI_OS_SYNC_CAPACITY  (default 1024)
 */

use ai_os_sync::monitoring::OperationSpan;
use ai_os_sync::{init_tracing, Channel, Handle, QueueError, QueueFlags, RingBuffer};
use std::error::Error;
use std::str::FromStr;
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %raw, "Ignoring unparsable setting");
            default
        }),
        Err(_) => default,
    }
}

/// Write, yielding while the channel pushes back
fn write_blocking(channel: &Channel, handle: Handle) {
    while let Err(QueueError::Full) = channel.write(handle) {
        thread::yield_now();
    }
}

fn run_channel(
    producers: usize,
    consumers: usize,
    items: usize,
    capacity: usize,
) -> Result<(), Box<dyn Error>> {
    let _span = OperationSpan::new("channel");
    let channel = Arc::new(Channel::new(capacity, QueueFlags::empty())?);
    info!(strategies = ?channel.strategies(), "Channel ready");

    let producer_handles: Vec<_> = (0..producers)
        .map(|p| {
            let channel = channel.clone();
            thread::spawn(move || {
                for i in 0..items {
                    // Tokens start at 1 so null stays the sentinel
                    write_blocking(&channel, Handle::from_token(p * items + i + 1));
                }
            })
        })
        .collect();

    let consumer_handles: Vec<_> = (0..consumers)
        .map(|_| {
            let channel = channel.clone();
            thread::spawn(move || {
                let mut received = 0usize;
                let mut checksum = 0usize;
                loop {
                    let handle = channel.read();
                    if handle.is_null() {
                        break;
                    }
                    received += 1;
                    checksum = checksum.wrapping_add(handle.token());
                }
                (received, checksum)
            })
        })
        .collect();

    for handle in producer_handles {
        handle.join().map_err(|_| "producer thread panicked")?;
    }
    for _ in 0..consumers {
        write_blocking(&channel, Handle::null());
    }

    let mut received = 0usize;
    let mut checksum = 0usize;
    for handle in consumer_handles {
        let (count, sum) = handle.join().map_err(|_| "consumer thread panicked")?;
        received += count;
        checksum = checksum.wrapping_add(sum);
    }

    let sent = producers * items;
    let expected_checksum = (1..=sent).fold(0usize, |acc, t| acc.wrapping_add(t));
    info!(
        sent,
        received,
        conserved = sent == received && checksum == expected_checksum,
        "Channel run complete"
    );
    Ok(())
}

fn run_ring(subscribers: usize, items: usize, capacity: usize) -> Result<(), Box<dyn Error>> {
    let _span = OperationSpan::new("ring");
    let ring = Arc::new(RingBuffer::new(capacity, QueueFlags::SINGLE_WRITER)?);
    info!(strategies = ?ring.strategies(), "Ring buffer ready");

    let reader_handles: Vec<_> = (0..subscribers)
        .map(|_| {
            let ring = ring.clone();
            thread::spawn(move || {
                let mut sub = ring.subscribe_from(0);
                let mut in_order = 0usize;
                let mut last = 0usize;
                loop {
                    let handle = sub.next();
                    if handle.is_null() {
                        break;
                    }
                    // Items we fell behind on come back as newer tokens
                    if handle.token() == last + 1 {
                        in_order += 1;
                    }
                    last = handle.token();
                }
                in_order
            })
        })
        .collect();

    for i in 0..items {
        ring.write(Handle::from_token(i + 1));
    }
    ring.write(Handle::null());

    for (id, handle) in reader_handles.into_iter().enumerate() {
        let in_order = handle.join().map_err(|_| "subscriber thread panicked")?;
        info!(subscriber = id, in_order, written = items, "Subscriber finished");
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let producers = env_or("AI_OS_SYNC_PRODUCERS", 4usize).max(1);
    let consumers = env_or("AI_OS_SYNC_CONSUMERS", 4usize).max(1);
    let items = env_or("AI_OS_SYNC_ITEMS", 100_000usize);
    let capacity = env_or("AI_OS_SYNC_CAPACITY", 1024usize);

    info!(producers, consumers, items, capacity, "AI-OS sync demo starting");

    run_channel(producers, consumers, items, capacity)?;
    run_ring(consumers, items, capacity)?;

    info!("Demo complete");
    Ok(())
}
