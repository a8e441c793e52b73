/*!
 * AI-OS Sync Library
 * Futex-backed wait words, locks, and bounded in-process queues
 */

pub mod core;
pub mod monitoring;
pub mod queue;

// Re-exports
pub use crate::core::errors::{QueueError, QueueResult};
pub use crate::core::sync::{LockKind, StrategyType, SyncConfig, WaitWord};
pub use monitoring::init_tracing;
pub use queue::{Channel, Handle, QueueConfig, QueueFlags, RingBuffer};
