/*!
 * Bounded In-Process Queues
 *
 * Two pointer-passing queues over a fixed power-of-two slot array:
 * - `RingBuffer`: lossy broadcast, writes never fail, newest data wins
 * - `Channel`: lossless FIFO with backpressure, writes fail when full
 *
 * Both pick their write, read, and wake strategies once from `QueueFlags`
 * and never switch afterwards. Neither owns the payloads it carries; see
 * [`Handle`] for the ownership contract.
 */

mod channel;
mod config;
mod flags;
mod handle;
mod ring;
mod slots;
mod strategy;

pub use channel::Channel;
pub use config::QueueConfig;
pub use flags::QueueFlags;
pub use handle::Handle;
pub use ring::{RingBuffer, Subscriber};
pub use slots::round_capacity;
pub use strategy::StrategyInfo;
