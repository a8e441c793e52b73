/*!
 * Read/Wake Strategies
 *
 * The pieces both queues bind once from their flags. Each is a closed enum
 * dispatched by `match`; no strategy changes after construction.
 */

use crate::core::sync::{spin_while, WaitResult, WaitWord};
use std::time::Duration;

/// How a reader waits for data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadWait {
    /// Block on the queue's wait word
    Block,
    /// Spin with yields, never parking the thread
    BusyLoop,
}

impl ReadWait {
    #[inline]
    pub(crate) fn wait_while<F>(
        self,
        word: &WaitWord,
        timeout: Option<Duration>,
        blocked: F,
    ) -> WaitResult<()>
    where
        F: FnMut() -> bool,
    {
        match self {
            Self::Block => word.wait_while(timeout, blocked),
            Self::BusyLoop => spin_while(timeout, blocked),
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Block => "wait",
            Self::BusyLoop => "busy_loop",
        }
    }
}

/// What a writer does after publishing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WakePolicy {
    /// Readers spin; nobody to wake
    Silent,
    /// Exactly one reader can make progress
    One,
    /// Every reader may want the new item
    All,
}

impl WakePolicy {
    /// Move the wait word past any snapshot a reader holds, then wake
    #[inline]
    pub(crate) fn publish(self, word: &WaitWord) {
        match self {
            Self::Silent => {}
            Self::One => {
                word.fetch_add(1);
                word.wake_one();
            }
            Self::All => {
                word.fetch_add(1);
                word.wake_all();
            }
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Silent => "none",
            Self::One => "wake_one",
            Self::All => "wake_all",
        }
    }
}

/// Strategies bound to a queue instance, for logging and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyInfo {
    pub write: &'static str,
    pub read: &'static str,
    pub wake: &'static str,
    pub backend: &'static str,
}
