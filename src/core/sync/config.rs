/*!
 * Synchronization Configuration
 *
 * Runtime configuration for wait backend selection
 */

use crate::core::limits::{DEFAULT_MAX_SPINS, DEFAULT_SPIN_DURATION};
use std::time::Duration;

/// Strategy type selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyType {
    /// Address-keyed parking (native futex / WaitOnAddress platforms)
    Futex,
    /// Mutex + condition variable (portable fallback)
    Condvar,
    /// Adaptive spin before falling back to the condvar backend
    SpinWait,
    /// Auto-select based on platform capability
    Auto,
}

/// Whether this platform has a native futex-equivalent
///
/// Linux/Android expose `futex(2)`, Windows 8+ exposes
/// `WaitOnAddress`/`WakeByAddressSingle`.
#[inline]
pub const fn futex_available() -> bool {
    cfg!(any(target_os = "linux", target_os = "android", windows))
}

/// Synchronization configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Preferred strategy
    pub strategy: StrategyType,
    /// Spin duration before parking (for SpinWait) and busy-loop yield pacing
    pub spin_duration: Duration,
    /// Maximum spin iterations before giving up
    pub max_spins: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyType::Auto,
            spin_duration: DEFAULT_SPIN_DURATION,
            max_spins: DEFAULT_MAX_SPINS,
        }
    }
}

impl SyncConfig {
    /// Configuration optimized for low-latency (< 1ms wait expected)
    pub const fn low_latency() -> Self {
        Self {
            strategy: StrategyType::SpinWait,
            spin_duration: Duration::from_micros(50),
            max_spins: 500,
        }
    }

    /// Configuration optimized for long waits (> 1ms expected)
    pub const fn long_wait() -> Self {
        Self {
            strategy: StrategyType::Auto,
            spin_duration: Duration::from_micros(1),
            max_spins: 10,
        }
    }

    /// Force a specific strategy, keeping the spin parameters
    pub fn with_strategy(mut self, strategy: StrategyType) -> Self {
        self.strategy = strategy;
        self
    }

    /// Select best strategy for current platform
    pub fn select_strategy(&self) -> StrategyType {
        match self.strategy {
            StrategyType::Auto => {
                if futex_available() {
                    StrategyType::Futex
                } else {
                    StrategyType::Condvar
                }
            }
            other => other,
        }
    }
}
