/*!
 * System Limits and Constants
 *
 * Centralized location for queue and synchronization thresholds.
 *
 * ## Design Philosophy
 * - Performance-critical constants are marked with [PERF]
 * - Values are grouped by domain (capacity, spinning, waiting)
 */

use std::time::Duration;

// =============================================================================
// QUEUE CAPACITY
// =============================================================================

/// Largest capacity a queue may round up to (2^31 slots)
/// Keeps the slot mask and cursor arithmetic well inside u64
pub const MAX_QUEUE_CAPACITY: usize = 1 << 31;

/// Smallest rounded channel capacity
/// One slot is always reserved as the empty/full sentinel
pub const MIN_CHANNEL_CAPACITY: usize = 2;

/// Assumed cache line size in bytes
/// [PERF] Matches crossbeam's CachePadded on x86_64 and most aarch64 parts
pub const CACHE_LINE_SIZE: usize = 64;

// =============================================================================
// SPINNING
// =============================================================================

/// Default cap on spin iterations before a blocking strategy parks
pub const DEFAULT_MAX_SPINS: u32 = 100;

/// Default spin window before a blocking strategy parks
pub const DEFAULT_SPIN_DURATION: Duration = Duration::from_micros(10);

// =============================================================================
// WAITING
// =============================================================================

/// Token handed to parked threads; unused beyond identifying the parker
pub const PARK_TOKEN: usize = 0;
