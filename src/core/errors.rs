/*!
 * Error Types
 * Queue error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by queue construction and the write/read hot paths
///
/// Spurious wakes are never reported here: every blocking path re-checks its
/// condition internally and goes back to sleep.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum QueueError {
    #[error("Invalid parameter: {0}")]
    #[diagnostic(
        code(queue::invalid_param),
        help("Capacity must be non-zero and round up to a representable power of two.")
    )]
    InvalidParam(String),

    #[error("Memory allocation failed: {0}")]
    #[diagnostic(
        code(queue::mem_alloc),
        help("The slot array could not be allocated. Request a smaller capacity.")
    )]
    MemAlloc(String),

    #[error("Queue full")]
    #[diagnostic(
        code(queue::full),
        help("Readers have not drained the channel. Retry later, drop, or apply backpressure.")
    )]
    Full,

    #[error("Read timed out")]
    #[diagnostic(
        code(queue::timeout),
        help("No data was published before the deadline. The queue state is unchanged.")
    )]
    Timeout,
}

impl QueueError {
    /// Whether the caller can reasonably retry the same operation later
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(self, QueueError::Full | QueueError::Timeout)
    }
}

/// Result type for queue operations
pub type QueueResult<T> = std::result::Result<T, QueueError>;
