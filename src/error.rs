//! Crate error type

use thiserror::Error;

/// Validation errors raised at setup time.
///
/// I/O failures never surface here: reads and writes degrade to empty
/// results and are reported through the logger's non-notifying path instead.
#[derive(Debug, Error)]
pub enum TintError {
    /// A history buffer was requested with a capacity of zero.
    #[error("history capacity must be a positive number")]
    InvalidCapacity,
}
