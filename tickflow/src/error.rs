//! Error types for generator construction.

use chrono::Duration;
use thiserror::Error;

/// Errors surfaced when building a trigger generator.
///
/// All variants are construction-time contract violations; nothing in the
/// driving loop itself produces an error. A timed wait reaching its deadline
/// is the normal "fire now" signal, never a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickError {
    #[error("interval must be strictly positive, got {0:?}")]
    NonPositiveInterval(Duration),

    #[error("alignment must not be negative, got {0:?}")]
    NegativeAlignment(Duration),
}
