//! Error types for pool resolution

use thiserror::Error;

/// Convenience alias for pool results
pub type Result<T> = std::result::Result<T, PoolError>;

/// Errors raised while resolving pooled object kinds.
///
/// Taking and giving never fail on their own; a miss or an oversized request
/// falls back to a fresh allocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Two kinds with different hint/value types registered the same name
    #[error("object kind `{name}` is already registered with different hint or value types")]
    KindConflict { name: String },
}
