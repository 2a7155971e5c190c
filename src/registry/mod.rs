//! Pool mode registry
//!
//! Pluggable object kinds resolved to pool modes in independently locked
//! shards.

mod mode;
mod shard;

pub use mode::{DefaultMode, ModeStats, ObjectKind, PoolMode};
pub use shard::{Shard, ShardRegistry, MAX_SHARDS};
