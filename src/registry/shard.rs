//! Sharded name → pool mode registry
//!
//! Each shard maps kind names to their resolved pool mode behind its own
//! lock. Contexts are spread across shards by a rotating counter, so no
//! single lock sees every request.

use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::mode::{DefaultMode, ObjectKind, PoolMode};
use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::pool::ByteKind;

/// Upper bound on shard count regardless of available parallelism
pub const MAX_SHARDS: usize = 64;

/// Type-erased registry entry, tagged with the kind that created it
struct ModeSlot<H, V> {
    kind: TypeId,
    mode: Arc<dyn PoolMode<H, V>>,
}

/// One independently locked partition of the registry
pub struct Shard {
    index: usize,
    object_capacity: usize,
    modes: RwLock<HashMap<String, Box<dyn Any + Send + Sync>>>,
}

impl Shard {
    fn new(index: usize, object_capacity: usize) -> Self {
        Self {
            index,
            object_capacity,
            modes: RwLock::new(HashMap::new()),
        }
    }

    /// Position of this shard in its registry
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of kinds resolved in this shard so far
    pub fn len(&self) -> usize {
        self.modes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve the pool mode for `kind`, creating it on first use.
    ///
    /// The first caller for a name decides the mode: `kind.init()` if it
    /// supplies one, a [`DefaultMode`] otherwise. Later callers share it.
    /// A name is owned by one kind type; any other type asking for it gets
    /// [`PoolError::KindConflict`].
    pub fn get_pool<K: ObjectKind>(&self, kind: &K) -> Result<Arc<dyn PoolMode<K::Hint, K::Value>>> {
        if let Some(slot) = self.modes.read().get(kind.name()) {
            return downcast::<K>(kind.name(), &**slot);
        }

        // Built unlocked so `init` may resolve other kinds on this shard.
        // If another caller wins the race this mode is dropped unused.
        let custom = kind.init();

        let mut modes = self.modes.write();
        let slot = modes.entry(kind.name().to_owned()).or_insert_with(|| {
            debug!(
                shard = self.index,
                kind = kind.name(),
                custom = custom.is_some(),
                "Resolved pool mode"
            );
            let mode: Arc<dyn PoolMode<K::Hint, K::Value>> = match custom {
                Some(mode) => mode,
                None => Arc::new(DefaultMode::new(kind.clone(), self.object_capacity)),
            };
            Box::new(ModeSlot {
                kind: TypeId::of::<K>(),
                mode,
            }) as Box<dyn Any + Send + Sync>
        });
        downcast::<K>(kind.name(), &**slot)
    }
}

fn downcast<K: ObjectKind>(
    name: &str,
    slot: &(dyn Any + Send + Sync),
) -> Result<Arc<dyn PoolMode<K::Hint, K::Value>>> {
    slot.downcast_ref::<ModeSlot<K::Hint, K::Value>>()
        .filter(|slot| slot.kind == TypeId::of::<K>())
        .map(|slot| slot.mode.clone())
        .ok_or_else(|| PoolError::KindConflict {
            name: name.to_owned(),
        })
}

/// Fixed set of shards plus the rotating counter that assigns them
pub struct ShardRegistry {
    shards: Box<[Arc<Shard>]>,
    next: AtomicUsize,
    bytes: ByteKind,
}

impl ShardRegistry {
    /// Create a registry sized from configuration
    pub fn new(config: &PoolConfig) -> Arc<Self> {
        let count = config.effective_shards();
        let shards: Vec<Arc<Shard>> = (0..count)
            .map(|index| Arc::new(Shard::new(index, config.object_capacity)))
            .collect();

        debug!(shards = count, "Created pool registry");

        Arc::new(Self {
            shards: shards.into_boxed_slice(),
            next: AtomicUsize::new(0),
            bytes: ByteKind::new(config.slab.clone()),
        })
    }

    /// Create a registry with default settings and `shards` shards
    pub fn with_shards(shards: usize) -> Arc<Self> {
        Self::new(&PoolConfig {
            shards,
            ..PoolConfig::default()
        })
    }

    /// Get total shard count
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Get a shard by index
    pub fn shard(&self, index: usize) -> Option<&Arc<Shard>> {
        self.shards.get(index)
    }

    /// Hand out the next shard in rotation
    pub fn next_shard(&self) -> Arc<Shard> {
        let i = self.next.fetch_add(1, Ordering::Relaxed) % self.shards.len();
        self.shards[i].clone()
    }

    /// Byte kind configured for this registry's slabs
    pub fn byte_kind(&self) -> &ByteKind {
        &self.bytes
    }

    /// Resolve `kind` in every shard up front, surfacing name conflicts
    /// before any request runs.
    pub fn preload<K: ObjectKind>(&self, kind: &K) -> Result<()> {
        for shard in self.shards.iter() {
            shard.get_pool(kind)?;
        }
        Ok(())
    }
}
