//! Byte buffers as a pooled object kind
//!
//! [`ByteKind`] plugs the size-classed slab into the registry, and
//! [`BytePool`] is a sub-lease handle an aggregate can keep to borrow many
//! scratch buffers and hand them all back at once.

use std::sync::Arc;

use super::slab::SlabAllocator;
use crate::config::SlabConfig;
use crate::registry::{ObjectKind, PoolMode};

/// Pool mode backed directly by a [`SlabAllocator`]; the hint is a byte length
pub struct SlabMode {
    slab: SlabAllocator,
}

impl SlabMode {
    pub fn new(slab: SlabAllocator) -> Self {
        Self { slab }
    }

    pub fn slab(&self) -> &SlabAllocator {
        &self.slab
    }
}

impl PoolMode<usize, Vec<u8>> for SlabMode {
    fn take(&self, hint: usize) -> Vec<u8> {
        self.slab.take(hint)
    }

    fn give(&self, value: Vec<u8>) {
        self.slab.give(value)
    }
}

/// Object kind for raw byte buffers; each shard gets its own slab
#[derive(Debug, Clone, Default)]
pub struct ByteKind {
    slab: SlabConfig,
}

impl ByteKind {
    pub const NAME: &'static str = "bytes";

    pub fn new(slab: SlabConfig) -> Self {
        Self { slab }
    }
}

impl ObjectKind for ByteKind {
    type Hint = usize;
    type Value = Vec<u8>;

    fn name(&self) -> &str {
        Self::NAME
    }

    fn init(&self) -> Option<Arc<dyn PoolMode<usize, Vec<u8>>>> {
        Some(Arc::new(SlabMode::new(SlabAllocator::new(&self.slab))))
    }

    fn new_value(&self, hint: usize) -> Vec<u8> {
        vec![0u8; hint]
    }

    fn reset(&self, _value: &mut Vec<u8>) {}
}

/// Remembers every byte buffer it hands out until [`give_all`](Self::give_all)
pub struct BytePool {
    pool: Arc<dyn PoolMode<usize, Vec<u8>>>,
    leases: Vec<Vec<u8>>,
}

impl BytePool {
    pub fn new(pool: Arc<dyn PoolMode<usize, Vec<u8>>>) -> Self {
        Self {
            pool,
            leases: Vec::new(),
        }
    }

    /// Borrow a buffer of at least `size` bytes for the life of this lease set
    pub fn take(&mut self, size: usize) -> &mut Vec<u8> {
        let buf = self.pool.take(size);
        self.leases.push(buf);
        let last = self.leases.len() - 1;
        &mut self.leases[last]
    }

    /// Number of outstanding buffers
    pub fn len(&self) -> usize {
        self.leases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leases.is_empty()
    }

    /// Return every outstanding buffer to the backing pool
    pub fn give_all(&mut self) -> usize {
        let count = self.leases.len();
        for buf in self.leases.drain(..) {
            self.pool.give(buf);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_kind_uses_slab_mode() {
        let mode = ByteKind::default().init().unwrap();
        let buf = mode.take(10);
        assert_eq!(buf.capacity(), 16);
    }

    #[test]
    fn test_byte_pool_returns_everything_once() {
        let mode = Arc::new(SlabMode::new(SlabAllocator::default()));
        let mut pool = BytePool::new(mode.clone());

        pool.take(8)[0] = 1;
        pool.take(100);
        assert_eq!(pool.len(), 2);

        assert_eq!(pool.give_all(), 2);
        assert_eq!(mode.slab().free_len(0), 1);
        assert_eq!(mode.slab().free_len(4), 1);

        // Second drain has nothing left to return
        assert_eq!(pool.give_all(), 0);
        assert_eq!(mode.slab().stats().returned, 2);
    }
}
