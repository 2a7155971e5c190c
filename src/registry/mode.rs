//! Pool modes and object kinds
//!
//! An [`ObjectKind`] describes how to build and reset one named pooled
//! value. A [`PoolMode`] is whatever backs that name: the generic
//! [`DefaultMode`] free-list, or a custom mode the kind supplies in `init`.

use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Take/give capability backing one object kind
pub trait PoolMode<H, V>: Send + Sync {
    /// Get a value, building a fresh one on a miss
    fn take(&self, hint: H) -> V;

    /// Hand a value back. The caller must not touch it afterwards.
    fn give(&self, value: V);
}

/// A named, pluggable description of a pooled value.
///
/// Kinds sharing a registry are keyed by [`name`](Self::name), so the name
/// must be stable and unique per hint/value type pair.
pub trait ObjectKind: Clone + Send + Sync + 'static {
    /// Sizing hint passed through to `take`/`new_value`
    type Hint: 'static;
    /// The pooled value
    type Value: Send + 'static;

    fn name(&self) -> &str;

    /// Custom pool mode; `None` selects [`DefaultMode`]
    fn init(&self) -> Option<Arc<dyn PoolMode<Self::Hint, Self::Value>>> {
        None
    }

    /// Build a fresh value on a pool miss
    fn new_value(&self, hint: Self::Hint) -> Self::Value;

    /// Clear user-visible state before the value is pooled again
    fn reset(&self, value: &mut Self::Value);
}

/// Generic free-list pool driven by the kind's `new_value`/`reset`
pub struct DefaultMode<K: ObjectKind> {
    kind: K,
    free: ArrayQueue<K::Value>,

    // Metrics
    hits: AtomicUsize,
    misses: AtomicUsize,
    returns: AtomicUsize,
    drops: AtomicUsize,
}

impl<K: ObjectKind> DefaultMode<K> {
    /// Create a mode keeping at most `capacity` idle values
    pub fn new(kind: K, capacity: usize) -> Self {
        Self {
            kind,
            free: ArrayQueue::new(capacity.max(1)),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            returns: AtomicUsize::new(0),
            drops: AtomicUsize::new(0),
        }
    }

    /// Idle values ready for reuse
    pub fn idle(&self) -> usize {
        self.free.len()
    }

    /// Get mode statistics
    pub fn stats(&self) -> ModeStats {
        ModeStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            returns: self.returns.load(Ordering::Relaxed),
            drops: self.drops.load(Ordering::Relaxed),
        }
    }
}

impl<K: ObjectKind> PoolMode<K::Hint, K::Value> for DefaultMode<K> {
    fn take(&self, hint: K::Hint) -> K::Value {
        match self.free.pop() {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                value
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                self.kind.new_value(hint)
            }
        }
    }

    fn give(&self, mut value: K::Value) {
        self.kind.reset(&mut value);
        if self.free.push(value).is_ok() {
            self.returns.fetch_add(1, Ordering::Relaxed);
        } else {
            self.drops.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Default mode statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeStats {
    pub hits: usize,
    pub misses: usize,
    pub returns: usize,
    pub drops: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Scratch;

    impl ObjectKind for Scratch {
        type Hint = usize;
        type Value = Vec<u32>;

        fn name(&self) -> &str {
            "scratch"
        }

        fn new_value(&self, hint: usize) -> Vec<u32> {
            Vec::with_capacity(hint)
        }

        fn reset(&self, value: &mut Vec<u32>) {
            value.clear();
        }
    }

    #[test]
    fn test_default_mode_resets_and_reuses() {
        let mode = DefaultMode::new(Scratch, 4);

        let mut v = mode.take(16);
        v.extend([1, 2, 3]);
        mode.give(v);
        assert_eq!(mode.idle(), 1);

        let v = mode.take(0);
        assert!(v.is_empty());
        assert!(v.capacity() >= 16);

        let stats = mode.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.returns, 1);
    }

    #[test]
    fn test_default_mode_drops_when_full() {
        let mode = DefaultMode::new(Scratch, 1);
        mode.give(vec![1]);
        mode.give(vec![2]);

        assert_eq!(mode.idle(), 1);
        assert_eq!(mode.stats().drops, 1);
    }
}
