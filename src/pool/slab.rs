//! Size-classed byte slab
//!
//! Byte buffers are bucketed into power-of-two size classes. Each class keeps
//! a bounded lock-free free-list of buffers whose capacity is exactly the
//! class's canonical size. Anything else offered back is dropped.

use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::SlabConfig;
use crate::metrics::METRICS;

/// One size class
struct SizeClass {
    /// Canonical capacity of every pooled buffer in this class
    default_size: usize,
    free: ArrayQueue<Vec<u8>>,
}

/// Byte buffer pool keyed by power-of-two size classes.
///
/// Buffers handed out by [`take`](Self::take) have `len == capacity`, so the
/// whole canonical region is addressable. Contents of a reused buffer are
/// whatever its previous holder left behind.
pub struct SlabAllocator {
    min_shift: u32,
    min_size: usize,
    max_size: usize,
    classes: Box<[SizeClass]>,

    // Metrics
    fresh: AtomicUsize,
    reused: AtomicUsize,
    returned: AtomicUsize,
    discarded: AtomicUsize,
}

impl SlabAllocator {
    /// Create a slab covering `2^min_shift ..= 2^max_shift`
    pub fn new(config: &SlabConfig) -> Self {
        let min_shift = config.min_shift;
        let max_shift = config.max_shift.max(min_shift);
        let slot_capacity = config.slot_capacity.max(1);

        let classes: Vec<SizeClass> = (min_shift..=max_shift)
            .map(|shift| SizeClass {
                default_size: 1 << shift,
                free: ArrayQueue::new(slot_capacity),
            })
            .collect();

        Self {
            min_shift,
            min_size: 1 << min_shift,
            max_size: 1 << max_shift,
            classes: classes.into_boxed_slice(),
            fresh: AtomicUsize::new(0),
            reused: AtomicUsize::new(0),
            returned: AtomicUsize::new(0),
            discarded: AtomicUsize::new(0),
        }
    }

    /// Size class for `size`, or `None` above the largest pooled capacity.
    ///
    /// Exact powers of two map to their own class: `size - 1` is measured
    /// so 16 lands in the 16-byte class, not the 32-byte one.
    pub fn slot(&self, size: usize) -> Option<usize> {
        if size > self.max_size {
            return None;
        }
        if size <= self.min_size {
            return Some(0);
        }
        let shift = usize::BITS - (size - 1).leading_zeros();
        Some((shift - self.min_shift) as usize)
    }

    /// Canonical capacity of a size class
    pub fn slot_size(&self, slot: usize) -> Option<usize> {
        self.classes.get(slot).map(|class| class.default_size)
    }

    /// Number of size classes
    pub fn slot_count(&self) -> usize {
        self.classes.len()
    }

    /// Smallest pooled capacity
    pub fn min_size(&self) -> usize {
        self.min_size
    }

    /// Largest pooled capacity
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Buffers currently parked in a size class
    pub fn free_len(&self, slot: usize) -> usize {
        self.classes.get(slot).map_or(0, |class| class.free.len())
    }

    /// Get a buffer with capacity of at least `size`.
    ///
    /// A miss allocates the class's canonical size, never `size` itself, so
    /// every buffer in a class stays capacity-homogeneous. Oversized requests
    /// are allocated exactly and never pooled.
    pub fn take(&self, size: usize) -> Vec<u8> {
        let Some(class) = self.slot(size).and_then(|slot| self.classes.get(slot)) else {
            self.fresh.fetch_add(1, Ordering::Relaxed);
            METRICS.slab_fresh();
            return vec![0u8; size];
        };

        match class.free.pop() {
            Some(buf) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                METRICS.slab_reused();
                buf
            }
            None => {
                self.fresh.fetch_add(1, Ordering::Relaxed);
                METRICS.slab_fresh();
                vec![0u8; class.default_size]
            }
        }
    }

    /// Offer a buffer back to the slab.
    ///
    /// Only buffers whose capacity equals their class's canonical size are
    /// kept; oversized, off-size and overflow buffers are freed silently.
    pub fn give(&self, mut buf: Vec<u8>) {
        let size = buf.capacity();
        let class = match self.slot(size).and_then(|slot| self.classes.get(slot)) {
            Some(class) if class.default_size == size => class,
            _ => {
                self.discard();
                return;
            }
        };

        // Restore the full canonical length; never reallocates here.
        buf.resize(size, 0);
        if class.free.push(buf).is_ok() {
            self.returned.fetch_add(1, Ordering::Relaxed);
            METRICS.slab_returned();
        } else {
            self.discard();
        }
    }

    /// Take a buffer of the same capacity as `old` and copy its contents.
    ///
    /// Sized by capacity, not length, so a truncated buffer clones into its
    /// own size class.
    #[allow(clippy::ptr_arg)]
    pub fn clone_buf(&self, old: &Vec<u8>) -> Vec<u8> {
        let mut buf = self.take(old.capacity());
        buf[..old.len()].copy_from_slice(old);
        buf
    }

    /// Take a buffer of twice `old`'s capacity, copy the contents over and
    /// give `old` back.
    pub fn copy_grow(&self, old: Vec<u8>) -> Vec<u8> {
        let mut buf = self.take(old.capacity().saturating_mul(2));
        buf[..old.len()].copy_from_slice(&old);
        self.give(old);
        buf
    }

    fn discard(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
        METRICS.slab_discarded();
    }

    /// Get slab statistics
    pub fn stats(&self) -> SlabStats {
        SlabStats {
            fresh: self.fresh.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            returned: self.returned.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

impl Default for SlabAllocator {
    fn default() -> Self {
        Self::new(&SlabConfig::default())
    }
}

/// Slab statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlabStats {
    pub fresh: usize,
    pub reused: usize,
    pub returned: usize,
    pub discarded: usize,
}
