//! Request-scoped buffer context
//!
//! A [`BufferCtx`] is owned by the one handler processing a request. Every
//! value it hands out stays in its ledger until [`BufferCtx::give`] returns
//! the lot to their pools, or until the ledger moves to another context via
//! [`BufferCtx::transfer`] or [`BufferCtx::merge`].
//!
//! Values are lent out as `&mut` borrows of the ledger, so a handler cannot
//! keep using a value once the context has given it back.

use std::any::Any;
use std::sync::Arc;
use tracing::trace;

use crate::error::{PoolError, Result};
use crate::metrics::METRICS;
use crate::registry::{ObjectKind, PoolMode, Shard, ShardRegistry};

/// One borrowed value and the pool it goes back to
trait Lease: Send {
    fn name(&self) -> &str;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn give(self: Box<Self>);
}

struct Leased<K: ObjectKind> {
    kind: K,
    value: K::Value,
    pool: Arc<dyn PoolMode<K::Hint, K::Value>>,
}

impl<K: ObjectKind> Lease for Leased<K> {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn give(self: Box<Self>) {
        let Leased { value, pool, .. } = *self;
        pool.give(value);
    }
}

fn value_mut<'a, K: ObjectKind>(lease: &'a mut (dyn Lease + 'static), name: &str) -> Result<&'a mut K::Value> {
    lease
        .as_any_mut()
        .downcast_mut::<Leased<K>>()
        .map(|leased| &mut leased.value)
        .ok_or_else(|| PoolError::KindConflict {
            name: name.to_owned(),
        })
}

/// Ledger of everything one request has borrowed
pub struct BufferCtx {
    shard: Arc<Shard>,
    ledger: Vec<Box<dyn Lease>>,
}

impl BufferCtx {
    /// Create an empty context bound to the registry's next shard
    pub fn new(registry: &ShardRegistry) -> Self {
        METRICS.context_created();
        Self {
            shard: registry.next_shard(),
            ledger: Vec::new(),
        }
    }

    /// Shard this context resolves pools from
    pub fn shard(&self) -> &Arc<Shard> {
        &self.shard
    }

    /// Number of outstanding leases
    pub fn len(&self) -> usize {
        self.ledger.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledger.is_empty()
    }

    /// Get this request's value for `kind`, leasing one on first use.
    ///
    /// Repeated calls with the same kind name return the same value; the
    /// hint only matters for the first call.
    pub fn find<K: ObjectKind>(&mut self, kind: &K, hint: K::Hint) -> Result<&mut K::Value> {
        match self.ledger.iter().position(|lease| lease.name() == kind.name()) {
            Some(i) => value_mut::<K>(self.ledger[i].as_mut(), kind.name()),
            None => self.take(kind, hint),
        }
    }

    /// Lease a new value for `kind`, even if one is already held
    pub fn take<K: ObjectKind>(&mut self, kind: &K, hint: K::Hint) -> Result<&mut K::Value> {
        let pool = self.shard.get_pool(kind)?;
        let value = pool.take(hint);
        self.ledger.push(Box::new(Leased {
            kind: kind.clone(),
            value,
            pool,
        }));
        METRICS.lease_taken();

        let last = self.ledger.len() - 1;
        value_mut::<K>(self.ledger[last].as_mut(), kind.name())
    }

    /// Return every lease to its pool, oldest first.
    ///
    /// The ledger is empty afterwards, so calling this again returns nothing.
    pub fn give(&mut self) -> usize {
        let count = self.ledger.len();
        for lease in self.ledger.drain(..) {
            lease.give();
        }

        if count > 0 {
            METRICS.leases_returned(count as u64);
            trace!(shard = self.shard.index(), leases = count, "Drained buffer context");
        }
        count
    }

    /// Move the whole ledger into a new context on the same shard.
    ///
    /// `self` keeps no leases afterwards; the returned context owns them.
    pub fn transfer(&mut self) -> BufferCtx {
        let ledger = std::mem::take(&mut self.ledger);
        if !ledger.is_empty() {
            METRICS.leases_transferred(ledger.len() as u64);
            trace!(shard = self.shard.index(), leases = ledger.len(), "Transferred buffer context");
        }
        BufferCtx {
            shard: self.shard.clone(),
            ledger,
        }
    }

    /// Append `src`'s leases to this ledger, leaving `src` empty
    pub fn merge(&mut self, src: &mut BufferCtx) {
        if src.ledger.is_empty() {
            return;
        }
        METRICS.leases_transferred(src.ledger.len() as u64);
        trace!(
            shard = self.shard.index(),
            from_shard = src.shard.index(),
            leases = src.ledger.len(),
            "Merged buffer context"
        );
        self.ledger.append(&mut src.ledger);
    }
}

impl Drop for BufferCtx {
    fn drop(&mut self) {
        // Never given back; the values are freed instead of pooled.
        if !self.ledger.is_empty() {
            METRICS.leases_abandoned(self.ledger.len() as u64);
        }
    }
}

impl std::fmt::Debug for BufferCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.ledger.iter().map(|lease| lease.name()).collect();
        f.debug_struct("BufferCtx")
            .field("shard", &self.shard.index())
            .field("ledger", &names)
            .finish()
    }
}
