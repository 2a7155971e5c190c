//! Request processing context
//!
//! Carries the request's identity and its attached [`BufferCtx`] through the
//! pipeline, and moves the ledger along when a request is forwarded or its
//! response path is joined back.

use tracing::debug;

use super::ledger::BufferCtx;
use crate::registry::ShardRegistry;

/// Unique request identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    /// Create from raw u64
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Get raw value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Per-request processing state
#[derive(Debug)]
pub struct RequestContext {
    id: RequestId,
    buffers: Option<BufferCtx>,
}

impl RequestContext {
    /// Create a context with no buffer context attached
    pub fn new(id: RequestId) -> Self {
        Self { id, buffers: None }
    }

    /// Create a context with a fresh buffer context attached
    pub fn with_buffers(id: RequestId, registry: &ShardRegistry) -> Self {
        Self {
            id,
            buffers: Some(BufferCtx::new(registry)),
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Attach a fresh buffer context, handing back any previous one
    pub fn attach_buffers(&mut self, registry: &ShardRegistry) -> Option<BufferCtx> {
        self.buffers.replace(BufferCtx::new(registry))
    }

    /// Attached buffer context, if any
    pub fn buffers(&mut self) -> Option<&mut BufferCtx> {
        self.buffers.as_mut()
    }

    /// Remove and return the attached buffer context
    pub fn detach_buffers(&mut self) -> Option<BufferCtx> {
        self.buffers.take()
    }

    /// Create a context for a forwarded copy of this request.
    ///
    /// The new context takes over every lease held here; this context keeps
    /// an empty buffer context on the same shard.
    pub fn forward(&mut self, id: RequestId) -> RequestContext {
        let buffers = self.buffers.as_mut().map(BufferCtx::transfer);
        debug!(
            request_id = %self.id,
            forwarded_id = %id,
            leases = buffers.as_ref().map_or(0, BufferCtx::len),
            "Forwarded request context"
        );
        RequestContext { id, buffers }
    }

    /// Absorb `src`'s leases so both sets drain together from this context.
    ///
    /// If only `src` has a buffer context, it is moved over wholesale.
    pub fn merge_buffers(&mut self, src: &mut RequestContext) {
        let Some(from) = src.buffers.as_mut() else {
            return;
        };
        match self.buffers.as_mut() {
            Some(dst) => dst.merge(from),
            None => self.buffers = src.buffers.take(),
        }
    }

    /// Return every lease and detach the buffer context
    pub fn finish(mut self) -> usize {
        self.buffers.take().map_or(0, |mut buffers| buffers.give())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ByteKind;

    fn registry() -> std::sync::Arc<ShardRegistry> {
        ShardRegistry::with_shards(2)
    }

    #[test]
    fn test_missing_attachment_is_none() {
        let mut req = RequestContext::new(RequestId(1));
        assert!(req.buffers().is_none());
        assert_eq!(req.finish(), 0);
    }

    #[test]
    fn test_attach_replaces_previous() {
        let registry = registry();
        let mut req = RequestContext::new(RequestId(1));
        assert!(req.attach_buffers(&registry).is_none());

        let bytes = registry.byte_kind().clone();
        req.buffers().unwrap().take(&bytes, 32).unwrap();

        let mut previous = req.attach_buffers(&registry).unwrap();
        assert_eq!(previous.len(), 1);
        assert!(req.buffers().unwrap().is_empty());
        assert_eq!(previous.give(), 1);
    }

    #[test]
    fn test_forward_moves_leases() {
        let registry = registry();
        let bytes = ByteKind::default();
        let mut req = RequestContext::with_buffers(RequestId(1), &registry);
        req.buffers().unwrap().take(&bytes, 64).unwrap();

        let mut forwarded = req.forward(RequestId(2));
        assert_eq!(forwarded.id(), RequestId(2));
        assert!(req.buffers().unwrap().is_empty());
        assert_eq!(forwarded.buffers().unwrap().len(), 1);

        assert_eq!(req.finish(), 0);
        assert_eq!(forwarded.finish(), 1);
    }

    #[test]
    fn test_forward_without_buffers() {
        let mut req = RequestContext::new(RequestId(1));
        let mut forwarded = req.forward(RequestId(2));
        assert!(forwarded.buffers().is_none());
    }

    #[test]
    fn test_merge_buffers() {
        let registry = registry();
        let bytes = ByteKind::default();

        let mut request = RequestContext::with_buffers(RequestId(1), &registry);
        let mut response = RequestContext::with_buffers(RequestId(1), &registry);
        request.buffers().unwrap().take(&bytes, 8).unwrap();
        response.buffers().unwrap().take(&bytes, 8).unwrap();

        response.merge_buffers(&mut request);
        assert_eq!(response.buffers().unwrap().len(), 2);
        assert!(request.buffers().unwrap().is_empty());
        assert_eq!(response.finish(), 2);
    }

    #[test]
    fn test_merge_adopts_when_destination_bare() {
        let registry = registry();
        let bytes = ByteKind::default();

        let mut request = RequestContext::with_buffers(RequestId(1), &registry);
        request.buffers().unwrap().take(&bytes, 8).unwrap();
        let mut response = RequestContext::new(RequestId(1));

        response.merge_buffers(&mut request);
        assert!(request.buffers().is_none());
        assert_eq!(response.finish(), 1);
    }

    #[test]
    fn test_request_id_display() {
        assert_eq!(RequestId::from_raw(255).to_string(), "00000000000000ff");
    }
}
