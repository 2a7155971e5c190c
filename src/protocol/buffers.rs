//! Protocol buffer bundle
//!
//! One pooled aggregate holding everything a codec needs for a single
//! request/response exchange: body and header buffers, header and trailer
//! maps, and a byte scratch pool.

use std::collections::HashMap;
use std::sync::Arc;

use crate::context::RequestContext;
use crate::error::Result;
use crate::pool::{ByteKind, BytePool, IoBuffer};
use crate::registry::{ObjectKind, PoolMode, ShardRegistry};

/// Byte pool a new bundle draws its scratch buffers from
pub type ScratchPool = Arc<dyn PoolMode<usize, Vec<u8>>>;

/// Body size used when a caller asks for 0 bytes
pub const DEFAULT_DATA_SIZE: usize = 1 << 10;
/// Header block size used when a caller asks for 0 bytes
pub const DEFAULT_HEADER_SIZE: usize = 1 << 5;

/// String-keyed header or trailer map
pub type HeaderMap = HashMap<String, String>;

/// Buffers for one request/response exchange
pub struct ProtocolBuffers {
    req_data: IoBuffer,
    req_header: IoBuffer,
    req_headers: HeaderMap,
    req_trailers: HeaderMap,

    rsp_data: IoBuffer,
    rsp_header: IoBuffer,
    rsp_headers: HeaderMap,
    rsp_trailers: HeaderMap,

    bytes: BytePool,
}

fn sized(buf: &mut IoBuffer, size: usize, default: usize) -> &mut IoBuffer {
    buf.alloc(if size == 0 { default } else { size });
    buf
}

impl ProtocolBuffers {
    fn new(bytes: ScratchPool) -> Self {
        Self {
            req_data: IoBuffer::new(0),
            req_header: IoBuffer::new(0),
            req_headers: HeaderMap::new(),
            req_trailers: HeaderMap::new(),
            rsp_data: IoBuffer::new(0),
            rsp_header: IoBuffer::new(0),
            rsp_headers: HeaderMap::new(),
            rsp_trailers: HeaderMap::new(),
            bytes: BytePool::new(bytes),
        }
    }

    /// The request's bundle, leased on first use.
    ///
    /// A new bundle takes its scratch bytes from the slab of the context's
    /// own shard. Returns `Ok(None)` when no buffer context is attached.
    pub fn from_request<'a>(
        req: &'a mut RequestContext,
        kind: &ProtocolBufferKind,
    ) -> Result<Option<&'a mut ProtocolBuffers>> {
        let Some(ctx) = req.buffers() else {
            return Ok(None);
        };
        let scratch = ctx.shard().get_pool(&kind.bytes)?;
        ctx.find(kind, scratch).map(Some)
    }

    /// Scratch bytes released when the bundle is reset
    pub fn bytes(&mut self, size: usize) -> &mut Vec<u8> {
        self.bytes.take(size)
    }

    /// Outstanding scratch buffers
    pub fn scratch_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn req_data(&mut self, size: usize) -> &mut IoBuffer {
        sized(&mut self.req_data, size, DEFAULT_DATA_SIZE)
    }

    pub fn req_header(&mut self, size: usize) -> &mut IoBuffer {
        sized(&mut self.req_header, size, DEFAULT_HEADER_SIZE)
    }

    pub fn req_headers(&mut self) -> &mut HeaderMap {
        &mut self.req_headers
    }

    pub fn req_trailers(&mut self) -> &mut HeaderMap {
        &mut self.req_trailers
    }

    pub fn rsp_data(&mut self, size: usize) -> &mut IoBuffer {
        sized(&mut self.rsp_data, size, DEFAULT_DATA_SIZE)
    }

    pub fn rsp_header(&mut self, size: usize) -> &mut IoBuffer {
        sized(&mut self.rsp_header, size, DEFAULT_HEADER_SIZE)
    }

    pub fn rsp_headers(&mut self) -> &mut HeaderMap {
        &mut self.rsp_headers
    }

    pub fn rsp_trailers(&mut self) -> &mut HeaderMap {
        &mut self.rsp_trailers
    }

    fn clear(&mut self) {
        self.bytes.give_all();

        self.req_data.free();
        self.rsp_data.free();
        self.req_header.free();
        self.rsp_header.free();

        self.req_headers.clear();
        self.req_trailers.clear();
        self.rsp_headers.clear();
        self.rsp_trailers.clear();
    }
}

/// Object kind for [`ProtocolBuffers`], pooled through the default mode.
///
/// The hint is the scratch byte pool, only consulted when a bundle is built.
#[derive(Clone, Default)]
pub struct ProtocolBufferKind {
    bytes: ByteKind,
}

impl ProtocolBufferKind {
    pub const NAME: &'static str = "protocol-buffers";

    /// Build bundles whose scratch bytes come from `bytes` slabs
    pub fn new(bytes: ByteKind) -> Self {
        Self { bytes }
    }

    /// Build bundles using the registry's byte kind
    pub fn from_registry(registry: &ShardRegistry) -> Self {
        Self::new(registry.byte_kind().clone())
    }
}

impl ObjectKind for ProtocolBufferKind {
    type Hint = ScratchPool;
    type Value = ProtocolBuffers;

    fn name(&self) -> &str {
        Self::NAME
    }

    fn new_value(&self, bytes: ScratchPool) -> ProtocolBuffers {
        ProtocolBuffers::new(bytes)
    }

    fn reset(&self, value: &mut ProtocolBuffers) {
        value.clear();
    }
}
