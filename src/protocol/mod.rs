//! Pooled protocol aggregates
//!
//! Object kinds that codecs borrow per request through a buffer context.

mod buffers;
mod rpc;

pub use buffers::{
    HeaderMap, ProtocolBufferKind, ProtocolBuffers, ScratchPool, DEFAULT_DATA_SIZE, DEFAULT_HEADER_SIZE,
};
pub use rpc::{RpcStream, RpcStreams, RpcStreamsKind};
