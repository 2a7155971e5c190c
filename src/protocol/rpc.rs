//! RPC stream pair
//!
//! Client/server stream state for one multiplexed RPC exchange, pooled so
//! the pair struct is reused across requests.

use crate::registry::ObjectKind;

/// State of one side of an RPC exchange
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcStream {
    pub stream_id: u64,
    pub request_id: u32,
    pub codec: u8,
    pub timeout_ms: u32,
}

/// Client and server halves of one exchange
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RpcStreams {
    pub client: Option<RpcStream>,
    pub server: Option<RpcStream>,
}

/// Object kind for [`RpcStreams`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RpcStreamsKind;

impl RpcStreamsKind {
    pub const NAME: &'static str = "rpc-streams";
}

impl ObjectKind for RpcStreamsKind {
    type Hint = ();
    type Value = RpcStreams;

    fn name(&self) -> &str {
        Self::NAME
    }

    fn new_value(&self, _hint: ()) -> RpcStreams {
        RpcStreams::default()
    }

    fn reset(&self, value: &mut RpcStreams) {
        *value = RpcStreams::default();
    }
}
