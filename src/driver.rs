//! Synthetic request driver
//!
//! Runs proxy-shaped request lifecycles against a registry: attach a buffer
//! context, fill protocol buffers, forward upstream, join the response path
//! and drain. Used by the soak binary and benches.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::DriverConfig;
use crate::context::{RequestContext, RequestId};
use crate::error::Result;
use crate::protocol::{ProtocolBufferKind, ProtocolBuffers, RpcStream, RpcStreamsKind};
use crate::registry::ShardRegistry;

/// Totals from one driver run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverReport {
    pub requests: u64,
    pub leases_returned: u64,
    pub errors: u64,
}

/// Drives synthetic requests through the pools
pub struct Driver {
    registry: Arc<ShardRegistry>,
    protocol: ProtocolBufferKind,
    config: DriverConfig,
    payload: Vec<u8>,
    next_id: AtomicU64,
}

impl Driver {
    /// Create a driver, resolving every kind it uses in all shards
    pub fn new(registry: Arc<ShardRegistry>, config: DriverConfig) -> Result<Arc<Self>> {
        let protocol = ProtocolBufferKind::from_registry(&registry);
        registry.preload(&protocol)?;
        registry.preload(&RpcStreamsKind)?;
        registry.preload(registry.byte_kind())?;

        let payload = (0..config.payload_size).map(|i| (i % 251) as u8).collect();

        Ok(Arc::new(Self {
            registry,
            protocol,
            config,
            payload,
            next_id: AtomicU64::new(1),
        }))
    }

    fn next_id(&self) -> RequestId {
        RequestId::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Run one request/response exchange, returning the leases drained
    pub fn handle_request(&self) -> Result<usize> {
        let id = self.next_id();
        let mut request = RequestContext::with_buffers(id, &self.registry);

        let Some(bufs) = ProtocolBuffers::from_request(&mut request, &self.protocol)? else {
            return Ok(0);
        };
        bufs.req_headers().insert(":method".into(), "POST".into());
        bufs.req_headers().insert(":path".into(), "/relay".into());
        bufs.req_data(self.payload.len()).write(&self.payload);
        let header = bufs.req_header(0);
        header.write(b"POST /relay");

        let scratch = bufs.bytes(self.payload.len());
        scratch[..self.payload.len()].copy_from_slice(&self.payload);

        if let Some(ctx) = request.buffers() {
            ctx.find(&RpcStreamsKind, ())?.client = Some(RpcStream {
                stream_id: id.as_u64(),
                request_id: id.as_u64() as u32,
                ..RpcStream::default()
            });
        }

        // Upstream leg owns the request's leases from here on
        let mut upstream = request.forward(self.next_id());

        let mut response = RequestContext::with_buffers(id, &self.registry);
        if let Some(bufs) = ProtocolBuffers::from_request(&mut response, &self.protocol)? {
            bufs.rsp_headers().insert(":status".into(), "200".into());
            bufs.rsp_data(0).write(&self.payload);
            bufs.rsp_trailers().insert("x-relay".into(), "done".into());
        }

        response.merge_buffers(&mut upstream);
        let drained = response.finish() + upstream.finish() + request.finish();
        debug!(request_id = %id, leases = drained, "Request complete");
        Ok(drained)
    }

    /// Run `workers` concurrent handlers to completion
    pub async fn run(self: Arc<Self>) -> DriverReport {
        let workers = self.config.effective_workers();
        let requests = self.config.requests_per_worker;
        info!(workers, requests_per_worker = requests, "Starting request driver");

        let mut tasks = JoinSet::new();
        for worker in 0..workers {
            let driver = self.clone();
            tasks.spawn(async move {
                let mut report = DriverReport::default();
                for _ in 0..requests {
                    match driver.handle_request() {
                        Ok(leases) => {
                            report.requests += 1;
                            report.leases_returned += leases as u64;
                        }
                        Err(e) => {
                            warn!(worker, error = %e, "Request failed");
                            report.errors += 1;
                        }
                    }
                    tokio::task::yield_now().await;
                }
                report
            });
        }

        let mut total = DriverReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => {
                    total.requests += report.requests;
                    total.leases_returned += report.leases_returned;
                    total.errors += report.errors;
                }
                Err(e) => {
                    error!(error = %e, "Driver worker panicked");
                    total.errors += 1;
                }
            }
        }
        total
    }
}
