//! Lease conservation across contexts and concurrent handlers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use reqpool::protocol::{ProtocolBufferKind, ProtocolBuffers, RpcStreamsKind};
use reqpool::{BufferCtx, ObjectKind, PoolMode, RequestContext, RequestId, ShardRegistry};

/// Pool counting takes and gives
#[derive(Default)]
struct Ledger {
    taken: AtomicUsize,
    given: AtomicUsize,
}

impl PoolMode<(), u64> for Ledger {
    fn take(&self, _hint: ()) -> u64 {
        self.taken.fetch_add(1, Ordering::SeqCst) as u64
    }

    fn give(&self, _value: u64) {
        self.given.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone)]
struct Counted {
    name: &'static str,
    pool: Arc<Ledger>,
}

impl Counted {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            pool: Arc::new(Ledger::default()),
        }
    }

    fn taken(&self) -> usize {
        self.pool.taken.load(Ordering::SeqCst)
    }

    fn given(&self) -> usize {
        self.pool.given.load(Ordering::SeqCst)
    }
}

impl ObjectKind for Counted {
    type Hint = ();
    type Value = u64;

    fn name(&self) -> &str {
        self.name
    }

    fn init(&self) -> Option<Arc<dyn PoolMode<(), u64>>> {
        Some(self.pool.clone())
    }

    fn new_value(&self, _hint: ()) -> u64 {
        0
    }

    fn reset(&self, _value: &mut u64) {}
}

#[test]
fn test_two_kinds_then_find_then_give() {
    let registry = ShardRegistry::with_shards(1);
    let a = Counted::new("A");
    let b = Counted::new("B");

    let mut ctx = BufferCtx::new(&registry);
    ctx.take(&a, ()).unwrap();
    ctx.take(&b, ()).unwrap();
    ctx.find(&a, ()).unwrap();
    assert_eq!(ctx.len(), 2);

    ctx.give();
    assert_eq!(a.given(), 1);
    assert_eq!(b.given(), 1);
}

#[test]
fn test_copy_then_drain_copy() {
    let registry = ShardRegistry::with_shards(3);
    let a = Counted::new("A");

    let mut c1 = BufferCtx::new(&registry);
    c1.take(&a, ()).unwrap();
    let mut c2 = c1.transfer();

    assert_eq!(c1.give(), 0);
    assert_eq!(a.given(), 0);
    assert_eq!(c2.give(), 1);
    assert_eq!(a.given(), 1);
}

#[test]
fn test_pipeline_forward_and_merge() {
    let registry = ShardRegistry::with_shards(2);
    let a = Counted::new("A");
    let b = Counted::new("B");

    let mut request = RequestContext::with_buffers(RequestId(1), &registry);
    request.buffers().unwrap().take(&a, ()).unwrap();

    let mut upstream = request.forward(RequestId(2));
    upstream.buffers().unwrap().take(&b, ()).unwrap();

    let mut response = RequestContext::with_buffers(RequestId(1), &registry);
    response.merge_buffers(&mut upstream);

    assert_eq!(request.finish(), 0);
    assert_eq!(upstream.finish(), 0);
    assert_eq!(response.finish(), 2);
    assert_eq!(a.given(), 1);
    assert_eq!(b.given(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_handlers_conserve_leases() {
    let registry = ShardRegistry::with_shards(4);
    let a = Counted::new("A");
    let b = Counted::new("B");
    let protocol = ProtocolBufferKind::from_registry(&registry);

    let mut tasks = tokio::task::JoinSet::new();
    for worker in 0..16u64 {
        let registry = registry.clone();
        let (a, b, protocol) = (a.clone(), b.clone(), protocol.clone());
        tasks.spawn(async move {
            for i in 0..200u64 {
                let mut req = RequestContext::with_buffers(RequestId(worker * 1000 + i), &registry);
                {
                    let ctx = req.buffers().unwrap();
                    ctx.find(&a, ()).unwrap();
                    ctx.find(&b, ()).unwrap();
                    ctx.find(&a, ()).unwrap();
                    ctx.find(&RpcStreamsKind, ()).unwrap();
                }
                let bufs = ProtocolBuffers::from_request(&mut req, &protocol).unwrap().unwrap();
                assert!(bufs.req_headers().is_empty());
                bufs.req_headers().insert("worker".into(), worker.to_string());
                bufs.bytes(64);

                assert_eq!(req.finish(), 4);
                tokio::task::yield_now().await;
            }
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap();
    }

    assert_eq!(a.taken(), 3200);
    assert_eq!(a.given(), 3200);
    assert_eq!(b.given(), 3200);
}
