//! Request-scoped pooling
//!
//! Per-request lease ledgers and the request contexts that carry them.

mod ledger;
mod request;

pub use ledger::BufferCtx;
pub use request::{RequestContext, RequestId};
