//! reqpool - request-scoped buffer pooling for proxy data planes
//!
//! A size-classed byte slab, a sharded registry of pluggable pool modes,
//! and per-request lease ledgers that return every borrowed buffer or
//! protocol object to its pool exactly once.

pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod metrics;
pub mod pool;
pub mod protocol;
pub mod registry;
pub mod util;

pub use config::Config;
pub use context::{BufferCtx, RequestContext, RequestId};
pub use error::{PoolError, Result};
pub use registry::{ObjectKind, PoolMode, ShardRegistry};

/// Crate version for display
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
