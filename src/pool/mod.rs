//! Memory pool management
//!
//! Size-classed byte slabs and the buffers built on top of them.

mod buffer;
mod byte_pool;
mod slab;

pub use byte_pool::{ByteKind, BytePool, SlabMode};
pub use buffer::IoBuffer;
pub use slab::{SlabAllocator, SlabStats};
