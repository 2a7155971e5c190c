//! Integration tests for request-scoped pooling

mod context_tests;
mod slab_tests;
