//! Vectorized algorithms implemented on flattened geometry buffers.

pub mod native;
