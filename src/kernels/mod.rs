//! Pure, stateless kernels shared by the record codec and the shard layer.
//!
//! Nothing in here knows about samples, shards, or files; these are the
//! byte-level building blocks the higher layers compose.

pub mod cast;
pub mod zstd;
