//! This file is the root of the `regshard` Rust crate.
//!
//! regshard serializes paired image-registration training samples
//! (moving/fixed volumes, their labels, and an index vector) into
//! fixed-capacity, zstd-compressed shard files, and streams them back as
//! fixed-shape `ndarray` tensors in written order. Shape metadata is never
//! stored; the loader is handed the same `SampleShapes` the producer used.
//!
//! The layering, bottom up: `kernels` (byte casts, compression streams),
//! `record` (the named-field record codec), `shard` (fixed-capacity files,
//! discovery), `dataset` (the lazy ordered loader).

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod config;
pub mod dataset;
pub mod kernels;
pub mod record;
pub mod shard;

mod error;
mod logging;
mod types;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================
pub use config::ShardConfig;
pub use dataset::loader::{load_dir, load_shards, load_shards_with, LoaderOptions, ShardDataset};
pub use error::{RegShardError, Result};
pub use logging::enable_verbose_logging;
pub use record::codec::{decode_sample, encode_sample};
pub use shard::discover::discover_shards;
pub use shard::reader::ShardReader;
pub use shard::writer::{write_shards, ShardWriter};
pub use types::{Sample, SampleShapes};
