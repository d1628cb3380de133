// In: src/shard/mod.rs

//! The shard layer owns the on-disk container: fixed-capacity, zstd-compressed
//! files of length-prefixed records, named `<N>.tfrecords` for N = 0, 1, 2...
//!
//! `writer` packs an ordered stream of samples into sequential shards,
//! `reader` walks the raw records of one shard back out, and `discover`
//! lists the shard files of a directory. Decoding records into samples is
//! the `dataset` layer's job.

pub mod discover;
pub mod reader;
pub mod writer;
