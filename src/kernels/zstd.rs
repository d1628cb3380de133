//! This module contains the pure, stateless wrappers for performing
//! Zstandard compression and decompression on shard streams.
//!
//! Every shard file is one compressed stream: the writer funnels the shard
//! header and all record payloads through an `Encoder`, and the reader pulls
//! them back through a `Decoder`. This module is a safe wrapper around the
//! `zstd` crate; all construction/finalization failures surface as
//! `ZstdError` instead of panics.

use std::io::{Read, Write};

use zstd::stream::{Decoder, Encoder};

use crate::error::{RegShardError, Result};

/// Wraps a writer in a Zstandard compression stream at the given level.
pub fn writer<W: Write>(inner: W, level: i32) -> Result<Encoder<'static, W>> {
    Encoder::new(inner, level).map_err(|e| RegShardError::ZstdError(e.to_string()))
}

/// Finalizes a compression stream, returning the inner writer.
///
/// `finish` is essential: without it the Zstd frame is truncated and the
/// shard is unreadable.
pub fn finish<W: Write>(encoder: Encoder<'static, W>) -> Result<W> {
    encoder
        .finish()
        .map_err(|e| RegShardError::ZstdError(e.to_string()))
}

/// Wraps a reader in a Zstandard decompression stream. The decoder buffers
/// the inner reader itself.
pub fn reader<R: Read>(inner: R) -> Result<Decoder<'static, std::io::BufReader<R>>> {
    Decoder::new(inner).map_err(|e| RegShardError::ZstdError(e.to_string()))
}
