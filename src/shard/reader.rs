//! Sequential raw-record access to one shard file.
//!
//! The reader validates the shard header (magic, version, record count) at
//! open time and then yields each record's bytes in written order through
//! the decompression stream. It does not decode records into samples; that
//! is the `dataset` layer's job.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use zstd::stream::Decoder;

use crate::error::{RegShardError, Result};
use crate::kernels;
use crate::record::format::{SHARD_FORMAT_VERSION, SHARD_MAGIC};

/// Upper bound on a single record's declared length. A volume pair has no
/// business being larger than this; anything bigger is a corrupt length
/// prefix, and rejecting it avoids a pathological allocation.
const MAX_RECORD_LEN: u64 = 8 << 30; // 8 GiB

/// Streams the raw records of one shard file in written order.
pub struct ShardReader {
    decoder: Decoder<'static, std::io::BufReader<File>>,
    total: u64,
    remaining: u64,
}

impl ShardReader {
    /// Opens a shard file and validates its header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut decoder = kernels::zstd::reader(file)?;

        let map_err = |e: std::io::Error| {
            RegShardError::ShardFormat(format!("Truncated shard header: {}", e))
        };

        let mut magic_buf = [0u8; 4];
        decoder.read_exact(&mut magic_buf).map_err(map_err)?;
        if magic_buf != *SHARD_MAGIC {
            return Err(RegShardError::ShardFormat(
                "Invalid shard magic number".into(),
            ));
        }

        let mut u16_buf = [0u8; 2];
        decoder.read_exact(&mut u16_buf).map_err(map_err)?;
        let version = u16::from_le_bytes(u16_buf);
        if version != SHARD_FORMAT_VERSION {
            return Err(RegShardError::ShardFormat(format!(
                "Unsupported shard version: expected {}, got {}",
                SHARD_FORMAT_VERSION, version
            )));
        }

        let mut u64_buf = [0u8; 8];
        decoder.read_exact(&mut u64_buf).map_err(map_err)?;
        let total = u64::from_le_bytes(u64_buf);

        Ok(Self {
            decoder,
            total,
            remaining: total,
        })
    }

    /// The number of records the header declares for this shard.
    pub fn record_count(&self) -> u64 {
        self.total
    }

    /// Reads the next raw record, or `None` once the declared count has
    /// been consumed. Truncation mid-record is a `ShardFormat` error.
    pub fn read_next(&mut self) -> Result<Option<Vec<u8>>> {
        if self.remaining == 0 {
            return Ok(None);
        }

        let mut u64_buf = [0u8; 8];
        self.decoder.read_exact(&mut u64_buf).map_err(|e| {
            RegShardError::ShardFormat(format!("Truncated record length prefix: {}", e))
        })?;
        let len = u64::from_le_bytes(u64_buf);
        if len > MAX_RECORD_LEN {
            return Err(RegShardError::ShardFormat(format!(
                "Record length {} exceeds maximum allowed size {}",
                len, MAX_RECORD_LEN
            )));
        }

        let mut record = vec![0u8; len as usize];
        self.decoder.read_exact(&mut record).map_err(|e| {
            RegShardError::ShardFormat(format!("Truncated record payload: {}", e))
        })?;

        self.remaining -= 1;
        Ok(Some(record))
    }

    /// Drains the remaining records into memory in written order.
    pub fn read_all(mut self) -> Result<Vec<Vec<u8>>> {
        let mut records = Vec::with_capacity(self.remaining.min(1 << 20) as usize);
        while let Some(record) = self.read_next()? {
            records.push(record);
        }
        Ok(records)
    }
}

impl Iterator for ShardReader {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}
