//! The fixed-capacity shard writer.
//!
//! Samples arrive as a finite, single-pass stream. Encoded records are
//! buffered in memory until the configured capacity is reached, then the
//! buffer is flushed as one compressed shard file named by the next
//! zero-based index and cleared. After the source is exhausted, a non-empty
//! remainder becomes the final (short) shard. Any I/O error aborts the whole
//! operation; partially written files are left on disk for the operator to
//! inspect.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use crate::config::ShardConfig;
use crate::error::{RegShardError, Result};
use crate::kernels;
use crate::record::codec::encode_sample;
use crate::record::format::{SHARD_EXTENSION, SHARD_FORMAT_VERSION, SHARD_MAGIC};
use crate::types::Sample;

/// Streams encoded records into sequential fixed-capacity shard files.
///
/// Use `push` per sample and `finish` to flush the remainder. The
/// convenience wrapper `write_shards` drives the whole loop including
/// progress reporting.
pub struct ShardWriter {
    dir: PathBuf,
    config: ShardConfig,
    buffer: Vec<Vec<u8>>,
    next_index: usize,
}

impl ShardWriter {
    /// Creates the target directory if absent (idempotent) and returns a
    /// writer with an empty buffer.
    pub fn new(dir: &Path, config: &ShardConfig) -> Result<Self> {
        if config.examples_per_shard == 0 {
            return Err(RegShardError::Config(
                "examples_per_shard must be greater than zero".into(),
            ));
        }
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            config: config.clone(),
            buffer: Vec::with_capacity(config.examples_per_shard),
            next_index: 0,
        })
    }

    /// Encodes one sample into the current buffer, flushing a full shard
    /// when the buffer reaches capacity.
    pub fn push(&mut self, sample: &Sample) -> Result<()> {
        self.buffer.push(encode_sample(sample));
        if self.buffer.len() == self.config.examples_per_shard {
            self.flush_buffer()?;
        }
        Ok(())
    }

    /// Flushes any buffered remainder as a final short shard and returns
    /// the total number of shards written. Zero samples produce zero files.
    pub fn finish(mut self) -> Result<usize> {
        if !self.buffer.is_empty() {
            self.flush_buffer()?;
        }
        Ok(self.next_index)
    }

    /// Writes the buffered records as `<dir>/<next_index>.tfrecords`.
    fn flush_buffer(&mut self) -> Result<()> {
        let path = self
            .dir
            .join(format!("{}.{}", self.next_index, SHARD_EXTENSION));
        let file = File::create(&path)?;
        let mut encoder =
            kernels::zstd::writer(BufWriter::new(file), self.config.compression_level)?;

        encoder.write_all(SHARD_MAGIC)?;
        encoder.write_all(&SHARD_FORMAT_VERSION.to_le_bytes())?;
        encoder.write_all(&(self.buffer.len() as u64).to_le_bytes())?;
        for record in &self.buffer {
            encoder.write_all(&(record.len() as u64).to_le_bytes())?;
            encoder.write_all(record)?;
        }

        let mut inner = kernels::zstd::finish(encoder)?;
        inner.flush()?;

        info!(
            "Wrote shard {} with {} records",
            path.display(),
            self.buffer.len()
        );
        self.buffer.clear();
        self.next_index += 1;
        Ok(())
    }
}

/// Serializes a finite stream of samples into sharded files under
/// `data_dir`, reporting progress on a spinner, and returns the number of
/// shards written.
pub fn write_shards<I>(data_dir: &Path, samples: I, config: &ShardConfig) -> Result<usize>
where
    I: IntoIterator<Item = Sample>,
{
    let mut writer = ShardWriter::new(data_dir, config)?;

    let pb = write_progress_bar();
    let mut total = 0usize;
    for sample in samples {
        writer.push(&sample)?;
        total += 1;
        pb.inc(1);
    }
    let shards = writer.finish()?;
    pb.finish_and_clear();

    info!(
        "Serialized {} samples into {} shards under {}",
        total,
        shards,
        data_dir.display()
    );
    Ok(shards)
}

/// The sample stream is unbounded from the writer's point of view, so the
/// progress display is a counting spinner rather than a bar.
fn write_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {pos} samples written")
            .unwrap(),
    );
    pb
}
