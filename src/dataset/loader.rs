//! The lazy shard-to-sample loader.
//!
//! `ShardDataset` walks a list of shard files in the given order, reads each
//! shard's raw records sequentially, and decodes them on a rayon pool. The
//! parallel iterator collects in source order, so emission order always
//! matches file-then-record order no matter how decode work is scheduled.
//! Laziness is per shard: the next file is not touched until the previous
//! shard's samples have been drained.
//!
//! Errors are fatal: the first I/O or decode failure is yielded once and
//! the stream ends. There is no mid-pipeline cancellation beyond dropping
//! the iterator.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use rayon::prelude::*;

use crate::error::{RegShardError, Result};
use crate::record::codec::decode_sample;
use crate::shard::discover::discover_shards;
use crate::shard::reader::ShardReader;
use crate::types::{Sample, SampleShapes};

/// Tuning knobs for the loader.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Size of the decode pool. `None` uses the process-wide rayon pool
    /// with its default sizing.
    pub decode_threads: Option<usize>,
}

/// A lazy iterator of decoded samples over an ordered list of shard files.
pub struct ShardDataset {
    paths: Vec<PathBuf>,
    shapes: SampleShapes,
    pool: Option<Arc<rayon::ThreadPool>>,
    decoded: VecDeque<Sample>,
    next_shard: usize,
    failed: bool,
}

impl ShardDataset {
    fn decode_shard(&self, path: &Path) -> Result<Vec<Sample>> {
        let reader = ShardReader::open(path)?;
        debug!(
            "Decoding shard {} ({} records)",
            path.display(),
            reader.record_count()
        );
        let raw = reader.read_all()?;

        let shapes = self.shapes;
        let decode = || {
            raw.par_iter()
                .map(|record| decode_sample(record, &shapes))
                .collect::<Result<Vec<Sample>>>()
        };
        match &self.pool {
            Some(pool) => pool.install(decode),
            None => decode(),
        }
    }
}

impl Iterator for ShardDataset {
    type Item = Result<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(sample) = self.decoded.pop_front() {
                return Some(Ok(sample));
            }
            if self.failed || self.next_shard == self.paths.len() {
                return None;
            }

            let path = self.paths[self.next_shard].clone();
            self.next_shard += 1;
            match self.decode_shard(&path) {
                Ok(samples) => self.decoded = samples.into(),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Builds a lazy sample stream over `paths`, preserving their order, using
/// the process-wide decode pool.
pub fn load_shards(paths: Vec<PathBuf>, shapes: SampleShapes) -> ShardDataset {
    ShardDataset {
        paths,
        shapes,
        pool: None,
        decoded: VecDeque::new(),
        next_shard: 0,
        failed: false,
    }
}

/// Like `load_shards`, but with an explicitly bounded decode pool.
pub fn load_shards_with(
    paths: Vec<PathBuf>,
    shapes: SampleShapes,
    options: &LoaderOptions,
) -> Result<ShardDataset> {
    let pool = match options.decode_threads {
        Some(threads) => Some(Arc::new(
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| {
                    RegShardError::Config(format!("failed to build decode thread pool: {}", e))
                })?,
        )),
        None => None,
    };
    let mut dataset = load_shards(paths, shapes);
    dataset.pool = pool;
    Ok(dataset)
}

/// Discovers the shards of a directory and loads them in index order.
///
/// Discovery itself returns filesystem-listing order; since shard names are
/// sequential integers, this helper sorts numerically by file stem (falling
/// back to lexicographic for foreign names) so samples come back in the
/// order they were written.
pub fn load_dir(dir: &Path, shapes: SampleShapes) -> Result<ShardDataset> {
    let mut paths = discover_shards(dir)?;
    paths.sort_by_key(|path| {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        match stem.parse::<u64>() {
            Ok(index) => (0u8, index, String::new()),
            Err(_) => (1u8, 0, stem),
        }
    });
    Ok(load_shards(paths, shapes))
}
