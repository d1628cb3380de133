//! Shard discovery: which files in a directory are shards at all.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::record::format::SHARD_EXTENSION;

/// Returns the paths of every entry in `dir` carrying the shard extension.
///
/// The result is in filesystem-listing order, which is NOT guaranteed to be
/// sorted; callers that need determinism must sort. A missing directory
/// yields an empty list rather than an error, so "no data yet" and "no
/// shards yet" look the same to the caller.
pub fn discover_shards(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut shards = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some(SHARD_EXTENSION) {
            shards.push(path);
        }
    }
    Ok(shards)
}
