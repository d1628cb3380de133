// In: src/config.rs

//! The single source of truth for all shard-writing configuration.
//!
//! This module defines the `ShardConfig` struct, which is designed to be
//! created once at the application boundary (e.g., from a user's JSON file)
//! and then passed down to the writer. Centralizing the settings here keeps
//! the writer's signature stable as knobs are added.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Configuration for the fixed-capacity shard writer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ShardConfig {
    /// **The number of examples packed into each shard file.**
    /// Every shard except possibly the last holds exactly this many records;
    /// the last holds the remainder. Must be greater than zero.
    #[serde(default = "default_examples_per_shard")]
    pub examples_per_shard: usize,

    /// The Zstandard level applied uniformly to every shard stream. Higher
    /// levels trade CPU time for smaller files.
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            examples_per_shard: default_examples_per_shard(),
            compression_level: default_compression_level(),
        }
    }
}

impl ShardConfig {
    /// Parses a config from a JSON document, filling omitted fields with
    /// their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Helper for `serde` to provide a default for `examples_per_shard`.
fn default_examples_per_shard() -> usize {
    64
}

/// Helper for `serde` to provide a default for `compression_level`.
fn default_compression_level() -> i32 {
    3
}
