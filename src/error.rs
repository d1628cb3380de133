// In: src/error.rs

//! This module defines the single, unified error type for the entire regshard library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RegShardError>;

#[derive(Error, Debug)]
pub enum RegShardError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to our library's logic)
    // =========================================================================
    #[error("Record serialization/deserialization failed: {0}")]
    RecordFormat(String),

    #[error("Shard file is malformed: {0}")]
    ShardFormat(String),

    #[error(
        "Shape mismatch for field '{field}': buffer holds {actual} f32 values, \
         requested shape needs {expected}"
    )]
    ShapeMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the underlying I/O subsystem (e.g., file not found).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically during config parsing.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    // =========================================================================
    // === Low-Level Kernel Errors
    // =========================================================================
    #[error("Buffer length mismatch: expected a multiple of {0}, got {1}")]
    BufferMismatch(usize, usize),

    #[error("Zstd operation failed: {0}")]
    ZstdError(String),
}
