// In: src/record/format.rs

//! Defines all on-disk structures and constants for the regshard format.
//! This is the single source of truth for both the shard-level container
//! format and the individual record format. It establishes the contract
//! between the writer and every reader.

/// The magic number to identify an individual serialized sample record.
pub const RECORD_MAGIC: &[u8; 4] = b"RSMP";
/// The current version of the record format.
pub const RECORD_FORMAT_VERSION: u16 = 1;

/// The magic number at the head of every (decompressed) shard stream.
pub const SHARD_MAGIC: &[u8; 4] = b"RSHD";
/// The current version of the shard container format.
pub const SHARD_FORMAT_VERSION: u16 = 1;

/// The filename extension of every shard: `<data_dir>/<N>.tfrecords`.
pub const SHARD_EXTENSION: &str = "tfrecords";

pub const FIELD_MOVING_IMAGE: &str = "moving_image";
pub const FIELD_FIXED_IMAGE: &str = "fixed_image";
pub const FIELD_MOVING_LABEL: &str = "moving_label";
pub const FIELD_FIXED_LABEL: &str = "fixed_label";
pub const FIELD_INDICES: &str = "indices";

/// The fixed field set, in canonical written order. Field presence is
/// mandatory; a record with a missing, duplicate, or unknown field is
/// malformed.
pub const FIELD_NAMES: [&str; 5] = [
    FIELD_MOVING_IMAGE,
    FIELD_FIXED_IMAGE,
    FIELD_MOVING_LABEL,
    FIELD_FIXED_LABEL,
    FIELD_INDICES,
];
