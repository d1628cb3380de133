// In: src/record/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Record Layer
// ====================================================================================
//
// The `record` layer owns the serialized form of ONE sample. It knows nothing
// about files or compression; its input and output are plain byte buffers.
//
// Data Flow (Encode):
//
//   1. [Sample (five ndarray fields)]
//         |
//         `-> flatten row-major, cast to raw f32 bytes (kernels::cast)
//         |
//   2. [codec::encode_sample] -> one length-prefixed, named-field byte record
//
// Data Flow (Decode):
//
//   1. [codec::decode_sample] -> parses container (magic, version, field table)
//         |
//         `-> reinterpret each field as f32 values (kernels::cast)
//         |
//   2. [reshape against SampleShapes] -> Sample
//
// The container embeds NO shape metadata. The shapes travel out-of-band and
// must match what the writer saw, or decoding fails with a shape mismatch.
//
// ====================================================================================
pub mod codec;
pub mod format;
