//! The serializer/deserializer for a single sample record.
//!
//! A record is a named-field byte container: magic, format version, field
//! count, then for each field a length-prefixed name and a length-prefixed
//! payload of raw f32 bytes in row-major order. The writer emits the fields
//! in the canonical order of `format::FIELD_NAMES`; the parser accepts any
//! order but requires the exact field set. All declared lengths are
//! validated against the buffer before any allocation.

use std::io::{Cursor, Read};

use ndarray::{Array, Array1, Array3, Dimension};

use crate::error::{RegShardError, Result};
use crate::kernels::cast;
use crate::record::format::{
    FIELD_FIXED_IMAGE, FIELD_FIXED_LABEL, FIELD_INDICES, FIELD_MOVING_IMAGE, FIELD_MOVING_LABEL,
    FIELD_NAMES, RECORD_FORMAT_VERSION, RECORD_MAGIC,
};
use crate::types::{Sample, SampleShapes};

//==================================================================================
// Format Constants
//==================================================================================
/// The minimum possible size of a valid record in bytes.
const MIN_RECORD_SIZE: usize = 8; // magic(4) + ver(2) + field_count(2)
/// Field names are short identifiers; anything longer is corruption.
const MAX_FIELD_NAME_LEN: usize = 64;

//==================================================================================
// Encode
//==================================================================================

/// Serializes one sample into a single opaque byte record.
///
/// Each array is flattened row-major and stored as raw f32 bytes under its
/// field name. No shape or dtype metadata is embedded, and no cross-field
/// consistency is enforced here; a sample whose dimensions disagree with the
/// shapes supplied at decode time only fails at decode time.
pub fn encode_sample(sample: &Sample) -> Vec<u8> {
    let fields: [(&str, Vec<u8>); 5] = [
        (FIELD_MOVING_IMAGE, flatten_to_bytes(&sample.moving_image)),
        (FIELD_FIXED_IMAGE, flatten_to_bytes(&sample.fixed_image)),
        (FIELD_MOVING_LABEL, flatten_to_bytes(&sample.moving_label)),
        (FIELD_FIXED_LABEL, flatten_to_bytes(&sample.fixed_label)),
        (FIELD_INDICES, flatten_to_bytes(&sample.indices)),
    ];
    write_record(&fields)
}

/// Flattens an array to its raw f32 bytes in logical row-major order,
/// regardless of the memory layout of the source.
fn flatten_to_bytes<D: Dimension>(array: &Array<f32, D>) -> Vec<u8> {
    match array.as_slice() {
        Some(values) => cast::f32s_to_bytes(values),
        None => {
            let values: Vec<f32> = array.iter().copied().collect();
            cast::f32s_to_bytes(&values)
        }
    }
}

/// Assembles the record container around an ordered field list.
fn write_record(fields: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let payload_size: usize = fields
        .iter()
        .map(|(name, data)| 2 + name.len() + 8 + data.len())
        .sum();
    let mut buf = Vec::with_capacity(MIN_RECORD_SIZE + payload_size);

    buf.extend_from_slice(RECORD_MAGIC);
    buf.extend_from_slice(&RECORD_FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&(fields.len() as u16).to_le_bytes());

    for (name, data) in fields {
        buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(&(data.len() as u64).to_le_bytes());
        buf.extend_from_slice(data);
    }

    buf
}

//==================================================================================
// Decode
//==================================================================================

/// Deserializes one record back into a sample, using the externally
/// supplied shapes to reinterpret the flat buffers.
///
/// The moving label reuses the moving image shape and the fixed label the
/// fixed image shape. An element count that disagrees with the requested
/// shape product is a `ShapeMismatch`; a structural violation of the
/// container (magic, version, field table, lengths) is a `RecordFormat`
/// error.
pub fn decode_sample(bytes: &[u8], shapes: &SampleShapes) -> Result<Sample> {
    let fields = read_record(bytes)?;

    Ok(Sample {
        moving_image: reshape_volume(FIELD_MOVING_IMAGE, fields.moving_image, shapes.moving_image)?,
        fixed_image: reshape_volume(FIELD_FIXED_IMAGE, fields.fixed_image, shapes.fixed_image)?,
        moving_label: reshape_volume(FIELD_MOVING_LABEL, fields.moving_label, shapes.moving_image)?,
        fixed_label: reshape_volume(FIELD_FIXED_LABEL, fields.fixed_label, shapes.fixed_image)?,
        indices: reshape_indices(fields.indices, shapes.num_indices)?,
    })
}

/// The five raw payloads of a parsed record, prior to reshaping.
struct RecordFields<'a> {
    moving_image: &'a [u8],
    fixed_image: &'a [u8],
    moving_label: &'a [u8],
    fixed_label: &'a [u8],
    indices: &'a [u8],
}

/// Parses the record container and returns borrowed views of the five
/// mandatory payloads. Rejects unknown, duplicate, or missing fields and
/// any declared length that escapes the buffer.
fn read_record(bytes: &[u8]) -> Result<RecordFields<'_>> {
    if bytes.len() < MIN_RECORD_SIZE {
        return Err(RegShardError::RecordFormat(format!(
            "Record is too small to be valid. Minimum size: {}, got: {}",
            MIN_RECORD_SIZE,
            bytes.len()
        )));
    }

    let mut cursor = Cursor::new(bytes);
    let map_err = |e: std::io::Error| RegShardError::RecordFormat(e.to_string());

    let mut magic_buf = [0u8; 4];
    cursor.read_exact(&mut magic_buf).map_err(map_err)?;
    if magic_buf != *RECORD_MAGIC {
        return Err(RegShardError::RecordFormat(
            "Invalid record magic number".into(),
        ));
    }

    let mut u16_buf = [0u8; 2];
    cursor.read_exact(&mut u16_buf).map_err(map_err)?;
    let version = u16::from_le_bytes(u16_buf);
    if version != RECORD_FORMAT_VERSION {
        return Err(RegShardError::RecordFormat(format!(
            "Unsupported record version: expected {}, got {}",
            RECORD_FORMAT_VERSION, version
        )));
    }

    cursor.read_exact(&mut u16_buf).map_err(map_err)?;
    let field_count = u16::from_le_bytes(u16_buf) as usize;
    if field_count != FIELD_NAMES.len() {
        return Err(RegShardError::RecordFormat(format!(
            "Expected exactly {} fields, record declares {}",
            FIELD_NAMES.len(),
            field_count
        )));
    }

    let mut slots: [Option<&[u8]>; 5] = [None; 5];

    for _ in 0..field_count {
        cursor.read_exact(&mut u16_buf).map_err(map_err)?;
        let name_len = u16::from_le_bytes(u16_buf) as usize;
        if name_len > MAX_FIELD_NAME_LEN {
            return Err(RegShardError::RecordFormat(format!(
                "Field name length ({}) exceeds maximum allowed size ({})",
                name_len, MAX_FIELD_NAME_LEN
            )));
        }

        let name_start = cursor.position() as usize;
        let name_end = name_start + name_len;
        if name_end > bytes.len() {
            return Err(RegShardError::RecordFormat(
                "Field name length exceeds buffer size".into(),
            ));
        }
        let name = std::str::from_utf8(&bytes[name_start..name_end])
            .map_err(|e| RegShardError::RecordFormat(e.to_string()))?;
        cursor.set_position(name_end as u64);

        let mut u64_buf = [0u8; 8];
        cursor.read_exact(&mut u64_buf).map_err(map_err)?;
        let payload_len = u64::from_le_bytes(u64_buf) as usize;

        let payload_start = cursor.position() as usize;
        let payload_end = payload_start.checked_add(payload_len).ok_or_else(|| {
            RegShardError::RecordFormat("Field payload length overflows".into())
        })?;
        if payload_end > bytes.len() {
            return Err(RegShardError::RecordFormat(
                "Field payload length exceeds buffer size".into(),
            ));
        }
        let payload = &bytes[payload_start..payload_end];
        cursor.set_position(payload_end as u64);

        let slot_idx = FIELD_NAMES
            .iter()
            .position(|&known| known == name)
            .ok_or_else(|| {
                RegShardError::RecordFormat(format!("Unknown field '{}' in record", name))
            })?;
        if slots[slot_idx].replace(payload).is_some() {
            return Err(RegShardError::RecordFormat(format!(
                "Duplicate field '{}' in record",
                name
            )));
        }
    }

    if cursor.position() as usize != bytes.len() {
        return Err(RegShardError::RecordFormat(
            "Record has trailing bytes after last field".into(),
        ));
    }

    // All five slots are filled: the count matched and duplicates were
    // rejected, so each name landed in its own slot.
    let [moving_image, fixed_image, moving_label, fixed_label, indices] = slots;
    Ok(RecordFields {
        moving_image: moving_image
            .ok_or_else(|| RegShardError::RecordFormat("Missing field 'moving_image'".into()))?,
        fixed_image: fixed_image
            .ok_or_else(|| RegShardError::RecordFormat("Missing field 'fixed_image'".into()))?,
        moving_label: moving_label
            .ok_or_else(|| RegShardError::RecordFormat("Missing field 'moving_label'".into()))?,
        fixed_label: fixed_label
            .ok_or_else(|| RegShardError::RecordFormat("Missing field 'fixed_label'".into()))?,
        indices: indices
            .ok_or_else(|| RegShardError::RecordFormat("Missing field 'indices'".into()))?,
    })
}

/// Reinterprets a payload as f32 values and reshapes them into a volume.
fn reshape_volume(field: &str, bytes: &[u8], shape: [usize; 3]) -> Result<Array3<f32>> {
    let values = cast::bytes_to_f32s(bytes)?;
    let expected: usize = shape.iter().product();
    if values.len() != expected {
        return Err(RegShardError::ShapeMismatch {
            field: field.to_string(),
            expected,
            actual: values.len(),
        });
    }
    Array3::from_shape_vec((shape[0], shape[1], shape[2]), values)
        .map_err(|e| RegShardError::InternalError(format!("Reshape of '{}' failed: {}", field, e)))
}

/// Reinterprets a payload as the 1-D index vector.
fn reshape_indices(bytes: &[u8], num_indices: usize) -> Result<Array1<f32>> {
    let values = cast::bytes_to_f32s(bytes)?;
    if values.len() != num_indices {
        return Err(RegShardError::ShapeMismatch {
            field: FIELD_INDICES.to_string(),
            expected: num_indices,
            actual: values.len(),
        });
    }
    Ok(Array1::from_vec(values))
}

//==================================================================================
// Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_shapes() -> SampleShapes {
        SampleShapes {
            moving_image: [2, 3, 4],
            fixed_image: [3, 2, 2],
            num_indices: 5,
        }
    }

    fn test_sample(seed: f32) -> Sample {
        let shapes = test_shapes();
        let [m0, m1, m2] = shapes.moving_image;
        let [f0, f1, f2] = shapes.fixed_image;
        Sample {
            moving_image: Array3::from_shape_fn((m0, m1, m2), |(i, j, k)| {
                seed + (i * 100 + j * 10 + k) as f32
            }),
            fixed_image: Array3::from_shape_fn((f0, f1, f2), |(i, j, k)| {
                -seed + (i * 100 + j * 10 + k) as f32
            }),
            moving_label: Array3::from_shape_fn((m0, m1, m2), |(i, _, _)| seed * i as f32),
            fixed_label: Array3::from_shape_fn((f0, f1, f2), |(_, j, _)| seed * j as f32),
            indices: Array1::from_vec((0..5).map(|i| seed + i as f32).collect()),
        }
    }

    #[test]
    fn test_roundtrip_is_exact() {
        let original = test_sample(7.0);
        let bytes = encode_sample(&original);
        let decoded = decode_sample(&bytes, &test_shapes()).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_labels_reuse_image_shapes() {
        // Moving and fixed volumes have different shapes; the labels must
        // land on their image's shape, not their own stored metadata
        // (there is none).
        let sample = test_sample(1.0);
        let decoded = decode_sample(&encode_sample(&sample), &test_shapes()).unwrap();
        assert_eq!(decoded.moving_label.dim(), decoded.moving_image.dim());
        assert_eq!(decoded.fixed_label.dim(), decoded.fixed_image.dim());
        assert_ne!(decoded.moving_label.dim(), decoded.fixed_label.dim());
    }

    #[test]
    fn test_shape_product_disagreement_is_an_error() {
        let sample = test_sample(2.0);
        let bytes = encode_sample(&sample);

        // Off-by-one element count: five floats stored, four requested.
        let mut wrong = test_shapes();
        wrong.num_indices = 4;
        let result = decode_sample(&bytes, &wrong);
        assert!(matches!(
            result,
            Err(RegShardError::ShapeMismatch {
                expected: 4,
                actual: 5,
                ..
            })
        ));

        // Same total element count but redistributed dimensions succeeds;
        // the buffer carries no shape of its own.
        let mut transposed = test_shapes();
        transposed.moving_image = [4, 3, 2];
        assert!(decode_sample(&bytes, &transposed).is_ok());
    }

    #[test]
    fn test_bad_magic_is_rejected() {
        let mut bytes = encode_sample(&test_sample(3.0));
        bytes[0] = b'X';
        assert!(matches!(
            decode_sample(&bytes, &test_shapes()),
            Err(RegShardError::RecordFormat(_))
        ));
    }

    #[test]
    fn test_bad_version_is_rejected() {
        let mut bytes = encode_sample(&test_sample(3.0));
        bytes[4] = 0xFF;
        bytes[5] = 0xFF;
        assert!(matches!(
            decode_sample(&bytes, &test_shapes()),
            Err(RegShardError::RecordFormat(_))
        ));
    }

    #[test]
    fn test_truncated_record_is_rejected() {
        let bytes = encode_sample(&test_sample(3.0));
        let truncated = &bytes[..bytes.len() - 3];
        assert!(matches!(
            decode_sample(truncated, &test_shapes()),
            Err(RegShardError::RecordFormat(_))
        ));

        assert!(matches!(
            decode_sample(b"short", &test_shapes()),
            Err(RegShardError::RecordFormat(_))
        ));
    }

    #[test]
    fn test_duplicate_field_is_rejected() {
        // A record declaring the right count but repeating a name must not
        // pass the mandatory-field check.
        let payload = vec![0u8; 20];
        let fields: [(&str, Vec<u8>); 5] = [
            (FIELD_MOVING_IMAGE, payload.clone()),
            (FIELD_MOVING_IMAGE, payload.clone()),
            (FIELD_MOVING_LABEL, payload.clone()),
            (FIELD_FIXED_LABEL, payload.clone()),
            (FIELD_INDICES, payload.clone()),
        ];
        let bytes = write_record(&fields);
        let result = decode_sample(&bytes, &test_shapes());
        assert!(matches!(result, Err(RegShardError::RecordFormat(_))));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let payload = vec![0u8; 8];
        let fields: [(&str, Vec<u8>); 5] = [
            (FIELD_MOVING_IMAGE, payload.clone()),
            (FIELD_FIXED_IMAGE, payload.clone()),
            (FIELD_MOVING_LABEL, payload.clone()),
            (FIELD_FIXED_LABEL, payload.clone()),
            ("warp_field", payload.clone()),
        ];
        let bytes = write_record(&fields);
        let result = decode_sample(&bytes, &test_shapes());
        assert!(matches!(result, Err(RegShardError::RecordFormat(_))));
    }

    #[test]
    fn test_payload_length_escaping_buffer_is_rejected() {
        let mut bytes = encode_sample(&test_sample(4.0));
        // Corrupt the first field's payload length (offset: magic 4 + ver 2
        // + count 2 + name_len 2 + "moving_image" 12) to something huge.
        let len_offset = 8 + 2 + FIELD_MOVING_IMAGE.len();
        bytes[len_offset..len_offset + 8].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(
            decode_sample(&bytes, &test_shapes()),
            Err(RegShardError::RecordFormat(_))
        ));
    }

    #[test]
    fn test_non_contiguous_arrays_encode_row_major() {
        // A transposed array keeps its data but loses standard layout; the
        // codec must still emit logical row-major order.
        let transposed = Array3::from_shape_fn((4, 3, 2), |(i, j, k)| (i * 100 + j * 10 + k) as f32)
            .reversed_axes(); // shape (2, 3, 4), non-standard strides
        assert!(transposed.as_slice().is_none());

        let mut sample = test_sample(5.0);
        sample.moving_image = transposed.clone();

        let decoded = decode_sample(&encode_sample(&sample), &test_shapes()).unwrap();
        assert_eq!(decoded.moving_image, transposed);
    }
}
