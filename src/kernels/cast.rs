//! This module contains the pure, stateless kernels for numeric casting.
//!
//! Two concerns live here. The byte-level pair (`f32s_to_bytes` /
//! `bytes_to_f32s`) reinterprets flat f32 buffers as raw bytes and back; it
//! is the only place the record payload encoding is defined. The array-level
//! `array_to_f32` is the lossy normalization cast applied to producer data of
//! any primitive precision before encoding. This module is PURE RUST,
//! panic-free, and relies on `bytemuck` for safety.

use bytemuck::Pod;
use ndarray::{Array, Dimension};
use num_traits::AsPrimitive;

use crate::error::{RegShardError, Result};

/// Reinterprets a slice of f32 values as their raw bytes. This is a copy,
/// not a zero-copy view, so the result owns its buffer.
pub fn f32s_to_bytes(values: &[f32]) -> Vec<u8> {
    bytemuck::cast_slice(values).to_vec()
}

/// Reinterprets a raw byte buffer as the f32 values it encodes.
///
/// Fails with `BufferMismatch` when the buffer length is not a multiple of
/// four; alignment of the input is irrelevant because the values are copied
/// out.
pub fn bytes_to_f32s(bytes: &[u8]) -> Result<Vec<f32>> {
    let elem = std::mem::size_of::<f32>();
    if bytes.len() % elem != 0 {
        return Err(RegShardError::BufferMismatch(elem, bytes.len()));
    }
    Ok(bytemuck::pod_collect_to_vec(bytes))
}

/// Casts an array of any primitive numeric type to f32, element by element.
///
/// This is the "store everything at 32-bit precision" normalization step;
/// the cast is lossy for f64/i64 inputs by design of the storage schema.
pub fn array_to_f32<T, D>(array: &Array<T, D>) -> Array<f32, D>
where
    T: Pod + AsPrimitive<f32>,
    D: Dimension,
{
    array.mapv(|v| v.as_())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array3};

    #[test]
    fn test_f32_bytes_roundtrip() {
        let original: Vec<f32> = vec![1.0, -1.0, std::f32::consts::PI, 0.0, f32::MIN];
        let bytes = f32s_to_bytes(&original);
        assert_eq!(bytes.len(), original.len() * 4);

        let decoded = bytes_to_f32s(&bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_bytes_to_f32s_rejects_ragged_buffer() {
        let result = bytes_to_f32s(&[0u8, 1, 2, 3, 4]);
        assert!(matches!(result, Err(RegShardError::BufferMismatch(4, 5))));
    }

    #[test]
    fn test_bytes_to_f32s_empty_buffer() {
        assert!(bytes_to_f32s(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_array_to_f32_from_integers() {
        let ints = arr1(&[1i32, -2, 3]);
        let floats = array_to_f32(&ints);
        assert_eq!(floats, arr1(&[1.0f32, -2.0, 3.0]));
    }

    #[test]
    fn test_array_to_f32_narrows_f64() {
        let doubles = Array3::from_shape_fn((2, 2, 2), |(i, j, k)| (i + j + k) as f64 + 0.5);
        let floats = array_to_f32(&doubles);
        assert_eq!(floats.dim(), (2, 2, 2));
        assert_eq!(floats[[1, 1, 1]], 3.5f32);
    }
}
