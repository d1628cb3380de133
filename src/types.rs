//! This module defines the core data representations shared by the writer and
//! loader: one registration training example (`Sample`) and the externally
//! supplied decode metadata (`SampleShapes`).
//!
//! Shape information is deliberately NOT part of the serialized record; it
//! travels out-of-band and must be identical on both sides of a round trip.

use ndarray::{Array1, Array3};
use serde::{Deserialize, Serialize};

/// One paired registration training example.
///
/// The moving/fixed images are 3-D volumes; each label shares the shape of its
/// image. `indices` is a flat vector identifying the example within its source
/// dataset. Every field is stored at 32-bit float precision regardless of the
/// precision it was produced at (see `kernels::cast::array_to_f32`).
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub moving_image: Array3<f32>,
    pub fixed_image: Array3<f32>,
    pub moving_label: Array3<f32>,
    pub fixed_label: Array3<f32>,
    pub indices: Array1<f32>,
}

impl Sample {
    /// Returns the decode metadata describing this sample's dimensions.
    pub fn shapes(&self) -> SampleShapes {
        let m = self.moving_image.dim();
        let f = self.fixed_image.dim();
        SampleShapes {
            moving_image: [m.0, m.1, m.2],
            fixed_image: [f.0, f.1, f.2],
            num_indices: self.indices.len(),
        }
    }
}

/// The out-of-band shape metadata required to reinterpret the flat byte
/// buffers of a record. The moving label reuses the moving image shape and
/// the fixed label reuses the fixed image shape.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleShapes {
    pub moving_image: [usize; 3],
    pub fixed_image: [usize; 3],
    pub num_indices: usize,
}
