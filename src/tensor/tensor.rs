use std::fmt;
use std::io::Read;

use crate::error::{CnnError, Result};
use crate::loader::read_floats;

/// Activations of one network layer, stored as planes of `height x width` cells.
///
/// Layout is plane-major and row-major inside each plane:
/// `index = width * (height * plane + y) + x`. The shape is fixed at
/// construction; compute calls only overwrite the contents.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    planes: usize,
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl Tensor {
    /// Zero-filled tensor.
    ///
    /// # Panics
    /// If any dimension is zero.
    pub fn new(planes: usize, height: usize, width: usize) -> Self {
        assert!(
            planes > 0 && height > 0 && width > 0,
            "tensor dimensions must be non-zero, got {}x{}x{}",
            planes,
            height,
            width
        );
        Tensor {
            planes,
            height,
            width,
            data: vec![0.0; planes * height * width],
        }
    }

    /// Wraps an existing buffer laid out as `(plane, y, x)`.
    pub fn from_vec(planes: usize, height: usize, width: usize, data: Vec<f32>) -> Result<Self> {
        if planes == 0 || height == 0 || width == 0 {
            return Err(CnnError::shape(
                "tensor dimensions",
                "non-zero planes, height and width",
                format!("{}x{}x{}", planes, height, width),
            ));
        }
        let expected = planes * height * width;
        if data.len() != expected {
            return Err(CnnError::shape("tensor buffer", expected, data.len()));
        }
        Ok(Tensor {
            planes,
            height,
            width,
            data,
        })
    }

    pub fn planes(&self) -> usize {
        self.planes
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// `(planes, height, width)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.planes, self.height, self.width)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; a tensor has at least one cell.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of cells in one plane.
    pub fn plane_len(&self) -> usize {
        self.height * self.width
    }

    #[inline]
    fn index(&self, plane: usize, y: usize, x: usize) -> usize {
        debug_assert!(plane < self.planes && y < self.height && x < self.width);
        self.width * (self.height * plane + y) + x
    }

    #[inline]
    pub fn get(&self, plane: usize, y: usize, x: usize) -> f32 {
        self.data[self.index(plane, y, x)]
    }

    #[inline]
    pub fn set(&mut self, plane: usize, y: usize, x: usize, val: f32) {
        let idx = self.index(plane, y, x);
        self.data[idx] = val;
    }

    pub fn fill(&mut self, val: f32) {
        self.data.fill(val);
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Cells of a single plane, row-major.
    pub fn plane(&self, plane: usize) -> &[f32] {
        let len = self.plane_len();
        &self.data[plane * len..(plane + 1) * len]
    }

    pub fn plane_mut(&mut self, plane: usize) -> &mut [f32] {
        let len = self.plane_len();
        &mut self.data[plane * len..(plane + 1) * len]
    }

    /// Writes the cells into `dest` in `(y, x, plane)` order, plane varying fastest.
    ///
    /// This is the channel-last order dense layers are trained against, not the
    /// plane-major order used for storage.
    pub fn flatten(&self, dest: &mut [f32]) -> Result<()> {
        if dest.len() != self.data.len() {
            return Err(CnnError::shape("flatten destination", self.data.len(), dest.len()));
        }
        self.write_flat(dest);
        Ok(())
    }

    pub fn flatten_to_vec(&self) -> Vec<f32> {
        let mut dest = vec![0.0; self.data.len()];
        self.write_flat(&mut dest);
        dest
    }

    fn write_flat(&self, dest: &mut [f32]) {
        let plane_len = self.plane_len();
        let mut idx = 0;
        for pos in 0..plane_len {
            for plane in 0..self.planes {
                dest[idx] = self.data[plane * plane_len + pos];
                idx += 1;
            }
        }
    }

    /// Overwrites every cell from a stream of little-endian `f32` values.
    ///
    /// Fails with `TruncatedInput` if the stream ends early; extra bytes are not read.
    pub fn load_cells<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        let cells = read_floats(reader, self.data.len(), "tensor cells")?;
        self.data.copy_from_slice(&cells);
        Ok(())
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.planes, self.height, self.width)
    }
}
