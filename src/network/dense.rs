use rayon::prelude::*;

use crate::error::{CnnError, Result};
use crate::loader::WeightProvider;

use super::activation::{relu, softmax};

/// Fully-connected layer: `out_cells x in_cells` weights, row-major by output
/// cell, and one bias per output cell.
#[derive(Debug, Clone)]
pub struct Dense {
    out_cells: usize,
    in_cells: usize,
    kernel: Vec<f32>,
    bias: Vec<f32>,
}

impl Dense {
    /// Zero-initialized weights.
    pub fn new(out_cells: usize, in_cells: usize) -> Result<Self> {
        if out_cells == 0 || in_cells == 0 {
            return Err(CnnError::shape(
                "dense cells",
                "non-zero input and output cells",
                format!("{} -> {}", in_cells, out_cells),
            ));
        }
        Ok(Dense {
            out_cells,
            in_cells,
            kernel: vec![0.0; out_cells * in_cells],
            bias: vec![0.0; out_cells],
        })
    }

    pub fn with_weights(out_cells: usize, in_cells: usize, kernel: Vec<f32>, bias: Vec<f32>) -> Result<Self> {
        let mut dense = Self::new(out_cells, in_cells)?;
        dense.set_weights(kernel, bias)?;
        Ok(dense)
    }

    fn set_weights(&mut self, kernel: Vec<f32>, bias: Vec<f32>) -> Result<()> {
        if kernel.len() != self.kernel.len() {
            return Err(CnnError::shape("dense kernel", self.kernel.len(), kernel.len()));
        }
        if bias.len() != self.out_cells {
            return Err(CnnError::shape("dense bias", self.out_cells, bias.len()));
        }
        self.kernel = kernel;
        self.bias = bias;
        Ok(())
    }

    pub fn load(&mut self, provider: &mut dyn WeightProvider, name: &str) -> Result<()> {
        let (kernel, bias) = provider.provide(name, self.kernel.len(), self.out_cells)?;
        self.set_weights(kernel, bias)
    }

    pub fn out_cells(&self) -> usize {
        self.out_cells
    }

    pub fn in_cells(&self) -> usize {
        self.in_cells
    }

    pub fn kernel(&self) -> &[f32] {
        &self.kernel
    }

    pub fn bias(&self) -> &[f32] {
        &self.bias
    }

    pub fn weight_count(&self) -> usize {
        self.kernel.len() + self.bias.len()
    }

    /// `output[i] = bias[i] + sum_j kernel[i][j] * input[j]`, one task per output cell.
    pub fn compute(&self, output: &mut [f32], input: &[f32]) -> Result<()> {
        if output.len() != self.out_cells {
            return Err(CnnError::shape("dense output", self.out_cells, output.len()));
        }
        if input.len() != self.in_cells {
            return Err(CnnError::shape("dense input", self.in_cells, input.len()));
        }

        output
            .par_iter_mut()
            .zip(self.kernel.par_chunks(self.in_cells))
            .zip(self.bias.par_iter())
            .for_each(|((out, row), b)| {
                let mut sum = 0.0f32;
                for (w, x) in row.iter().zip(input) {
                    sum += w * x;
                }
                *out = sum + b;
            });
        Ok(())
    }

    pub fn apply_relu(cells: &mut [f32]) {
        relu(cells);
    }

    pub fn apply_softmax(cells: &mut [f32]) {
        softmax(cells);
    }
}

/// The `n` largest cells as `(index, value)`, largest first. Ties keep index order.
pub fn top_n(cells: &[f32], n: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = cells.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(n);
    ranked
}
