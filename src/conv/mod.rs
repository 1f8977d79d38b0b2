//! Convolution algorithm implementations.
//!
//! Both algorithms take flat `f32` slices in plane-major layout and support
//! "same" (implicit zero padding) and "valid" convolution with stride 1.

mod naive;
mod window;

pub use naive::conv2d_naive;
pub use window::{axis_spans, conv2d_window, AxisSpan};

use serde::Deserialize;
use tracing::trace;

/// Selects which convolution algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConvAlgorithm {
    /// Shifted-window accumulation, parallel over output planes.
    #[default]
    Window,
    /// Per-output-pixel reference implementation.
    Naive,
}

/// Dimensions of one convolution call.
///
/// Callers are expected to have validated that the output size matches
/// `padded`; the kernels only index within the sizes given here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvShape {
    pub in_planes: usize,
    pub in_h: usize,
    pub in_w: usize,
    pub out_planes: usize,
    pub out_h: usize,
    pub out_w: usize,
    pub kernel_h: usize,
    pub kernel_w: usize,
    pub padded: bool,
}

/// Dispatch convolution to the selected algorithm.
///
/// `kernel` is laid out `[out_plane][in_plane][ky][kx]`, `bias` has one value
/// per output plane. `output` is fully overwritten.
pub fn conv2d(
    algorithm: ConvAlgorithm,
    shape: &ConvShape,
    input: &[f32],
    kernel: &[f32],
    bias: &[f32],
    output: &mut [f32],
) {
    trace!(?algorithm, ?shape, "conv2d");
    match algorithm {
        ConvAlgorithm::Window => conv2d_window(shape, input, kernel, bias, output),
        ConvAlgorithm::Naive => conv2d_naive(shape, input, kernel, bias, output),
    }
}
