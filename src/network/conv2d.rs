use crate::conv::{conv2d, ConvAlgorithm, ConvShape};
use crate::error::{CnnError, Result};
use crate::loader::WeightProvider;
use crate::tensor::Tensor;

use super::activation::relu;

/// 2D convolution weights: `out_planes x in_planes` kernels of `kernel_h x kernel_w`
/// taps plus one bias per output plane.
///
/// Stride is 1 and kernel sizes are odd so that "same" padding is symmetric.
#[derive(Debug, Clone)]
pub struct Conv2d {
    out_planes: usize,
    in_planes: usize,
    kernel_h: usize,
    kernel_w: usize,
    kernel: Vec<f32>,
    bias: Vec<f32>,
    algorithm: ConvAlgorithm,
}

impl Conv2d {
    /// Zero-initialized weights.
    pub fn new(out_planes: usize, in_planes: usize, kernel_h: usize, kernel_w: usize) -> Result<Self> {
        Self::check_dims(out_planes, in_planes, kernel_h, kernel_w)?;
        Ok(Conv2d {
            out_planes,
            in_planes,
            kernel_h,
            kernel_w,
            kernel: vec![0.0; out_planes * in_planes * kernel_h * kernel_w],
            bias: vec![0.0; out_planes],
            algorithm: ConvAlgorithm::default(),
        })
    }

    pub fn with_weights(
        out_planes: usize,
        in_planes: usize,
        kernel_h: usize,
        kernel_w: usize,
        kernel: Vec<f32>,
        bias: Vec<f32>,
    ) -> Result<Self> {
        let mut conv = Self::new(out_planes, in_planes, kernel_h, kernel_w)?;
        conv.set_weights(kernel, bias)?;
        Ok(conv)
    }

    /// Use a different convolution algorithm for subsequent `convolve` calls.
    pub fn with_algorithm(mut self, algorithm: ConvAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    fn check_dims(out_planes: usize, in_planes: usize, kernel_h: usize, kernel_w: usize) -> Result<()> {
        if kernel_h % 2 == 0 || kernel_w % 2 == 0 {
            return Err(CnnError::InvalidKernelSize {
                height: kernel_h,
                width: kernel_w,
            });
        }
        if out_planes == 0 || in_planes == 0 {
            return Err(CnnError::shape(
                "conv2d planes",
                "non-zero input and output planes",
                format!("{} -> {}", in_planes, out_planes),
            ));
        }
        Ok(())
    }

    fn set_weights(&mut self, kernel: Vec<f32>, bias: Vec<f32>) -> Result<()> {
        if kernel.len() != self.kernel.len() {
            return Err(CnnError::shape("conv2d kernel", self.kernel.len(), kernel.len()));
        }
        if bias.len() != self.out_planes {
            return Err(CnnError::shape("conv2d bias", self.out_planes, bias.len()));
        }
        self.kernel = kernel;
        self.bias = bias;
        Ok(())
    }

    /// Replace kernel and bias with the buffers supplied for layer `name`.
    pub fn load(&mut self, provider: &mut dyn WeightProvider, name: &str) -> Result<()> {
        let (kernel, bias) = provider.provide(name, self.kernel.len(), self.out_planes)?;
        self.set_weights(kernel, bias)
    }

    pub fn out_planes(&self) -> usize {
        self.out_planes
    }

    pub fn in_planes(&self) -> usize {
        self.in_planes
    }

    /// `(kernel_h, kernel_w)`.
    pub fn kernel_size(&self) -> (usize, usize) {
        (self.kernel_h, self.kernel_w)
    }

    pub fn algorithm(&self) -> ConvAlgorithm {
        self.algorithm
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

    pub fn kernel_value(&self, out_plane: usize, in_plane: usize, ky: usize, kx: usize) -> f32 {
        let idx = self.kernel_h * self.kernel_w * (self.in_planes * out_plane + in_plane)
            + self.kernel_w * ky
            + kx;
        self.kernel[idx]
    }

    /// Spatial size of the output for an `in_h x in_w` input.
    ///
    /// Padded convolution keeps the size; valid convolution shrinks each axis
    /// by `kernel - 1` and fails if nothing is left.
    pub fn output_dims(&self, in_h: usize, in_w: usize, padded: bool) -> Result<(usize, usize)> {
        if padded {
            return Ok((in_h, in_w));
        }
        let shrink_h = 2 * (self.kernel_h / 2);
        let shrink_w = 2 * (self.kernel_w / 2);
        match (in_h.checked_sub(shrink_h), in_w.checked_sub(shrink_w)) {
            (Some(h), Some(w)) if h > 0 && w > 0 => Ok((h, w)),
            _ => Err(CnnError::shape(
                "conv2d input size",
                format!("at least {}x{}", self.kernel_h, self.kernel_w),
                format!("{}x{}", in_h, in_w),
            )),
        }
    }

    /// Convolve `input` into `output`, overwriting it.
    ///
    /// With `padded` the output has the input's spatial size and samples outside
    /// the input count as zero; otherwise only fully covered positions are
    /// produced. All shape checks run before `output` is touched.
    pub fn convolve(&self, output: &mut Tensor, input: &Tensor, padded: bool) -> Result<()> {
        if output.planes() != self.out_planes {
            return Err(CnnError::shape("conv2d output planes", self.out_planes, output.planes()));
        }
        if input.planes() != self.in_planes {
            return Err(CnnError::shape("conv2d input planes", self.in_planes, input.planes()));
        }
        let (out_h, out_w) = self.output_dims(input.height(), input.width(), padded)?;
        if output.height() != out_h || output.width() != out_w {
            return Err(CnnError::shape(
                "conv2d output size",
                format!("{}x{}", out_h, out_w),
                format!("{}x{}", output.height(), output.width()),
            ));
        }

        let shape = ConvShape {
            in_planes: self.in_planes,
            in_h: input.height(),
            in_w: input.width(),
            out_planes: self.out_planes,
            out_h,
            out_w,
            kernel_h: self.kernel_h,
            kernel_w: self.kernel_w,
            padded,
        };
        conv2d(
            self.algorithm,
            &shape,
            input.as_slice(),
            &self.kernel,
            &self.bias,
            output.as_mut_slice(),
        );
        Ok(())
    }

    /// Clamp every cell to `max(0, v)` in place.
    pub fn apply_relu(tensor: &mut Tensor) {
        relu(tensor.as_mut_slice());
    }
}
