use crate::conv::ConvAlgorithm;
use crate::error::{CnnError, Result};
use crate::loader::WeightProvider;
use crate::tensor::Tensor;

use super::activation::{relu, softmax};
use super::pool::{max_pool, pool_output_dims};
use super::{Activation, Conv2d, Dense, Layer, LayerType};

fn expect_planes<'a>(what: &'static str, input: &'a Activation) -> Result<&'a Tensor> {
    match input {
        Activation::Planes(t) => Ok(t),
        Activation::Cells(c) => Err(CnnError::shape(what, "planes", format!("{} flat cells", c.len()))),
    }
}

fn expect_cells<'a>(what: &'static str, input: &'a Activation) -> Result<&'a [f32]> {
    match input {
        Activation::Cells(c) => Ok(c.as_slice()),
        Activation::Planes(t) => Err(CnnError::shape(what, "flat cells", format!("planes {}", t))),
    }
}

/// 2D convolution layer, optionally fused with ReLU.
pub struct Conv2dLayer {
    name: String,
    conv: Conv2d,
    padded: bool,
    relu: bool,
}

impl Conv2dLayer {
    pub fn new(
        name: impl Into<String>,
        out_planes: usize,
        in_planes: usize,
        kernel_size: usize,
        padded: bool,
    ) -> Result<Self> {
        Ok(Self::from_conv(
            name,
            Conv2d::new(out_planes, in_planes, kernel_size, kernel_size)?,
            padded,
            false,
        ))
    }

    /// Convolution followed by ReLU in the same layer.
    pub fn with_relu(
        name: impl Into<String>,
        out_planes: usize,
        in_planes: usize,
        kernel_size: usize,
        padded: bool,
    ) -> Result<Self> {
        Ok(Self::from_conv(
            name,
            Conv2d::new(out_planes, in_planes, kernel_size, kernel_size)?,
            padded,
            true,
        ))
    }

    pub fn from_conv(name: impl Into<String>, conv: Conv2d, padded: bool, relu: bool) -> Self {
        Conv2dLayer {
            name: name.into(),
            conv,
            padded,
            relu,
        }
    }

    pub fn with_algorithm(mut self, algorithm: ConvAlgorithm) -> Self {
        self.conv = self.conv.with_algorithm(algorithm);
        self
    }

    pub fn conv(&self) -> &Conv2d {
        &self.conv
    }

    pub fn padded(&self) -> bool {
        self.padded
    }
}

impl Layer for Conv2dLayer {
    fn layer_type(&self) -> LayerType {
        if self.relu {
            LayerType::Conv2dReLu
        } else {
            LayerType::Conv2d
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, input: &Activation) -> Result<Activation> {
        let input = expect_planes("conv2d input", input)?;
        let (out_h, out_w) = self.conv.output_dims(input.height(), input.width(), self.padded)?;
        let mut output = Tensor::new(self.conv.out_planes(), out_h, out_w);
        self.conv.convolve(&mut output, input, self.padded)?;
        if self.relu {
            Conv2d::apply_relu(&mut output);
        }
        Ok(Activation::Planes(output))
    }

    fn load_weights(&mut self, provider: &mut dyn WeightProvider) -> Result<()> {
        self.conv.load(provider, &self.name)
    }

    fn weight_count(&self) -> usize {
        self.conv.weight_count()
    }
}

/// Fully-connected layer, optionally fused with ReLU.
pub struct LinearLayer {
    name: String,
    dense: Dense,
    relu: bool,
}

impl LinearLayer {
    pub fn new(name: impl Into<String>, in_cells: usize, out_cells: usize) -> Result<Self> {
        Ok(Self::from_dense(name, Dense::new(out_cells, in_cells)?, false))
    }

    pub fn with_relu(name: impl Into<String>, in_cells: usize, out_cells: usize) -> Result<Self> {
        Ok(Self::from_dense(name, Dense::new(out_cells, in_cells)?, true))
    }

    pub fn from_dense(name: impl Into<String>, dense: Dense, relu: bool) -> Self {
        LinearLayer {
            name: name.into(),
            dense,
            relu,
        }
    }

    pub fn dense(&self) -> &Dense {
        &self.dense
    }
}

impl Layer for LinearLayer {
    fn layer_type(&self) -> LayerType {
        if self.relu {
            LayerType::LinearReLu
        } else {
            LayerType::Linear
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, input: &Activation) -> Result<Activation> {
        let input = expect_cells("linear input", input)?;
        let mut output = vec![0.0; self.dense.out_cells()];
        self.dense.compute(&mut output, input)?;
        if self.relu {
            Dense::apply_relu(&mut output);
        }
        Ok(Activation::Cells(output))
    }

    fn load_weights(&mut self, provider: &mut dyn WeightProvider) -> Result<()> {
        self.dense.load(provider, &self.name)
    }

    fn weight_count(&self) -> usize {
        self.dense.weight_count()
    }
}

/// 2D max pooling layer with stride equal to the window size.
pub struct MaxPool2dLayer {
    pool_size: usize,
}

impl MaxPool2dLayer {
    pub fn new(pool_size: usize) -> Self {
        MaxPool2dLayer { pool_size }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }
}

impl Layer for MaxPool2dLayer {
    fn layer_type(&self) -> LayerType {
        LayerType::MaxPool2d
    }

    fn forward(&self, input: &Activation) -> Result<Activation> {
        let input = expect_planes("max_pool input", input)?;
        let (out_h, out_w) = pool_output_dims(input.height(), input.width(), self.pool_size)?;
        if out_h == 0 || out_w == 0 {
            return Err(CnnError::shape(
                "max_pool input size",
                format!("at least {0}x{0}", self.pool_size),
                format!("{}x{}", input.height(), input.width()),
            ));
        }
        let mut output = Tensor::new(input.planes(), out_h, out_w);
        max_pool(&mut output, input, self.pool_size)?;
        Ok(Activation::Planes(output))
    }
}

/// ReLU activation layer. Accepts planes or flat cells.
#[derive(Default)]
pub struct ReLuLayer;

impl ReLuLayer {
    pub fn new() -> Self {
        ReLuLayer
    }
}

impl Layer for ReLuLayer {
    fn layer_type(&self) -> LayerType {
        LayerType::ReLu
    }

    fn forward(&self, input: &Activation) -> Result<Activation> {
        let mut output = input.clone();
        match &mut output {
            Activation::Planes(t) => relu(t.as_mut_slice()),
            Activation::Cells(c) => relu(c),
        }
        Ok(output)
    }
}

/// Softmax activation layer over flat cells.
#[derive(Default)]
pub struct SoftMaxLayer;

impl SoftMaxLayer {
    pub fn new() -> Self {
        SoftMaxLayer
    }
}

impl Layer for SoftMaxLayer {
    fn layer_type(&self) -> LayerType {
        LayerType::SoftMax
    }

    fn forward(&self, input: &Activation) -> Result<Activation> {
        let mut output = expect_cells("softmax input", input)?.to_vec();
        softmax(&mut output);
        Ok(Activation::Cells(output))
    }
}

/// Flattens planes into `(y, x, plane)` order for the following dense layer.
#[derive(Default)]
pub struct FlattenLayer;

impl FlattenLayer {
    pub fn new() -> Self {
        FlattenLayer
    }
}

impl Layer for FlattenLayer {
    fn layer_type(&self) -> LayerType {
        LayerType::Flatten
    }

    fn forward(&self, input: &Activation) -> Result<Activation> {
        let input = expect_planes("flatten input", input)?;
        Ok(Activation::Cells(input.flatten_to_vec()))
    }
}
