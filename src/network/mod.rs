/// Elementwise activations shared by the layer types.
mod activation;
/// Convolution weights and the `convolve` entry point.
mod conv2d;
/// Fully-connected weights and the `compute` entry point.
mod dense;
/// Pipeline layers (Conv2d, Linear, MaxPool2d, ReLu, SoftMax, Flatten).
mod layers;
/// Max pooling.
mod pool;

pub use activation::{relu, softmax};
pub use conv2d::Conv2d;
pub use dense::{top_n, Dense};
pub use layers::*;
pub use pool::{max_pool, pool_output_dims};

use std::fmt;
use std::time::{Duration, Instant};

use rayon::ThreadPool;
use tracing::{debug, info};

use crate::config::RuntimeConfig;
use crate::error::{CnnError, Result};
use crate::loader::WeightProvider;
use crate::tensor::Tensor;

/// Identifies the type of a neural network layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerType {
    Conv2d,
    Conv2dReLu,
    Linear,
    LinearReLu,
    MaxPool2d,
    ReLu,
    SoftMax,
    Flatten,
}

impl LayerType {
    pub fn label(&self) -> &'static str {
        match self {
            LayerType::Conv2d => "Conv2d",
            LayerType::Conv2dReLu => "Conv2d+ReLu",
            LayerType::Linear => "Linear",
            LayerType::LinearReLu => "Linear+ReLu",
            LayerType::MaxPool2d => "MaxPool2d",
            LayerType::ReLu => "ReLu",
            LayerType::SoftMax => "SoftMax",
            LayerType::Flatten => "Flatten",
        }
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Data passed between layers: planes before flattening, flat cells after.
#[derive(Clone, Debug, PartialEq)]
pub enum Activation {
    Planes(Tensor),
    Cells(Vec<f32>),
}

impl Activation {
    pub fn len(&self) -> usize {
        match self {
            Activation::Planes(t) => t.len(),
            Activation::Cells(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_planes(&self) -> Option<&Tensor> {
        match self {
            Activation::Planes(t) => Some(t),
            Activation::Cells(_) => None,
        }
    }

    pub fn as_cells(&self) -> Option<&[f32]> {
        match self {
            Activation::Cells(c) => Some(c.as_slice()),
            Activation::Planes(_) => None,
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activation::Planes(t) => write!(f, "{}", t),
            Activation::Cells(c) => write!(f, "{}", c.len()),
        }
    }
}

impl From<Tensor> for Activation {
    fn from(t: Tensor) -> Self {
        Activation::Planes(t)
    }
}

impl From<Vec<f32>> for Activation {
    fn from(c: Vec<f32>) -> Self {
        Activation::Cells(c)
    }
}

/// A stage of a [`NeuralNetwork`].
///
/// `forward` reads its input without modifying it and returns a freshly
/// allocated output. Shape problems are reported before any work is done.
pub trait Layer: Send + Sync {
    fn layer_type(&self) -> LayerType;

    /// Name used to look up weights. Weightless layers use their type label.
    fn name(&self) -> &str {
        self.layer_type().label()
    }

    fn forward(&self, input: &Activation) -> Result<Activation>;

    fn load_weights(&mut self, _provider: &mut dyn WeightProvider) -> Result<()> {
        Ok(())
    }

    /// Number of `f32` weights and biases held by the layer.
    fn weight_count(&self) -> usize {
        0
    }
}

/// A FP32 neural network composed of sequential layers.
///
/// Layers run strictly in order; parallelism is inside each layer and uses the
/// thread pool configured in [`RuntimeConfig`].
pub struct NeuralNetwork {
    config: RuntimeConfig,
    pool: Option<ThreadPool>,
    layers: Vec<Box<dyn Layer>>,
}

impl NeuralNetwork {
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let pool = config.build_pool()?;
        Ok(NeuralNetwork {
            config,
            pool,
            layers: Vec::new(),
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn add(&mut self, layer: Box<dyn Layer>) {
        self.layers.push(layer);
    }

    /// Fill every layer's weights from `provider`, in network order.
    pub fn load(&mut self, provider: &mut dyn WeightProvider) -> Result<()> {
        for layer in self.layers.iter_mut() {
            layer.load_weights(provider)?;
            if layer.weight_count() > 0 {
                debug!(layer = layer.name(), weights = layer.weight_count(), "loaded weights");
            }
        }
        info!(
            layers = self.layers.len(),
            weights = self.weight_count(),
            "network weights loaded"
        );
        Ok(())
    }

    fn install<T: Send>(&self, f: impl FnOnce() -> T + Send) -> T {
        match &self.pool {
            Some(pool) => pool.install(f),
            None => f(),
        }
    }

    fn run_layer(&self, idx: usize, layer: &dyn Layer, input: &Activation) -> Result<Activation> {
        let output = layer.forward(input)?;
        if self.config.debug {
            info!(idx, layer = layer.name(), kind = %layer.layer_type(), output = %output, "forward");
        } else {
            debug!(idx, layer = layer.name(), kind = %layer.layer_type(), output = %output, "forward");
        }
        Ok(output)
    }

    /// Run every layer on `input` and return the final activation.
    pub fn forward(&self, input: Activation) -> Result<Activation> {
        self.install(|| -> Result<Activation> {
            let mut cur = input;
            for (idx, layer) in self.layers.iter().enumerate() {
                cur = self.run_layer(idx, layer.as_ref(), &cur)?;
            }
            Ok(cur)
        })
    }

    /// Run the network and return the final flat output (e.g. class probabilities).
    pub fn predict(&self, input: Tensor) -> Result<Vec<f32>> {
        match self.forward(Activation::Planes(input))? {
            Activation::Cells(cells) => Ok(cells),
            Activation::Planes(t) => Err(CnnError::shape("network output", "flat cells", format!("planes {}", t))),
        }
    }

    /// Outputs of every layer, in order.
    pub fn predict_with_intermediates(&self, input: Tensor) -> Result<Vec<Activation>> {
        self.install(|| -> Result<Vec<Activation>> {
            let mut intermediates = Vec::with_capacity(self.layers.len());
            let mut cur = Activation::Planes(input);
            for (idx, layer) in self.layers.iter().enumerate() {
                cur = self.run_layer(idx, layer.as_ref(), &cur)?;
                intermediates.push(cur.clone());
            }
            Ok(intermediates)
        })
    }

    /// Outputs of every layer plus how long each layer took.
    pub fn predict_timed(&self, input: Tensor) -> Result<(Vec<Activation>, Vec<(LayerType, Duration)>)> {
        self.install(|| -> Result<(Vec<Activation>, Vec<(LayerType, Duration)>)> {
            let mut timings = Vec::with_capacity(self.layers.len());
            let mut intermediates = Vec::with_capacity(self.layers.len());
            let mut cur = Activation::Planes(input);
            for (idx, layer) in self.layers.iter().enumerate() {
                let start = Instant::now();
                cur = self.run_layer(idx, layer.as_ref(), &cur)?;
                timings.push((layer.layer_type(), start.elapsed()));
                intermediates.push(cur.clone());
            }
            Ok((intermediates, timings))
        })
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn weight_count(&self) -> usize {
        self.layers.iter().map(|l| l.weight_count()).sum()
    }

    /// Bytes of weights and biases per layer.
    pub fn layer_weight_memory(&self) -> Vec<usize> {
        self.layers.iter().map(|l| l.weight_count() * 4).collect()
    }
}
