use tracing::info;

use crate::config::RuntimeConfig;
use crate::error::{CnnError, Result};
use crate::network::*;
use crate::tensor::Tensor;

/// Spatial size of the VGG16 input image.
pub const VGG16_INPUT_SIZE: usize = 224;
/// Number of ImageNet categories predicted by VGG16.
pub const VGG16_CLASSES: usize = 1000;
/// Per-channel means subtracted from B, G and R.
pub const BGR_MEAN: [f32; 3] = [103.939, 116.779, 123.68];

/// Shape of a VGG-style network: blocks of 3x3 same-padded convolutions, each
/// block closed by a 2x2 max pool, then two hidden dense layers and a softmax
/// classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VggSpec {
    pub input_size: usize,
    pub in_planes: usize,
    /// `(convolutions, planes)` per block.
    pub blocks: Vec<(usize, usize)>,
    pub fc_cells: usize,
    pub classes: usize,
}

impl VggSpec {
    pub fn vgg16() -> Self {
        VggSpec {
            input_size: VGG16_INPUT_SIZE,
            in_planes: 3,
            blocks: vec![(2, 64), (2, 128), (3, 256), (3, 512), (3, 512)],
            fc_cells: 4096,
            classes: VGG16_CLASSES,
        }
    }

    /// `(planes, height, width)` expected by the first layer.
    pub fn input_shape(&self) -> (usize, usize, usize) {
        (self.in_planes, self.input_size, self.input_size)
    }

    /// Length of the flattened feature vector fed to `fc1`.
    pub fn feature_cells(&self) -> Result<usize> {
        let mut side = self.input_size;
        let mut planes = self.in_planes;
        for &(_, width) in &self.blocks {
            side /= 2;
            planes = width;
        }
        if side == 0 {
            return Err(CnnError::shape(
                "vgg input size",
                format!("at least {}", 1usize << self.blocks.len()),
                self.input_size,
            ));
        }
        Ok(planes * side * side)
    }
}

/// Build a VGG-style network with zero weights; call
/// [`NeuralNetwork::load`] to fill them in.
///
/// Layer names follow the exported weight files: `block{b}_conv{c}`, `fc1`,
/// `fc2`, `predictions`.
pub fn vgg(spec: &VggSpec, config: RuntimeConfig) -> Result<NeuralNetwork> {
    let features = spec.feature_cells()?;
    let algorithm = config.algorithm;
    let mut net = NeuralNetwork::new(config)?;

    let mut planes = spec.in_planes;
    for (b, &(convs, width)) in spec.blocks.iter().enumerate() {
        for c in 0..convs {
            let name = format!("block{}_conv{}", b + 1, c + 1);
            let layer = Conv2dLayer::with_relu(name, width, planes, 3, true)?.with_algorithm(algorithm);
            net.add(Box::new(layer));
            planes = width;
        }
        net.add(Box::new(MaxPool2dLayer::new(2)));
    }

    net.add(Box::new(FlattenLayer::new()));
    net.add(Box::new(LinearLayer::with_relu("fc1", features, spec.fc_cells)?));
    net.add(Box::new(LinearLayer::with_relu("fc2", spec.fc_cells, spec.fc_cells)?));
    net.add(Box::new(LinearLayer::new("predictions", spec.fc_cells, spec.classes)?));
    net.add(Box::new(SoftMaxLayer::new()));

    info!(
        layers = net.num_layers(),
        weights = net.weight_count(),
        input = spec.input_size,
        classes = spec.classes,
        "built vgg network"
    );
    Ok(net)
}

/// Build VGG16 (13 convolutions, 3 dense layers) for 224x224 RGB input.
pub fn vgg16(config: RuntimeConfig) -> Result<NeuralNetwork> {
    vgg(&VggSpec::vgg16(), config)
}

/// Convert interleaved RGB bytes (row-major, 3 bytes per pixel) into a
/// 3-plane B, G, R tensor with [`BGR_MEAN`] subtracted.
pub fn preprocess_rgb8(pixels: &[u8], height: usize, width: usize) -> Result<Tensor> {
    if height == 0 || width == 0 || pixels.len() != height * width * 3 {
        return Err(CnnError::shape(
            "rgb8 image",
            format!("{} bytes for {}x{}", height * width * 3, height, width),
            pixels.len(),
        ));
    }
    let mut input = Tensor::new(3, height, width);
    for (idx, px) in pixels.chunks_exact(3).enumerate() {
        let (y, x) = (idx / width, idx % width);
        let (r, g, b) = (px[0] as f32, px[1] as f32, px[2] as f32);
        input.set(0, y, x, b - BGR_MEAN[0]);
        input.set(1, y, x, g - BGR_MEAN[1]);
        input.set(2, y, x, r - BGR_MEAN[2]);
    }
    Ok(input)
}
