//! A minimal VGG-style CNN inference engine in Rust.
//!
//! This crate provides FP32 building blocks for running convolutional neural
//! networks forward: a plane-major [`Tensor`], a padded/unpadded 2D convolution
//! parallelized over output planes, max pooling, dense layers, and a sequential
//! [`NeuralNetwork`]. It includes a VGG16 builder whose layer names match the
//! per-layer weight files exported from Keras.
//!
//! # Example
//!
//! ```no_run
//! use microvgg::config::RuntimeConfig;
//! use microvgg::loader::DirWeights;
//! use microvgg::vgg16::{preprocess_rgb8, vgg16};
//! use microvgg::network::top_n;
//!
//! # fn main() -> microvgg::Result<()> {
//! let mut net = vgg16(RuntimeConfig::default())?;
//! net.load(&mut DirWeights::new("weights"))?;
//! let pixels = vec![0u8; 224 * 224 * 3];
//! let probs = net.predict(preprocess_rgb8(&pixels, 224, 224)?)?;
//! for (class, p) in top_n(&probs, 5) {
//!     println!("{}: {:.4}", class, p);
//! }
//! # Ok(())
//! # }
//! ```

/// Error type shared by every module.
pub mod error;
/// Runtime configuration (thread pool, algorithm, debug logging).
pub mod config;
/// FP32 plane-major tensor.
pub mod tensor;
/// Convolution kernels over flat slices.
pub mod conv;
/// Layers and sequential networks.
pub mod network;
/// Weight providers and the raw float decoder.
pub mod loader;
/// Network builders.
pub mod arc;

pub use arc::vgg16;
pub use error::{CnnError, Result};
pub use network::NeuralNetwork;
pub use tensor::Tensor;
