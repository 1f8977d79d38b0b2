/// Weight sources for convolution and dense layers.
mod weights;

pub use weights::{read_floats, DirWeights, StreamWeights, WeightProvider, ZeroWeights};
