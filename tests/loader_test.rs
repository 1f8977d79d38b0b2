use std::fs::File;
use std::io::{Cursor, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use microvgg::config::RuntimeConfig;
use microvgg::loader::{read_floats, DirWeights, StreamWeights, WeightProvider, ZeroWeights};
use microvgg::network::{Conv2d, Conv2dLayer, Dense, LinearLayer, NeuralNetwork, FlattenLayer};
use microvgg::tensor::Tensor;
use microvgg::CnnError;

fn le_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn write_file(path: &Path, bytes: &[u8]) {
    File::create(path).unwrap().write_all(bytes).unwrap();
}

#[test]
fn read_floats_decodes_little_endian() {
    let bytes = le_bytes(&[1.0, -0.5, 1e-3]);
    let values = read_floats(&mut Cursor::new(bytes), 3, "test").unwrap();
    assert_eq!(values, vec![1.0, -0.5, 1e-3]);
}

#[test]
fn read_floats_ignores_trailing_bytes() {
    let mut bytes = le_bytes(&[2.0, 3.0, 4.0]);
    bytes.push(0xff);
    let mut cursor = Cursor::new(bytes);
    assert_eq!(read_floats(&mut cursor, 2, "test").unwrap(), vec![2.0, 3.0]);
    // The reader is left right after the requested floats.
    assert_eq!(cursor.position(), 8);
}

#[test]
fn read_floats_truncated() {
    let mut bytes = le_bytes(&[1.0, 2.0]);
    bytes.extend_from_slice(&[0, 0]);
    match read_floats(&mut Cursor::new(bytes), 3, "bias").unwrap_err() {
        CnnError::TruncatedInput { what, expected, actual } => {
            assert_eq!(what, "bias");
            assert_eq!(expected, 3);
            assert_eq!(actual, 2);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn dir_weights_reads_layer_files() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir.path().join("block1_conv1_k.bin"), &le_bytes(&[1.0; 9]));
    write_file(&dir.path().join("block1_conv1_b.bin"), &le_bytes(&[0.25]));

    let mut conv = Conv2d::new(1, 1, 3, 3).unwrap();
    conv.load(&mut DirWeights::new(dir.path()), "block1_conv1").unwrap();
    assert_eq!(conv.kernel(), &[1.0; 9]);
    assert_eq!(conv.bias(), &[0.25]);
}

#[test]
fn dir_weights_falls_back_to_gzip() {
    let dir = tempfile::tempdir().unwrap();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&le_bytes(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])).unwrap();
    write_file(&dir.path().join("fc1_k.bin.gz"), &encoder.finish().unwrap());
    write_file(&dir.path().join("fc1_b.bin"), &le_bytes(&[-1.0, 1.0]));

    let mut dense = Dense::new(2, 3).unwrap();
    dense.load(&mut DirWeights::new(dir.path()), "fc1").unwrap();
    let mut out = vec![0.0; 2];
    dense.compute(&mut out, &[1.0, 1.0, 1.0]).unwrap();
    assert_eq!(out, vec![5.0, 16.0]);
}

#[test]
fn dir_weights_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = DirWeights::new(dir.path()).provide("nope", 4, 1).unwrap_err();
    match err {
        CnnError::Io { what, .. } => assert!(what.ends_with("nope_k.bin"), "{}", what),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn dir_weights_short_file_is_truncated() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir.path().join("fc_k.bin"), &le_bytes(&[1.0; 5]));
    write_file(&dir.path().join("fc_b.bin"), &le_bytes(&[0.0; 2]));
    let mut dense = Dense::new(2, 3).unwrap();
    let err = dense.load(&mut DirWeights::new(dir.path()), "fc").unwrap_err();
    assert!(matches!(err, CnnError::TruncatedInput { expected: 6, actual: 5, .. }));
    // Weights stay as they were.
    assert!(dense.kernel().iter().all(|&w| w == 0.0));
}

#[test]
fn stream_weights_loads_layers_in_order() {
    let mut bytes = Vec::new();
    bytes.extend(le_bytes(&[1.0; 9]));
    bytes.extend(le_bytes(&[0.5]));
    bytes.extend(le_bytes(&[2.0; 4]));
    bytes.extend(le_bytes(&[-1.0]));

    let mut net = NeuralNetwork::new(RuntimeConfig::default()).unwrap();
    net.add(Box::new(Conv2dLayer::new("conv", 1, 1, 3, false).unwrap()));
    net.add(Box::new(FlattenLayer::new()));
    net.add(Box::new(LinearLayer::new("fc", 4, 1).unwrap()));
    net.load(&mut StreamWeights::new(Cursor::new(bytes))).unwrap();

    let mut input = Tensor::new(1, 4, 4);
    input.fill(1.0);
    // conv: 9 + 0.5 per cell over 2x2, fc: 2 * 4 * 9.5 - 1
    assert_eq!(net.predict(input).unwrap(), vec![75.0]);
}

#[test]
fn stream_weights_truncated_stream() {
    let mut provider = StreamWeights::new(Cursor::new(le_bytes(&[1.0; 9])));
    let err = provider.provide("conv", 9, 1).unwrap_err();
    assert!(matches!(err, CnnError::TruncatedInput { expected: 1, actual: 0, .. }));
}

#[test]
fn zero_weights_lengths() {
    let (kernel, bias) = ZeroWeights.provide("any", 12, 3).unwrap();
    assert_eq!(kernel.len(), 12);
    assert_eq!(bias, vec![0.0; 3]);
}

struct ShortProvider;

impl WeightProvider for ShortProvider {
    fn provide(&mut self, _layer: &str, kernel_len: usize, bias_len: usize) -> microvgg::Result<(Vec<f32>, Vec<f32>)> {
        Ok((vec![1.0; kernel_len - 1], vec![0.0; bias_len]))
    }
}

#[test]
fn provider_with_wrong_length_is_rejected() {
    let mut conv = Conv2d::new(2, 1, 3, 3).unwrap();
    let err = conv.load(&mut ShortProvider, "conv").unwrap_err();
    assert!(matches!(err, CnnError::ShapeMismatch { .. }));
}
