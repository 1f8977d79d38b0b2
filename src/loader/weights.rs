use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::{CnnError, Result};

/// Supplies the kernel and bias buffers of a layer.
///
/// Implementations must return buffers of exactly `kernel_len` and `bias_len`
/// floats; layers reject anything else with `ShapeMismatch`.
pub trait WeightProvider {
    fn provide(
        &mut self,
        layer: &str,
        kernel_len: usize,
        bias_len: usize,
    ) -> Result<(Vec<f32>, Vec<f32>)>;
}

/// Reads `count` little-endian `f32` values from `reader`.
///
/// Returns `TruncatedInput` when the reader runs out first. Bytes past the
/// requested count are left unread.
pub fn read_floats<R: Read + ?Sized>(reader: &mut R, count: usize, what: &str) -> Result<Vec<f32>> {
    let byte_len = count * 4;
    let mut buf = Vec::with_capacity(byte_len);
    (&mut *reader)
        .take(byte_len as u64)
        .read_to_end(&mut buf)
        .map_err(|source| CnnError::Io {
            what: what.to_string(),
            source,
        })?;
    if buf.len() < byte_len {
        return Err(CnnError::TruncatedInput {
            what: what.to_string(),
            expected: count,
            actual: buf.len() / 4,
        });
    }
    Ok(buf
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// One pair of files per layer: `<name>_k.bin` and `<name>_b.bin`.
///
/// A gzip-compressed `<file>.gz` is used when the plain file is missing.
pub struct DirWeights {
    dir: PathBuf,
}

impl DirWeights {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirWeights { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_file(&self, file_name: &str, count: usize) -> Result<Vec<f32>> {
        let path = self.dir.join(file_name);
        match File::open(&path) {
            Ok(file) => read_floats(&mut BufReader::new(file), count, &path.display().to_string()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let gz_path = self.dir.join(format!("{}.gz", file_name));
                let file = File::open(&gz_path).map_err(|_| CnnError::Io {
                    what: path.display().to_string(),
                    source: err,
                })?;
                let mut decoder = GzDecoder::new(BufReader::new(file));
                read_floats(&mut decoder, count, &gz_path.display().to_string())
            }
            Err(source) => Err(CnnError::Io {
                what: path.display().to_string(),
                source,
            }),
        }
    }
}

impl WeightProvider for DirWeights {
    fn provide(
        &mut self,
        layer: &str,
        kernel_len: usize,
        bias_len: usize,
    ) -> Result<(Vec<f32>, Vec<f32>)> {
        let kernel = self.read_file(&format!("{}_k.bin", layer), kernel_len)?;
        let bias = self.read_file(&format!("{}_b.bin", layer), bias_len)?;
        debug!(layer, kernel_len, bias_len, dir = %self.dir.display(), "loaded layer weights");
        Ok((kernel, bias))
    }
}

/// All layers packed back to back in a single stream: kernel, then bias, per layer
/// in network order.
pub struct StreamWeights<R: Read> {
    reader: R,
}

impl<R: Read> StreamWeights<R> {
    pub fn new(reader: R) -> Self {
        StreamWeights { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl StreamWeights<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CnnError::Io {
            what: path.display().to_string(),
            source,
        })?;
        Ok(StreamWeights::new(BufReader::new(file)))
    }
}

impl<R: Read> WeightProvider for StreamWeights<R> {
    fn provide(
        &mut self,
        layer: &str,
        kernel_len: usize,
        bias_len: usize,
    ) -> Result<(Vec<f32>, Vec<f32>)> {
        let kernel = read_floats(&mut self.reader, kernel_len, &format!("{} kernel", layer))?;
        let bias = read_floats(&mut self.reader, bias_len, &format!("{} bias", layer))?;
        debug!(layer, kernel_len, bias_len, "loaded layer weights from stream");
        Ok((kernel, bias))
    }
}

/// Zero kernels and biases of the requested lengths.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZeroWeights;

impl WeightProvider for ZeroWeights {
    fn provide(
        &mut self,
        _layer: &str,
        kernel_len: usize,
        bias_len: usize,
    ) -> Result<(Vec<f32>, Vec<f32>)> {
        Ok((vec![0.0; kernel_len], vec![0.0; bias_len]))
    }
}
