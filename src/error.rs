use thiserror::Error;

/// Errors raised by tensor construction, layer compute calls and weight loading.
///
/// Every compute call validates its arguments before writing to the output, so an
/// error never leaves a partially written buffer behind.
#[derive(Error, Debug)]
pub enum CnnError {
    #[error("shape mismatch in {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: String,
        actual: String,
    },

    #[error("truncated input for {what}: expected {expected} floats, found {actual}")]
    TruncatedInput {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("kernel size must be odd and non-zero, got {height}x{width}")]
    InvalidKernelSize { height: usize, width: usize },

    #[error("failed to read {what}: {source}")]
    Io {
        what: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CnnError {
    /// Builds a `ShapeMismatch` from anything printable.
    pub(crate) fn shape(
        what: &'static str,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        CnnError::ShapeMismatch {
            what,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CnnError>;
