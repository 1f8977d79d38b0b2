use std::path::Path;

use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Deserialize;

use crate::conv::ConvAlgorithm;
use crate::error::{CnnError, Result};

/// Environment variable overriding [`RuntimeConfig::threads`].
pub const THREADS_ENV: &str = "MICROVGG_THREADS";

/// Runtime settings for a [`NeuralNetwork`](crate::network::NeuralNetwork).
///
/// ```
/// use microvgg::config::RuntimeConfig;
///
/// let config = RuntimeConfig::from_json_str(r#"{ "threads": 4, "algorithm": "window" }"#).unwrap();
/// assert_eq!(config.threads, Some(4));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Worker threads for the parallel kernels. `None` uses rayon's global pool.
    pub threads: Option<usize>,
    /// Convolution algorithm used by network builders.
    pub algorithm: ConvAlgorithm,
    /// Log every layer's output shape at info level instead of debug.
    pub debug: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            threads: None,
            algorithm: ConvAlgorithm::Window,
            debug: false,
        }
    }
}

impl RuntimeConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: RuntimeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CnnError::Io {
            what: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Applies `MICROVGG_THREADS` if it is set.
    pub fn with_env_overrides(self) -> Result<Self> {
        let threads = std::env::var(THREADS_ENV).ok();
        self.with_threads_override(threads.as_deref())
    }

    /// Parses `value` as a thread count; `None` leaves the config unchanged.
    pub fn with_threads_override(mut self, value: Option<&str>) -> Result<Self> {
        if let Some(value) = value {
            let threads = value.trim().parse::<usize>().map_err(|_| {
                CnnError::Config(format!("{} must be a positive integer, got {:?}", THREADS_ENV, value))
            })?;
            self.threads = Some(threads);
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.threads == Some(0) {
            return Err(CnnError::Config("threads must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Dedicated pool of `threads` workers, or `None` for the global pool.
    pub fn build_pool(&self) -> Result<Option<ThreadPool>> {
        self.validate()?;
        match self.threads {
            None => Ok(None),
            Some(n) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("microvgg-{}", i))
                    .build()?;
                Ok(Some(pool))
            }
        }
    }
}
