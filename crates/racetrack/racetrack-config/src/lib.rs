//! Engine configuration: a `serde`-deserialized TOML struct with
//! `#[serde(default = ...)]` fallbacks and a `thiserror` error enum for
//! load failures.

use serde::Deserialize;
use std::path::Path;

/// Which inclusion scheme the sampling controller runs.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SamplingSchemeKind {
    Count,
    Adaptive,
}

#[derive(Deserialize, Debug, Clone)]
pub struct EngineConfig {
    /// Inclusion percentage, `0..=100`.
    #[serde(default = "defaults::sampling_rate")]
    pub sampling_rate: u8,

    #[serde(default = "defaults::sampling_scheme")]
    pub sampling_scheme: SamplingSchemeKind,

    /// `ADAPTIVE`-only floor the per-location rate decays towards. Ignored
    /// under `COUNT`.
    #[serde(default = "defaults::adaptive_threshold")]
    pub adaptive_threshold: u8,

    /// Upper bound for per-tid counters; sizes initial vector-clock
    /// capacity.
    #[serde(default = "defaults::max_tid")]
    pub max_tid: usize,

    #[serde(default = "defaults::log_level")]
    pub log_level: String,
}

mod defaults {
    pub fn sampling_rate() -> u8 {
        100
    }

    pub fn sampling_scheme() -> super::SamplingSchemeKind {
        super::SamplingSchemeKind::Count
    }

    pub fn adaptive_threshold() -> u8 {
        1
    }

    pub fn max_tid() -> usize {
        256
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error("sampling_rate must be 0..=100, got {0}")]
    InvalidSamplingRate(u8),
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let toml_str = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config: EngineConfig = toml::from_str(&toml_str)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sampling_rate > 100 {
            return Err(ConfigError::InvalidSamplingRate(self.sampling_rate));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sampling_rate: defaults::sampling_rate(),
            sampling_scheme: defaults::sampling_scheme(),
            adaptive_threshold: defaults::adaptive_threshold(),
            max_tid: defaults::max_tid(),
            log_level: defaults::log_level(),
        }
    }
}
