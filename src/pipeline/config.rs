//! Run configuration.

use crate::denom::DenominatorMode;
use crate::error::{ClrError, Result};
use crate::sanitize::MIN_RELIABLE_MC_SAMPLES;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for one call to [`super::transform`].
///
/// ```yaml
/// mc_samples: 256
/// denom: iqlr
/// verbose: true
/// use_parallel: true
/// seed: 42
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClrConfig {
    /// Monte Carlo instances drawn per sample.
    pub mc_samples: usize,
    /// How the log-ratio reference is chosen.
    pub denom: DenominatorMode,
    /// Log progress at `info` level.
    pub verbose: bool,
    /// Map over samples on the rayon pool.
    pub use_parallel: bool,
    /// Master seed; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for ClrConfig {
    fn default() -> Self {
        Self {
            mc_samples: MIN_RELIABLE_MC_SAMPLES,
            denom: DenominatorMode::All,
            verbose: false,
            use_parallel: false,
            seed: None,
        }
    }
}

impl ClrConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mc_samples(mut self, mc_samples: usize) -> Self {
        self.mc_samples = mc_samples;
        self
    }

    pub fn with_denom(mut self, denom: DenominatorMode) -> Self {
        self.denom = denom;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(ClrError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(ClrError::from)
    }

    /// Load from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }
}
