//! Sample preprocessing pipeline: rescale, then separate duplicates

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::time::Instant;
use tracing::info;

use super::{add_noise_if_duplicates, PreprocessingConfig, Scaler};
use crate::error::Result;
use crate::estimator::{check_dimensions, Observation};

/// Applies normalization then jitter under a [`PreprocessingConfig`]
#[derive(Debug, Clone)]
pub struct Preprocessor {
    config: PreprocessingConfig,
    scaler: Scaler,
    /// Noise scale used by the last run, if any noise was added
    last_eps: Option<f64>,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self::with_config(PreprocessingConfig::default())
    }

    pub fn with_config(config: PreprocessingConfig) -> Self {
        Self {
            scaler: Scaler::new(config.scaler),
            config,
            last_eps: None,
        }
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn last_eps(&self) -> Option<f64> {
        self.last_eps
    }

    /// Rescale and de-duplicate a sample. An empty sample passes through.
    pub fn run<L: Clone>(&mut self, samples: &[Observation<L>]) -> Result<Vec<Observation<L>>> {
        self.last_eps = None;
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        check_dimensions(samples)?;
        let mut out = self.scaler.fit_transform(samples)?;

        if self.config.jitter {
            let mut rng = match self.config.seed {
                Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
                None => Xoshiro256PlusPlus::from_entropy(),
            };
            self.last_eps = add_noise_if_duplicates(&mut out, &mut rng)?;
        }

        info!(
            n_points = out.len(),
            scaler = ?self.config.scaler,
            jittered = self.last_eps.is_some(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Preprocessed sample"
        );
        Ok(out)
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
