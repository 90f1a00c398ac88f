//! Preprocessing configuration

use serde::{Deserialize, Serialize};

use super::ScalerType;

/// Configuration for sample preprocessing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// How values are rescaled into [0, 1]
    pub scaler: ScalerType,

    /// Whether duplicate points are perturbed apart
    pub jitter: bool,

    /// Random seed for the jitter noise
    pub seed: Option<u64>,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            scaler: ScalerType::Global,
            jitter: true,
            seed: None,
        }
    }
}

impl PreprocessingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave samples untouched
    pub fn disabled() -> Self {
        Self {
            scaler: ScalerType::None,
            jitter: false,
            seed: None,
        }
    }

    pub fn with_scaler(mut self, scaler: ScalerType) -> Self {
        self.scaler = scaler;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PreprocessingConfig::default();
        assert_eq!(config.scaler, ScalerType::Global);
        assert!(config.jitter);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_json_roundtrip_of_partial_config() {
        let config = PreprocessingConfig::new()
            .with_scaler(ScalerType::PerDimension)
            .with_seed(7);
        let json = serde_json::to_string(&config).unwrap();
        let back: PreprocessingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
