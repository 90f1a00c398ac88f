//! Min-max rescaling of sample values into [0, 1]

use serde::{Deserialize, Serialize};

use crate::error::{CapacityError, Result};
use crate::estimator::{check_dimensions, Observation};

/// Type of rescaling to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalerType {
    /// One minimum and maximum over every coordinate of every point
    Global,
    /// Each coordinate rescaled on its own range
    PerDimension,
    /// No scaling
    None,
}

/// Parameters for one rescaled axis (or all axes, for `Global`)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ScalerParams {
    min: f64,
    range: f64,
}

impl ScalerParams {
    fn apply(&self, v: f64) -> f64 {
        if self.range > 0.0 {
            (v - self.min) / self.range
        } else {
            0.0
        }
    }
}

/// Min-max scaler fitted on a sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: Vec<ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn scaler_type(&self) -> ScalerType {
        self.scaler_type
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Fit the scaler to the sample.
    ///
    /// A sample with no spread at all cannot be rescaled. Under `PerDimension`
    /// a constant axis maps to 0 as long as some other axis varies.
    pub fn fit<L>(&mut self, samples: &[Observation<L>]) -> Result<&mut Self> {
        self.params.clear();
        if self.scaler_type == ScalerType::None {
            self.is_fitted = true;
            return Ok(self);
        }

        let dim = check_dimensions(samples)?;
        let mut mins = vec![f64::INFINITY; dim];
        let mut maxs = vec![f64::NEG_INFINITY; dim];
        for sample in samples {
            for (d, &v) in sample.value.iter().enumerate() {
                mins[d] = mins[d].min(v);
                maxs[d] = maxs[d].max(v);
            }
        }

        self.params = match self.scaler_type {
            ScalerType::Global => {
                let min = mins.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = maxs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                vec![ScalerParams { min, range: max - min }]
            }
            _ => mins
                .iter()
                .zip(&maxs)
                .map(|(&min, &max)| ScalerParams { min, range: max - min })
                .collect(),
        };

        if self.params.iter().all(|p| p.range <= 0.0) {
            return Err(CapacityError::PreprocessingError(
                "cannot normalize a sample whose values are all equal".to_string(),
            ));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Rescale a sample with the fitted parameters
    pub fn transform<L: Clone>(&self, samples: &[Observation<L>]) -> Result<Vec<Observation<L>>> {
        if !self.is_fitted {
            return Err(CapacityError::PreprocessingError("scaler is not fitted".to_string()));
        }
        if self.scaler_type == ScalerType::None {
            return Ok(samples.to_vec());
        }

        samples
            .iter()
            .map(|sample| {
                let value = match self.scaler_type {
                    ScalerType::PerDimension => {
                        if sample.value.len() != self.params.len() {
                            return Err(CapacityError::ShapeError {
                                expected: format!("{} coordinates", self.params.len()),
                                actual: sample.value.len().to_string(),
                            });
                        }
                        sample
                            .value
                            .iter()
                            .zip(&self.params)
                            .map(|(&v, p)| p.apply(v))
                            .collect()
                    }
                    _ => sample.value.iter().map(|&v| self.params[0].apply(v)).collect(),
                };
                Ok(Observation::new(sample.label.clone(), value))
            })
            .collect()
    }

    /// Fit and transform in one step
    pub fn fit_transform<L: Clone>(&mut self, samples: &[Observation<L>]) -> Result<Vec<Observation<L>>> {
        self.fit(samples)?;
        self.transform(samples)
    }
}

/// Rescale all values into [0, 1] with one global minimum and maximum
pub fn normalize<L: Clone>(samples: &[Observation<L>]) -> Result<Vec<Observation<L>>> {
    Scaler::new(ScalerType::Global).fit_transform(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Observation<u8>> {
        vec![
            Observation::new(0, vec![2.0, 10.0]),
            Observation::new(1, vec![4.0, 20.0]),
            Observation::new(1, vec![3.0, 30.0]),
        ]
    }

    #[test]
    fn test_global_uses_one_range() {
        let out = normalize(&sample()).unwrap();
        assert_eq!(out[0].value, vec![0.0, 8.0 / 28.0]);
        assert_eq!(out[2].value[1], 1.0);
        assert_eq!(out[1].label, 1);
    }

    #[test]
    fn test_per_dimension_scales_each_axis() {
        let out = Scaler::new(ScalerType::PerDimension).fit_transform(&sample()).unwrap();
        assert_eq!(out[0].value, vec![0.0, 0.0]);
        assert_eq!(out[1].value, vec![1.0, 0.5]);
        assert_eq!(out[2].value, vec![0.5, 1.0]);
    }

    #[test]
    fn test_none_is_identity() {
        let out = Scaler::new(ScalerType::None).fit_transform(&sample()).unwrap();
        assert_eq!(out, sample());
    }

    #[test]
    fn test_constant_sample_rejected() {
        let constant = vec![Observation::new(0, vec![1.0]), Observation::new(1, vec![1.0])];
        assert!(matches!(
            normalize(&constant),
            Err(CapacityError::PreprocessingError(_))
        ));
    }

    #[test]
    fn test_transform_before_fit() {
        let scaler = Scaler::new(ScalerType::Global);
        assert!(scaler.transform(&sample()).is_err());
    }

    #[test]
    fn test_mismatched_dimensions() {
        let bad = vec![Observation::new(0, vec![1.0, 2.0]), Observation::new(1, vec![1.0])];
        assert!(matches!(normalize(&bad), Err(CapacityError::ShapeError { .. })));
    }
}
