//! Sample preprocessing
//!
//! Provides:
//! - Min-max rescaling into [0, 1] (global or per coordinate)
//! - Duplicate detection and perturbation of coincident points
//! - [`Preprocessor`], running both under a [`PreprocessingConfig`]

mod config;
mod jitter;
mod pipeline;
mod scaler;

pub use config::PreprocessingConfig;
pub use jitter::{add_noise_if_duplicates, all_unique};
pub use pipeline::Preprocessor;
pub use scaler::{normalize, Scaler, ScalerType};
