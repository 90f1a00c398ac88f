//! Utility functions and types

pub mod data_loader;
pub mod special;

pub use data_loader::{load_samples, save_csv, save_json, SampleFormat};
pub use special::{checked_digamma, digamma, trigamma};
