//! Sample loading and saving
//!
//! CSV layout: a header row, the label in the first column, one numeric column
//! per coordinate after it. JSON layout: an array of `{"label", "value"}`
//! objects.

use polars::prelude::*;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::error::{CapacityError, Result};
use crate::estimator::Observation;

/// Supported sample file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    Csv,
    Json,
}

impl SampleFormat {
    /// Guess the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::Json),
            other => Err(CapacityError::DataError(format!(
                "unsupported sample file extension: {:?}",
                other
            ))),
        }
    }
}

/// Load samples from a CSV or JSON file, chosen by extension
pub fn load_samples(path: impl AsRef<Path>) -> Result<Vec<Observation<String>>> {
    let path = path.as_ref();
    let start = Instant::now();
    let samples = match SampleFormat::from_path(path)? {
        SampleFormat::Csv => load_csv(path)?,
        SampleFormat::Json => load_json(path)?,
    };
    info!(
        path = %path.display(),
        n_samples = samples.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Loaded samples"
    );
    Ok(samples)
}

/// Load samples from a CSV file
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Observation<String>>> {
    let file = File::open(path.as_ref())?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(file)
        .finish()?;
    samples_from_frame(&df)
}

/// Convert a frame (label column then coordinate columns) into samples
pub fn samples_from_frame(df: &DataFrame) -> Result<Vec<Observation<String>>> {
    let columns = df.get_columns();
    if columns.len() < 2 {
        return Err(CapacityError::DataError(format!(
            "expected a label column and at least one value column, found {} columns",
            columns.len()
        )));
    }

    let labels = columns[0].as_materialized_series().cast(&DataType::String)?;
    let labels = labels.str()?;

    let mut values = Vec::with_capacity(columns.len() - 1);
    for column in &columns[1..] {
        let series = column
            .as_materialized_series()
            .cast(&DataType::Float64)
            .map_err(|e| {
                CapacityError::DataError(format!("column {} is not numeric: {}", column.name(), e))
            })?;
        values.push(series.f64()?.clone());
    }

    (0..df.height())
        .map(|row| {
            let label = labels.get(row).ok_or_else(|| {
                CapacityError::DataError(format!("missing label in row {}", row))
            })?;
            let value = values
                .iter()
                .zip(&columns[1..])
                .map(|(ca, column)| {
                    ca.get(row).ok_or_else(|| {
                        CapacityError::DataError(format!(
                            "missing value in row {}, column {}",
                            row,
                            column.name()
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            Ok(Observation::new(label.to_string(), value))
        })
        .collect()
}

/// Load samples from a JSON array of `{"label", "value"}` objects
pub fn load_json(path: impl AsRef<Path>) -> Result<Vec<Observation<String>>> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    Ok(serde_json::from_reader(reader)?)
}

/// Save samples as CSV with columns `label, x0, x1, ...`
pub fn save_csv<L: Display>(path: impl AsRef<Path>, samples: &[Observation<L>]) -> Result<()> {
    let dim = samples.first().map_or(0, |s| s.value.len());
    let mut columns = Vec::with_capacity(dim + 1);
    let labels: Vec<String> = samples.iter().map(|s| s.label.to_string()).collect();
    columns.push(Column::new("label".into(), labels));

    for d in 0..dim {
        let coords = samples
            .iter()
            .enumerate()
            .map(|(i, s)| {
                s.value.get(d).copied().ok_or_else(|| CapacityError::ShapeError {
                    expected: format!("{} coordinates", dim),
                    actual: format!("{} at sample {}", s.value.len(), i),
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        columns.push(Column::new(format!("x{}", d).into(), coords));
    }

    let mut df = DataFrame::new(columns)?;
    let mut file = File::create(path.as_ref())?;
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
    Ok(())
}

/// Save samples as a JSON array
pub fn save_json<L: serde::Serialize>(path: impl AsRef<Path>, samples: &[Observation<L>]) -> Result<()> {
    let writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(writer, samples)?;
    Ok(())
}
