//! Raw count table as handed in by the caller.
//!
//! Values are kept as `f64` so that anything a TSV file or an upstream tool
//! produces (fractional values, negatives, `NaN`) survives until the
//! sanitizer can reject it with a precise message.

use super::CountMatrix;
use crate::error::{ClrError, Result};
use nalgebra::DMatrix;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Unvalidated features × samples table.
#[derive(Debug, Clone)]
pub struct CountTable {
    data: DMatrix<f64>,
    feature_ids: Vec<String>,
    sample_ids: Vec<String>,
}

impl CountTable {
    /// Create a table from a dense matrix and identifiers.
    ///
    /// Only the shape is checked here; value and name validation happens in
    /// [`crate::sanitize::sanitize`].
    pub fn new(data: DMatrix<f64>, feature_ids: Vec<String>, sample_ids: Vec<String>) -> Result<Self> {
        if data.nrows() != feature_ids.len() {
            return Err(ClrError::DimensionMismatch {
                expected: data.nrows(),
                actual: feature_ids.len(),
            });
        }
        if data.ncols() != sample_ids.len() {
            return Err(ClrError::DimensionMismatch {
                expected: data.ncols(),
                actual: sample_ids.len(),
            });
        }
        Ok(Self {
            data,
            feature_ids,
            sample_ids,
        })
    }

    /// Create a table from row-major values.
    pub fn from_row_slice<F, S>(values: &[f64], feature_ids: &[F], sample_ids: &[S]) -> Result<Self>
    where
        F: AsRef<str>,
        S: AsRef<str>,
    {
        let n_features = feature_ids.len();
        let n_samples = sample_ids.len();
        if values.len() != n_features * n_samples {
            return Err(ClrError::DimensionMismatch {
                expected: n_features * n_samples,
                actual: values.len(),
            });
        }
        Self::new(
            DMatrix::from_row_slice(n_features, n_samples, values),
            feature_ids.iter().map(|s| s.as_ref().to_string()).collect(),
            sample_ids.iter().map(|s| s.as_ref().to_string()).collect(),
        )
    }

    /// Load a count table from a TSV file.
    ///
    /// Expected format:
    /// - First row: header with sample IDs (first column is the feature ID header)
    /// - Subsequent rows: feature ID followed by one value per sample
    ///
    /// Values must parse as numbers; whether they are valid counts is decided
    /// later by the sanitizer.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| ClrError::InvalidInput("Empty TSV file".to_string()))??;
        let header: Vec<&str> = header_line.split('\t').collect();
        if header.len() < 2 {
            return Err(ClrError::InvalidInput(
                "TSV must have at least one sample column".to_string(),
            ));
        }
        let sample_ids: Vec<String> = header[1..].iter().map(|s| s.trim().to_string()).collect();
        let n_samples = sample_ids.len();

        let mut feature_ids = Vec::new();
        let mut values = Vec::new();
        for (row_idx, line_result) in lines.enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != n_samples + 1 {
                return Err(ClrError::InvalidInput(format!(
                    "Row {} has {} values, expected {}",
                    row_idx + 1,
                    fields.len().saturating_sub(1),
                    n_samples
                )));
            }
            feature_ids.push(fields[0].trim().to_string());
            for (col_idx, value_str) in fields[1..].iter().enumerate() {
                let value: f64 = value_str.trim().parse().map_err(|_| {
                    ClrError::InvalidInput(format!(
                        "Unparsable count '{}' at row {}, column {}",
                        value_str,
                        row_idx + 1,
                        col_idx + 1
                    ))
                })?;
                values.push(value);
            }
        }

        if feature_ids.is_empty() {
            return Err(ClrError::InvalidInput("No features in TSV".to_string()));
        }

        Self::from_row_slice(&values, &feature_ids, &sample_ids)
    }

    /// Value at (feature, sample).
    #[inline]
    pub fn get(&self, feature: usize, sample: usize) -> f64 {
        self.data[(feature, sample)]
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    #[inline]
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Underlying dense matrix.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.data
    }
}

impl From<&CountMatrix> for CountTable {
    fn from(counts: &CountMatrix) -> Self {
        Self {
            data: counts.to_dense(),
            feature_ids: counts.feature_ids().to_vec(),
            sample_ids: counts.sample_ids().to_vec(),
        }
    }
}
