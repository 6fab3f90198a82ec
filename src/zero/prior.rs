//! Uniform prior added to every cell before Dirichlet sampling.

use crate::data::CountMatrix;
use crate::error::{ClrError, Result};
use nalgebra::DMatrix;

/// Prior added to each count; 0.5 is the Jeffreys prior for the Dirichlet.
pub const DEFAULT_PRIOR: f64 = 0.5;

/// Sanitized counts plus a prior, used as Dirichlet concentration parameters.
///
/// Every cell is strictly positive. Column `j` is the concentration vector of
/// sample `j`.
#[derive(Debug, Clone)]
pub struct PriorAdjustedTable {
    data: DMatrix<f64>,
    feature_ids: Vec<String>,
    sample_ids: Vec<String>,
    prior: f64,
}

impl PriorAdjustedTable {
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

    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// The prior that was added to every cell.
    pub fn prior(&self) -> f64 {
        self.prior
    }

    /// Concentration vector of one sample.
    pub fn alpha(&self, sample: usize) -> Vec<f64> {
        self.data.column(sample).iter().copied().collect()
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.data
    }
}

/// Add `prior` to every entry of a sanitized count matrix.
///
/// Zero and non-zero cells alike receive the prior, so relative differences
/// between observed counts are preserved.
///
/// # Arguments
/// * `counts` - Sanitized count matrix
/// * `prior` - Value to add; must be finite and positive
pub fn add_prior(counts: &CountMatrix, prior: f64) -> Result<PriorAdjustedTable> {
    if !prior.is_finite() || prior <= 0.0 {
        return Err(ClrError::InvalidParameter(format!(
            "Prior must be finite and positive, got {}",
            prior
        )));
    }

    Ok(PriorAdjustedTable {
        data: counts.to_dense().add_scalar(prior),
        feature_ids: counts.feature_ids().to_vec(),
        sample_ids: counts.sample_ids().to_vec(),
        prior,
    })
}
