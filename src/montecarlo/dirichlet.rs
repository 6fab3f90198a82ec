//! Dirichlet draws per sample.

use super::seeds::sample_seeds;
use crate::error::{ClrError, Result};
use crate::parallel::SampleMap;
use crate::zero::PriorAdjustedTable;
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Dirichlet, Distribution};
use std::sync::Arc;

/// Column sums of a draw must be within this distance of 1.
const SUM_TOLERANCE: f64 = 1e-9;

/// Monte Carlo frequency instances for one sample.
#[derive(Debug, Clone)]
pub struct MonteCarloSample {
    sample_id: String,
    feature_ids: Arc<[String]>,
    /// features × instances; every column sums to 1
    data: DMatrix<f64>,
}

impl MonteCarloSample {
    #[cfg(test)]
    pub(crate) fn from_parts(sample_id: &str, feature_ids: Arc<[String]>, data: DMatrix<f64>) -> Self {
        Self {
            sample_id: sample_id.to_string(),
            feature_ids,
            data,
        }
    }

    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    /// Row labels, shared by every sample of one run.
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    pub(crate) fn shared_feature_ids(&self) -> Arc<[String]> {
        Arc::clone(&self.feature_ids)
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn n_instances(&self) -> usize {
        self.data.ncols()
    }

    /// Frequency of `feature` in Monte Carlo instance `instance`.
    #[inline]
    pub fn get(&self, feature: usize, instance: usize) -> f64 {
        self.data[(feature, instance)]
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.data
    }
}

/// Draw `mc_samples` Dirichlet vectors for one concentration vector.
///
/// Returns a features × `mc_samples` matrix. Every value is checked to be
/// finite and every column to sum to 1. A dominant feature may round to
/// exactly 1.0; that is kept, since its log is still finite.
pub fn draw_instances<R: Rng + ?Sized>(
    alpha: &[f64],
    mc_samples: usize,
    rng: &mut R,
) -> Result<DMatrix<f64>> {
    let dirichlet = Dirichlet::new(alpha).map_err(|e| {
        ClrError::Sampling(format!(
            "invalid Dirichlet parameters ({} features): {:?}",
            alpha.len(),
            e
        ))
    })?;

    let n_features = alpha.len();
    let mut data = DMatrix::zeros(n_features, mc_samples);
    for instance in 0..mc_samples {
        let draw: Vec<f64> = dirichlet.sample(rng);
        let mut sum = 0.0;
        for (feature, &p) in draw.iter().enumerate() {
            if !p.is_finite() {
                return Err(ClrError::Sampling(format!(
                    "non-finite frequency {} for feature {} in instance {}",
                    p, feature, instance
                )));
            }
            data[(feature, instance)] = p;
            sum += p;
        }
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(ClrError::Sampling(format!(
                "instance {} sums to {}, expected 1",
                instance, sum
            )));
        }
    }

    Ok(data)
}

/// Draw Monte Carlo instances for every sample of a prior-adjusted table.
///
/// Samples are drawn independently, each from its own generator seeded by
/// [`sample_seeds`], so output depends only on `seed` and not on `mapper`.
///
/// # Arguments
/// * `prior_adjusted` - Counts plus prior; column `j` parameterizes sample `j`
/// * `mc_samples` - Number of instances per sample
/// * `seed` - Master seed, or `None` for OS entropy
/// * `mapper` - Serial or parallel map over samples
pub fn sample_monte_carlo<M: SampleMap>(
    prior_adjusted: &PriorAdjustedTable,
    mc_samples: usize,
    seed: Option<u64>,
    mapper: &M,
) -> Result<Vec<MonteCarloSample>> {
    let feature_ids: Arc<[String]> = prior_adjusted.feature_ids().into();
    let seeds = sample_seeds(seed, prior_adjusted.n_samples());

    let tasks: Vec<(usize, u64)> = seeds.into_iter().enumerate().collect();
    mapper.try_map(tasks, |(sample, sample_seed)| {
        let mut rng = StdRng::seed_from_u64(sample_seed);
        let data = draw_instances(&prior_adjusted.alpha(sample), mc_samples, &mut rng)?;
        Ok(MonteCarloSample {
            sample_id: prior_adjusted.sample_ids()[sample].clone(),
            feature_ids: Arc::clone(&feature_ids),
            data,
        })
    })
}
