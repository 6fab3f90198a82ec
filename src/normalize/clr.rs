//! Centered Log-Ratio (CLR) transformation of Monte Carlo instances.
//!
//! Every instance of every sample is moved to log2-ratio coordinates:
//!
//! CLR(p_ik) = log2(p_ik) - mean_{d in D}(log2(p_dk))
//!
//! for feature `i`, instance `k` and denominator set `D`. When `D` is every
//! feature the reference is the per-instance geometric mean (the DEFAULT
//! branch). Otherwise each sample uses the set resolved for its condition
//! (the RESTRICTED branch).

use crate::data::ConditionLabels;
use crate::denom::FeatureSubset;
use crate::error::{ClrError, Result};
use crate::montecarlo::MonteCarloSample;
use crate::parallel::SampleMap;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Which reference the transform used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClrBranch {
    /// Reference over all features.
    Default,
    /// Reference over a subset, possibly different per condition.
    Restricted,
}

/// CLR values of one sample: features × Monte Carlo instances.
#[derive(Debug, Clone)]
pub struct ClrMatrix {
    sample_id: String,
    feature_ids: Arc<[String]>,
    data: DMatrix<f64>,
}

impl ClrMatrix {
    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    /// CLR value of `feature` in instance `instance`.
    #[inline]
    pub fn get(&self, feature: usize, instance: usize) -> f64 {
        self.data[(feature, instance)]
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn n_instances(&self) -> usize {
        self.data.ncols()
    }

    /// All instances of one feature.
    pub fn row(&self, feature: usize) -> Vec<f64> {
        self.data.row(feature).iter().copied().collect()
    }

    /// All features of one instance.
    pub fn instance(&self, instance: usize) -> Vec<f64> {
        self.data.column(instance).iter().copied().collect()
    }

    /// Per-feature mean over instances.
    pub fn expected(&self) -> Vec<f64> {
        let n = self.n_instances() as f64;
        self.data.row_iter().map(|row| row.sum() / n).collect()
    }

    /// Per-instance mean of the CLR values over `features`.
    pub fn instance_means(&self, features: &[usize]) -> Vec<f64> {
        let n = features.len() as f64;
        self.data
            .column_iter()
            .map(|col| features.iter().map(|&i| col[i]).sum::<f64>() / n)
            .collect()
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.data
    }
}

/// A features × samples matrix with metadata about the transformation.
///
/// Used for summaries that collapse the Monte Carlo dimension, such as the
/// expected CLR value per feature and sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformedMatrix {
    /// The transformed data (features × samples).
    #[serde(skip)]
    pub data: DMatrix<f64>,
    pub feature_ids: Vec<String>,
    pub sample_ids: Vec<String>,
    /// Name of the transformation applied.
    pub transformation: String,
}

impl TransformedMatrix {
    /// Get the transformed value for a feature and sample.
    pub fn get(&self, feature: usize, sample: usize) -> f64 {
        self.data[(feature, sample)]
    }

    pub fn n_features(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    /// Get a column (sample) as a vector.
    pub fn col(&self, sample: usize) -> Vec<f64> {
        self.data.column(sample).iter().cloned().collect()
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Write as TSV with a feature column and one column per sample.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "feature_id")?;
        for sample_id in &self.sample_ids {
            write!(writer, "\t{}", sample_id)?;
        }
        writeln!(writer)?;

        for (row, feature_id) in self.feature_ids.iter().enumerate() {
            write!(writer, "{}", feature_id)?;
            for col in 0..self.n_samples() {
                write!(writer, "\t{}", self.data[(row, col)])?;
            }
            writeln!(writer)?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Pick the branch for a resolved denominator.
pub fn select_branch(subset: &FeatureSubset, n_features: usize) -> ClrBranch {
    if subset.is_complete(n_features) {
        ClrBranch::Default
    } else {
        ClrBranch::Restricted
    }
}

/// CLR of one sample with every feature in the reference.
pub fn clr_default(sample: &MonteCarloSample) -> Result<ClrMatrix> {
    let mut data = sample.matrix().map(f64::log2);
    let n_features = data.nrows() as f64;
    for mut col in data.column_iter_mut() {
        let mean = col.sum() / n_features;
        col.add_scalar_mut(-mean);
    }
    finish(sample, data)
}

/// CLR of one sample against the features in `denom`.
pub fn clr_restricted(sample: &MonteCarloSample, denom: &[usize]) -> Result<ClrMatrix> {
    let mut data = sample.matrix().map(f64::log2);
    let reference = instance_reference(&data, denom)?;
    for (mut col, r) in data.column_iter_mut().zip(reference) {
        col.add_scalar_mut(-r);
    }
    finish(sample, data)
}

/// Per-instance mean of log2 frequencies over `denom`.
///
/// Entry `k` is the reference subtracted from every feature of instance `k`.
pub fn instance_reference(log_data: &DMatrix<f64>, denom: &[usize]) -> Result<Vec<f64>> {
    if denom.is_empty() {
        return Err(ClrError::InvalidInput(
            "Denominator feature set is empty".to_string(),
        ));
    }
    if let Some(&bad) = denom.iter().find(|&&i| i >= log_data.nrows()) {
        return Err(ClrError::InvalidInput(format!(
            "Denominator index {} out of range for {} features",
            bad,
            log_data.nrows()
        )));
    }
    let n = denom.len() as f64;
    Ok(log_data
        .column_iter()
        .map(|col| denom.iter().map(|&i| col[i]).sum::<f64>() / n)
        .collect())
}

fn finish(sample: &MonteCarloSample, data: DMatrix<f64>) -> Result<ClrMatrix> {
    if let Some(pos) = data.iter().position(|v| !v.is_finite()) {
        let (feature, instance) = (pos % data.nrows(), pos / data.nrows());
        return Err(ClrError::Transform(format!(
            "non-finite CLR value for feature '{}' in instance {} of sample '{}'",
            sample.feature_ids()[feature],
            instance,
            sample.sample_id()
        )));
    }
    Ok(ClrMatrix {
        sample_id: sample.sample_id().to_string(),
        feature_ids: sample.shared_feature_ids(),
        data,
    })
}

/// Transform every sample's Monte Carlo instances.
///
/// In the RESTRICTED branch each sample is paired with its own condition's
/// feature set by sample index: groups from
/// [`ConditionLabels::group_indices`] are expanded back to one entry per
/// sample, and a sample left without a set is an error. This keeps the
/// pairing correct for any label ordering, interleaved or not.
///
/// # Arguments
/// * `samples` - Monte Carlo draws in column order
/// * `conditions` - One label per sample
/// * `subset` - Validated denominator
/// * `mapper` - Serial or parallel map over samples
pub fn transform_samples<M: SampleMap>(
    samples: &[MonteCarloSample],
    conditions: &ConditionLabels,
    subset: &FeatureSubset,
    mapper: &M,
) -> Result<(ClrBranch, Vec<ClrMatrix>)> {
    let n_features = samples.first().map(|s| s.n_features()).unwrap_or(0);
    if conditions.len() != samples.len() {
        return Err(ClrError::DimensionMismatch {
            expected: samples.len(),
            actual: conditions.len(),
        });
    }

    let branch = select_branch(subset, n_features);
    let matrices = match branch {
        ClrBranch::Default => mapper.try_map(samples.iter().collect(), clr_default)?,
        ClrBranch::Restricted => {
            let denoms = denominators_by_sample(conditions, subset)?;
            let tasks: Vec<(&MonteCarloSample, &[usize])> =
                samples.iter().zip(denoms).collect();
            mapper.try_map(tasks, |(sample, denom)| clr_restricted(sample, denom))?
        }
    };

    Ok((branch, matrices))
}

/// Expand per-condition sets to one set per sample, by sample index.
fn denominators_by_sample<'a>(
    conditions: &ConditionLabels,
    subset: &'a FeatureSubset,
) -> Result<Vec<&'a [usize]>> {
    let mut by_sample: Vec<Option<&'a [usize]>> = vec![None; conditions.len()];
    for (level, indices) in conditions.group_indices() {
        let denom = subset.for_condition(&level).ok_or_else(|| {
            ClrError::Transform(format!("no denominator resolved for condition '{}'", level))
        })?;
        for sample in indices {
            by_sample[sample] = Some(denom);
        }
    }

    by_sample
        .into_iter()
        .enumerate()
        .map(|(sample, denom)| {
            denom.ok_or_else(|| {
                ClrError::Transform(format!("sample {} has no denominator assigned", sample))
            })
        })
        .collect()
}
