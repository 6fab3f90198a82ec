//! Result container for a Monte Carlo CLR run.

use super::ConditionLabels;
use crate::denom::{DenominatorMode, FeatureSubset};
use crate::error::{ClrError, Result};
use crate::normalize::{ClrBranch, ClrMatrix, TransformedMatrix};
use crate::sanitize::ConfigWarning;
use crate::zero::PriorAdjustedTable;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Immutable output of [`crate::pipeline::transform`].
///
/// Holds one [`ClrMatrix`] per sample in column order. Construction checks
/// that every matrix has the same features in the same order and the same
/// number of Monte Carlo instances, so accessors can read shape from any
/// one of them.
#[derive(Debug, Clone)]
pub struct AldexClr {
    sample_ids: Vec<String>,
    clrs: Vec<ClrMatrix>,
    prior_adjusted: PriorAdjustedTable,
    conditions: ConditionLabels,
    mc_samples: usize,
    mode: DenominatorMode,
    denominator: FeatureSubset,
    branch: ClrBranch,
    warnings: Vec<ConfigWarning>,
}

impl AldexClr {
    /// Assemble a result, enforcing the cross-sample shape invariant.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clrs: Vec<ClrMatrix>,
        prior_adjusted: PriorAdjustedTable,
        conditions: ConditionLabels,
        mc_samples: usize,
        mode: DenominatorMode,
        denominator: FeatureSubset,
        branch: ClrBranch,
        warnings: Vec<ConfigWarning>,
    ) -> Result<Self> {
        if clrs.len() != prior_adjusted.n_samples() {
            return Err(ClrError::DimensionMismatch {
                expected: prior_adjusted.n_samples(),
                actual: clrs.len(),
            });
        }
        if conditions.len() != clrs.len() {
            return Err(ClrError::DimensionMismatch {
                expected: clrs.len(),
                actual: conditions.len(),
            });
        }

        for (clr, expected_id) in clrs.iter().zip(prior_adjusted.sample_ids()) {
            if clr.sample_id() != expected_id {
                return Err(ClrError::InvalidInput(format!(
                    "CLR matrix for '{}' found where '{}' was expected",
                    clr.sample_id(),
                    expected_id
                )));
            }
            if clr.n_features() != prior_adjusted.n_features() {
                return Err(ClrError::DimensionMismatch {
                    expected: prior_adjusted.n_features(),
                    actual: clr.n_features(),
                });
            }
            if clr.n_instances() != mc_samples {
                return Err(ClrError::DimensionMismatch {
                    expected: mc_samples,
                    actual: clr.n_instances(),
                });
            }
            if clr.feature_ids() != prior_adjusted.feature_ids() {
                return Err(ClrError::InvalidInput(format!(
                    "Feature order of sample '{}' differs from the prior-adjusted table",
                    clr.sample_id()
                )));
            }
        }

        Ok(Self {
            sample_ids: prior_adjusted.sample_ids().to_vec(),
            clrs,
            prior_adjusted,
            conditions,
            mc_samples,
            mode,
            denominator,
            branch,
            warnings,
        })
    }

    /// Sample names in column order.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    pub fn feature_ids(&self) -> &[String] {
        self.prior_adjusted.feature_ids()
    }

    pub fn n_features(&self) -> usize {
        self.clrs.first().map(ClrMatrix::n_features).unwrap_or(0)
    }

    /// Number of Monte Carlo instances per sample.
    pub fn n_mc_samples(&self) -> usize {
        self.clrs
            .first()
            .map(ClrMatrix::n_instances)
            .unwrap_or(self.mc_samples)
    }

    /// Full CLR matrix of a sample by name.
    pub fn sample_clr(&self, sample_id: &str) -> Option<&ClrMatrix> {
        self.sample_ids
            .iter()
            .position(|id| id == sample_id)
            .map(|idx| &self.clrs[idx])
    }

    /// Full CLR matrix of a sample by column position.
    pub fn sample_clr_at(&self, index: usize) -> Option<&ClrMatrix> {
        self.clrs.get(index)
    }

    /// Iterate `(sample_id, matrix)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClrMatrix)> + '_ {
        self.sample_ids
            .iter()
            .map(String::as_str)
            .zip(self.clrs.iter())
    }

    /// Counts plus prior that parameterized the Dirichlet draws.
    pub fn prior_adjusted(&self) -> &PriorAdjustedTable {
        &self.prior_adjusted
    }

    pub fn conditions(&self) -> &ConditionLabels {
        &self.conditions
    }

    /// Number of distinct condition labels.
    pub fn n_conditions(&self) -> usize {
        self.conditions.n_levels()
    }

    /// Denominator mode as requested.
    pub fn mode(&self) -> &DenominatorMode {
        &self.mode
    }

    /// Denominator features as resolved.
    pub fn denominator(&self) -> &FeatureSubset {
        &self.denominator
    }

    pub fn branch(&self) -> ClrBranch {
        self.branch
    }

    /// True when every feature was in the reference.
    pub fn is_default_denominator(&self) -> bool {
        self.branch == ClrBranch::Default
    }

    /// Non-fatal configuration warnings raised during the run.
    pub fn warnings(&self) -> &[ConfigWarning] {
        &self.warnings
    }

    /// One Monte Carlo instance across all samples (features × samples).
    pub fn mc_instance(&self, instance: usize) -> Option<DMatrix<f64>> {
        if instance >= self.n_mc_samples() {
            return None;
        }
        let mut out = DMatrix::zeros(self.n_features(), self.n_samples());
        for (j, clr) in self.clrs.iter().enumerate() {
            out.set_column(j, &clr.matrix().column(instance));
        }
        Some(out)
    }

    /// Mean CLR value over Monte Carlo instances, per feature and sample.
    pub fn expected_clr(&self) -> TransformedMatrix {
        let mut data = DMatrix::zeros(self.n_features(), self.n_samples());
        for (j, clr) in self.clrs.iter().enumerate() {
            for (i, value) in clr.expected().into_iter().enumerate() {
                data[(i, j)] = value;
            }
        }
        TransformedMatrix {
            data,
            feature_ids: self.feature_ids().to_vec(),
            sample_ids: self.sample_ids.clone(),
            transformation: format!("CLR(mc={}, denom={})", self.mc_samples, self.mode),
        }
    }

    /// Serializable overview of the run.
    pub fn summary(&self) -> ClrSummary {
        ClrSummary {
            n_features: self.n_features(),
            n_samples: self.n_samples(),
            mc_samples: self.n_mc_samples(),
            n_conditions: self.n_conditions(),
            mode: self.mode.to_string(),
            branch: self.branch,
            denominator: self.denominator.clone(),
            warnings: self.warnings.iter().map(|w| w.to_string()).collect(),
        }
    }
}

/// Overview of an [`AldexClr`] result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClrSummary {
    pub n_features: usize,
    pub n_samples: usize,
    pub mc_samples: usize,
    pub n_conditions: usize,
    pub mode: String,
    pub branch: ClrBranch,
    pub denominator: FeatureSubset,
    pub warnings: Vec<String>,
}

impl std::fmt::Display for ClrSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Monte Carlo CLR")?;
        writeln!(f, "  Features:     {}", self.n_features)?;
        writeln!(f, "  Samples:      {}", self.n_samples)?;
        writeln!(f, "  Conditions:   {}", self.n_conditions)?;
        writeln!(f, "  MC instances: {}", self.mc_samples)?;
        writeln!(f, "  Denominator:  {} ({:?})", self.mode, self.branch)?;
        for warning in &self.warnings {
            writeln!(f, "  Warning: {}", warning)?;
        }
        Ok(())
    }
}
