//! Input validation and normalization.
//!
//! Everything that can be wrong with user data is detected here, before a
//! single Dirichlet draw is made:
//!
//! - non-finite, negative or fractional counts
//! - empty or duplicated feature/sample names
//! - condition labels that do not line up with the sample columns
//! - a table with fewer than two observed features
//!
//! Features never observed in any sample are dropped, and the prior is added
//! last, on a separate table, so the sanitized counts can be fed back through
//! [`sanitize`] unchanged.

use crate::data::{ConditionLabels, CountMatrix, CountTable};
use crate::error::{ClrError, Result};
use crate::filter::{filter_zero_sum, ZeroSumFilterResult};
use crate::zero::{add_prior, PriorAdjustedTable, DEFAULT_PRIOR};
use serde::{Deserialize, Serialize};
use sprs::TriMat;
use std::collections::HashSet;

/// Fewer Monte Carlo instances than this give unstable downstream estimates.
pub const MIN_RELIABLE_MC_SAMPLES: usize = 128;

/// Largest count accepted; above 2^53 an `f64` no longer holds every integer.
pub const MAX_EXACT_COUNT: f64 = 9_007_199_254_740_992.0;

/// Non-fatal problem with the run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigWarning {
    /// Too few Monte Carlo instances for reliable estimates.
    LowMonteCarloSamples { requested: usize, recommended: usize },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::LowMonteCarloSamples {
                requested,
                recommended,
            } => write!(
                f,
                "{} Monte Carlo samples requested; at least {} are recommended for reliable estimates",
                requested, recommended
            ),
        }
    }
}

/// Output of [`sanitize`].
#[derive(Debug, Clone)]
pub struct SanitizedInput {
    /// Validated integer counts with zero-sum features removed, no prior.
    pub counts: CountMatrix,
    /// `counts` plus [`DEFAULT_PRIOR`] in every cell.
    pub prior_adjusted: PriorAdjustedTable,
    /// What the zero-sum filter removed.
    pub zero_sum: ZeroSumFilterResult,
    pub warnings: Vec<ConfigWarning>,
}

/// Validate and normalize a raw count table.
///
/// # Arguments
/// * `table` - Raw features × samples table
/// * `conditions` - One label per sample column
/// * `mc_samples` - Number of Monte Carlo instances the caller intends to draw
///
/// # Errors
/// [`ClrError::InvalidInput`] for any data fault; nothing is returned partially.
pub fn sanitize(
    table: &CountTable,
    conditions: &ConditionLabels,
    mc_samples: usize,
) -> Result<SanitizedInput> {
    let (n_features, n_samples) = (table.n_features(), table.n_samples());
    if n_features == 0 || n_samples == 0 {
        return Err(ClrError::InvalidInput(format!(
            "Count table is empty ({} features × {} samples)",
            n_features, n_samples
        )));
    }

    check_names("feature", table.feature_ids())?;
    check_names("sample", table.sample_ids())?;
    check_conditions(conditions, n_samples)?;

    if mc_samples == 0 {
        return Err(ClrError::InvalidInput(
            "At least one Monte Carlo sample is required".to_string(),
        ));
    }

    let counts = to_count_matrix(table)?;
    let (counts, zero_sum) = filter_zero_sum(&counts)?;
    if !zero_sum.removed.is_empty() {
        log::debug!(
            "Dropped {} zero-sum features: {:?}",
            zero_sum.n_removed(),
            zero_sum.removed
        );
    }

    if counts.n_features() < 2 {
        return Err(ClrError::InvalidInput(format!(
            "At least two observed features are required for a log-ratio, found {}",
            counts.n_features()
        )));
    }

    let mut warnings = Vec::new();
    if mc_samples < MIN_RELIABLE_MC_SAMPLES {
        let warning = ConfigWarning::LowMonteCarloSamples {
            requested: mc_samples,
            recommended: MIN_RELIABLE_MC_SAMPLES,
        };
        log::warn!("{}", warning);
        warnings.push(warning);
    }

    let prior_adjusted = add_prior(&counts, DEFAULT_PRIOR)?;

    Ok(SanitizedInput {
        counts,
        prior_adjusted,
        zero_sum,
        warnings,
    })
}

fn check_names(kind: &str, names: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(names.len());
    for (idx, name) in names.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(ClrError::InvalidInput(format!(
                "Empty {} name at position {}",
                kind, idx
            )));
        }
        if !seen.insert(name.as_str()) {
            return Err(ClrError::InvalidInput(format!(
                "Duplicate {} name '{}'",
                kind, name
            )));
        }
    }
    Ok(())
}

fn check_conditions(conditions: &ConditionLabels, n_samples: usize) -> Result<()> {
    if conditions.len() != n_samples {
        return Err(ClrError::InvalidInput(format!(
            "Expected one condition label per sample ({}), got {}",
            n_samples,
            conditions.len()
        )));
    }
    if let Some(idx) = conditions.labels().iter().position(|l| l.trim().is_empty()) {
        return Err(ClrError::InvalidInput(format!(
            "Empty condition label for sample at position {}",
            idx
        )));
    }
    Ok(())
}

/// Convert validated values to integer counts, failing on the first bad cell.
fn to_count_matrix(table: &CountTable) -> Result<CountMatrix> {
    let mut tri_mat = TriMat::new((table.n_features(), table.n_samples()));

    for row in 0..table.n_features() {
        for col in 0..table.n_samples() {
            let value = table.get(row, col);
            let problem = if !value.is_finite() {
                Some("non-finite")
            } else if value < 0.0 {
                Some("negative")
            } else if value.fract() != 0.0 {
                Some("non-integer")
            } else if value > MAX_EXACT_COUNT {
                Some("too large")
            } else {
                None
            };
            if let Some(problem) = problem {
                return Err(ClrError::InvalidInput(format!(
                    "{} count {} for feature '{}' in sample '{}'",
                    problem,
                    value,
                    table.feature_ids()[row],
                    table.sample_ids()[col]
                )));
            }
            if value > 0.0 {
                tri_mat.add_triplet(row, col, value as u64);
            }
        }
    }

    CountMatrix::new(
        tri_mat.to_csr(),
        table.feature_ids().to_vec(),
        table.sample_ids().to_vec(),
    )
}
