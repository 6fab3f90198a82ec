//! Denominator (CLR reference) feature selection.
//!
//! A [`DenominatorResolver`] turns a [`DenominatorMode`] into the feature
//! index set(s) whose geometric mean is used as the log-ratio reference.
//! The transform only relies on the [`FeatureSubset`] contract, checked by
//! [`FeatureSubset::validate`], never on how a set was chosen.
//!
//! Built-in modes:
//!
//! | Mode | Sets | Selection |
//! |------|------|-----------|
//! | `all` | one | every feature |
//! | `iqlr` | one | features whose CLR variance lies between Q1 and Q3 |
//! | `zero` | one per condition | features observed in every sample of the condition |
//! | `0,3,7` | one | explicit 0-based indices |

mod iqlr;
mod zero;

pub use iqlr::iqlr_features;
pub use zero::nonzero_features_per_condition;

use crate::data::{ConditionLabels, CountMatrix};
use crate::error::{ClrError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How the denominator features are chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DenominatorMode {
    /// Every feature; the classic CLR.
    #[default]
    All,
    /// Inter-quartile log-ratio: features with mid-range CLR variance.
    Iqlr,
    /// Per condition, features with non-zero counts in all its samples.
    Zero,
    /// Caller-chosen feature indices (0-based, after zero-sum removal).
    Explicit(Vec<usize>),
}

impl FromStr for DenominatorMode {
    type Err = ClrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "iqlr" => Ok(Self::Iqlr),
            "zero" => Ok(Self::Zero),
            other => {
                let indices = other
                    .split(',')
                    .map(|part| part.trim().parse::<usize>())
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|_| {
                        ClrError::InvalidParameter(format!(
                            "Unknown denominator '{}'; expected all, iqlr, zero or a list of feature indices",
                            s
                        ))
                    })?;
                Ok(Self::Explicit(indices))
            }
        }
    }
}

impl std::fmt::Display for DenominatorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Iqlr => write!(f, "iqlr"),
            Self::Zero => write!(f, "zero"),
            Self::Explicit(indices) => {
                let parts: Vec<String> = indices.iter().map(|i| i.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

/// Resolved denominator feature indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureSubset {
    /// One index set shared by every sample.
    Global(Vec<usize>),
    /// One index set per condition level, in first-appearance order.
    PerCondition(Vec<(String, Vec<usize>)>),
}

impl FeatureSubset {
    /// The subset containing every feature.
    pub fn all(n_features: usize) -> Self {
        Self::Global((0..n_features).collect())
    }

    /// Check the resolver contract against the table and conditions.
    ///
    /// Every set must be non-empty, strictly increasing and in range;
    /// per-condition output must list exactly the condition levels, in
    /// first-appearance order.
    pub fn validate(&self, n_features: usize, conditions: &ConditionLabels) -> Result<()> {
        match self {
            Self::Global(indices) => check_index_set("all samples", indices, n_features),
            Self::PerCondition(sets) => {
                let levels = conditions.levels();
                let labels: Vec<&str> = sets.iter().map(|(label, _)| label.as_str()).collect();
                if labels != levels {
                    return Err(ClrError::InvalidInput(format!(
                        "Denominator sets are for conditions {:?}, expected {:?}",
                        labels, levels
                    )));
                }
                for (label, indices) in sets {
                    check_index_set(label, indices, n_features)?;
                }
                Ok(())
            }
        }
    }

    /// True when a single set spans every feature, i.e. a plain CLR.
    pub fn is_complete(&self, n_features: usize) -> bool {
        match self {
            Self::Global(indices) => {
                let mut seen = vec![false; n_features];
                for &i in indices {
                    if i < n_features {
                        seen[i] = true;
                    }
                }
                seen.into_iter().all(|s| s)
            }
            Self::PerCondition(_) => false,
        }
    }

    /// Index set that applies to samples of condition `label`.
    pub fn for_condition(&self, label: &str) -> Option<&[usize]> {
        match self {
            Self::Global(indices) => Some(indices),
            Self::PerCondition(sets) => sets
                .iter()
                .find(|(level, _)| level == label)
                .map(|(_, indices)| indices.as_slice()),
        }
    }

    /// Number of distinct index sets.
    pub fn n_sets(&self) -> usize {
        match self {
            Self::Global(_) => 1,
            Self::PerCondition(sets) => sets.len(),
        }
    }
}

fn check_index_set(owner: &str, indices: &[usize], n_features: usize) -> Result<()> {
    if indices.is_empty() {
        return Err(ClrError::InvalidInput(format!(
            "Denominator for {} has no features",
            owner
        )));
    }
    if let Some(&bad) = indices.iter().find(|&&i| i >= n_features) {
        return Err(ClrError::InvalidInput(format!(
            "Denominator index {} for {} is out of range for {} features",
            bad, owner, n_features
        )));
    }
    if let Some(pair) = indices.windows(2).find(|pair| pair[0] >= pair[1]) {
        return Err(ClrError::InvalidInput(format!(
            "Denominator for {} must be sorted without duplicates, found {} before {}",
            owner, pair[0], pair[1]
        )));
    }
    Ok(())
}

/// Chooses denominator features for a sanitized table.
pub trait DenominatorResolver {
    fn resolve(
        &self,
        counts: &CountMatrix,
        conditions: &ConditionLabels,
        mode: &DenominatorMode,
    ) -> Result<FeatureSubset>;
}

/// Resolver implementing every [`DenominatorMode`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinResolver;

impl DenominatorResolver for BuiltinResolver {
    fn resolve(
        &self,
        counts: &CountMatrix,
        conditions: &ConditionLabels,
        mode: &DenominatorMode,
    ) -> Result<FeatureSubset> {
        let subset = match mode {
            DenominatorMode::All => FeatureSubset::all(counts.n_features()),
            DenominatorMode::Iqlr => FeatureSubset::Global(iqlr_features(counts)?),
            DenominatorMode::Zero => {
                FeatureSubset::PerCondition(nonzero_features_per_condition(counts, conditions)?)
            }
            DenominatorMode::Explicit(indices) => {
                let mut indices = indices.clone();
                indices.sort_unstable();
                indices.dedup();
                FeatureSubset::Global(indices)
            }
        };
        subset.validate(counts.n_features(), conditions)?;
        Ok(subset)
    }
}
