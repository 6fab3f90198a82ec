//! Removal of features never observed in any sample.

use crate::data::CountMatrix;
use crate::error::{ClrError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Statistics about the features dropped for having a zero row sum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZeroSumFilterResult {
    /// Number of features before filtering.
    pub n_before: usize,
    /// Number of features after filtering.
    pub n_after: usize,
    /// Identifiers of the dropped features, in their original order.
    pub removed: Vec<String>,
}

impl ZeroSumFilterResult {
    pub fn n_removed(&self) -> usize {
        self.removed.len()
    }
}

impl std::fmt::Display for ZeroSumFilterResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Zero-Sum Filter Result")?;
        writeln!(f, "  Before:   {} features", self.n_before)?;
        writeln!(f, "  After:    {} features", self.n_after)?;
        writeln!(f, "  Removed:  {} features", self.n_removed())?;
        Ok(())
    }
}

/// Drop every feature whose counts sum to zero across all samples.
///
/// Kept features stay in their original relative order.
///
/// # Returns
/// The filtered matrix and statistics about what was removed.
pub fn filter_zero_sum(counts: &CountMatrix) -> Result<(CountMatrix, ZeroSumFilterResult)> {
    let row_sums = counts.row_sums();

    let keep_indices: Vec<usize> = (0..counts.n_features())
        .into_par_iter()
        .filter(|&row| row_sums[row] > 0)
        .collect();

    if keep_indices.is_empty() {
        return Err(ClrError::InvalidInput(
            "Every feature has zero counts in all samples".to_string(),
        ));
    }

    let removed = row_sums
        .iter()
        .enumerate()
        .filter(|(_, sum)| **sum == 0)
        .map(|(row, _)| counts.feature_ids()[row].clone())
        .collect();

    let filtered = counts.subset_features(&keep_indices)?;
    let result = ZeroSumFilterResult {
        n_before: counts.n_features(),
        n_after: filtered.n_features(),
        removed,
    };

    Ok((filtered, result))
}
