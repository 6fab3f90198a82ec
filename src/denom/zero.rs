//! Per-condition denominator of features observed in every sample.

use crate::data::{ConditionLabels, CountMatrix};
use crate::error::{ClrError, Result};

/// For each condition level, the features with a non-zero count in all of
/// that condition's samples.
///
/// Levels are returned in first-appearance order. A condition in which no
/// feature is observed everywhere is an input error, since it leaves that
/// condition without a reference.
pub fn nonzero_features_per_condition(
    counts: &CountMatrix,
    conditions: &ConditionLabels,
) -> Result<Vec<(String, Vec<usize>)>> {
    if conditions.len() != counts.n_samples() {
        return Err(ClrError::DimensionMismatch {
            expected: counts.n_samples(),
            actual: conditions.len(),
        });
    }

    let rows: Vec<Vec<u64>> = (0..counts.n_features()).map(|r| counts.row_dense(r)).collect();

    conditions
        .group_indices()
        .into_iter()
        .map(|(level, samples)| {
            let features: Vec<usize> = rows
                .iter()
                .enumerate()
                .filter(|(_, row)| samples.iter().all(|&s| row[s] > 0))
                .map(|(i, _)| i)
                .collect();
            if features.is_empty() {
                return Err(ClrError::InvalidInput(format!(
                    "No feature is observed in every sample of condition '{}'",
                    level
                )));
            }
            Ok((level, features))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts() -> CountMatrix {
        // samples: s1(A) s2(B) s3(A) s4(B)
        CountMatrix::from_rows(
            &[
                vec![5, 0, 2, 0],
                vec![10, 12, 9, 11],
                vec![0, 1, 4, 6],
                vec![3, 0, 1, 8],
            ],
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            vec!["s1".into(), "s2".into(), "s3".into(), "s4".into()],
        )
        .unwrap()
    }

    #[test]
    fn test_sets_per_condition_interleaved() {
        let conds = ConditionLabels::new(["A", "B", "A", "B"]);
        let sets = nonzero_features_per_condition(&counts(), &conds).unwrap();
        assert_eq!(
            sets,
            vec![
                ("A".to_string(), vec![0, 1, 3]),
                ("B".to_string(), vec![1, 2]),
            ]
        );
    }

    #[test]
    fn test_condition_without_shared_feature() {
        let counts = CountMatrix::from_rows(
            &[vec![1, 0, 4], vec![0, 2, 4]],
            vec!["a".into(), "b".into()],
            vec!["s1".into(), "s2".into(), "s3".into()],
        )
        .unwrap();
        let conds = ConditionLabels::new(["A", "A", "B"]);
        let result = nonzero_features_per_condition(&counts, &conds);
        assert!(matches!(result, Err(ClrError::InvalidInput(_))));
    }
}
