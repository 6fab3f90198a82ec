//! Sanitized sparse count matrix.

use crate::error::{ClrError, Result};
use rayon::prelude::*;
use sprs::{CsMat, TriMat};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Canonical feature × sample table of non-negative integer read counts.
///
/// Produced by [`crate::sanitize::sanitize`]: names are unique and non-empty
/// and no feature row sums to zero. Stored as CSR because sequencing tables
/// are mostly zeros.
#[derive(Debug, Clone)]
pub struct CountMatrix {
    /// Sparse matrix in CSR format (features × samples)
    data: CsMat<u64>,
    /// Feature identifiers (row names)
    feature_ids: Vec<String>,
    /// Sample identifiers (column names)
    sample_ids: Vec<String>,
}

impl CountMatrix {
    /// Create a new CountMatrix from a sparse matrix and identifiers.
    pub fn new(
        data: CsMat<u64>,
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != feature_ids.len() {
            return Err(ClrError::DimensionMismatch {
                expected: nrows,
                actual: feature_ids.len(),
            });
        }
        if ncols != sample_ids.len() {
            return Err(ClrError::DimensionMismatch {
                expected: ncols,
                actual: sample_ids.len(),
            });
        }
        Ok(Self {
            data,
            feature_ids,
            sample_ids,
        })
    }

    /// Build from dense rows of counts, skipping explicit zeros.
    pub fn from_rows(
        rows: &[Vec<u64>],
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        let n_samples = sample_ids.len();
        let mut tri_mat = TriMat::new((rows.len(), n_samples));
        for (row, values) in rows.iter().enumerate() {
            if values.len() != n_samples {
                return Err(ClrError::DimensionMismatch {
                    expected: n_samples,
                    actual: values.len(),
                });
            }
            for (col, &val) in values.iter().enumerate() {
                if val > 0 {
                    tri_mat.add_triplet(row, col, val);
                }
            }
        }
        Self::new(tri_mat.to_csr(), feature_ids, sample_ids)
    }

    /// Load integer counts from a TSV file.
    ///
    /// The first row holds sample names after a feature-id column; each
    /// following row is one feature. Every cell must parse as a `u64`.
    /// Use [`crate::data::CountTable::from_tsv`] for tables that still need
    /// validation.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mut lines = BufReader::new(file).lines();

        let header_line = lines
            .next()
            .ok_or_else(|| ClrError::InvalidInput("Empty TSV file".to_string()))??;
        let header: Vec<&str> = header_line.split('\t').collect();
        if header.len() < 2 {
            return Err(ClrError::InvalidInput(
                "TSV must have at least one sample".to_string(),
            ));
        }
        let sample_ids: Vec<String> = header[1..].iter().map(|s| s.to_string()).collect();
        let n_samples = sample_ids.len();

        let mut triplets: Vec<(usize, usize, u64)> = Vec::new();
        let mut feature_ids: Vec<String> = Vec::new();

        for line_result in lines {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != n_samples + 1 {
                return Err(ClrError::InvalidInput(format!(
                    "Row '{}' has {} values, expected {}",
                    fields[0],
                    fields.len() - 1,
                    n_samples
                )));
            }

            let row = feature_ids.len();
            for (col, value_str) in fields[1..].iter().enumerate() {
                let value: u64 = value_str.trim().parse().map_err(|_| {
                    ClrError::InvalidInput(format!(
                        "Invalid count '{}' for feature '{}' in sample '{}'",
                        value_str, fields[0], sample_ids[col]
                    ))
                })?;
                if value > 0 {
                    triplets.push((row, col, value));
                }
            }
            feature_ids.push(fields[0].to_string());
        }

        if feature_ids.is_empty() {
            return Err(ClrError::InvalidInput("No features in TSV".to_string()));
        }

        let mut tri_mat = TriMat::new((feature_ids.len(), n_samples));
        for (row, col, val) in triplets {
            tri_mat.add_triplet(row, col, val);
        }
        Self::new(tri_mat.to_csr(), feature_ids, sample_ids)
    }

    /// Write the count matrix to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "feature_id")?;
        for sample_id in &self.sample_ids {
            write!(writer, "\t{}", sample_id)?;
        }
        writeln!(writer)?;

        for (row_idx, feature_id) in self.feature_ids.iter().enumerate() {
            write!(writer, "{}", feature_id)?;
            for col_idx in 0..self.n_samples() {
                write!(writer, "\t{}", self.get(row_idx, col_idx))?;
            }
            writeln!(writer)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Get the value at (row, col), returning 0 for missing entries.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u64 {
        self.data.get(row, col).copied().unwrap_or(0)
    }

    /// Number of features (rows).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.data.rows()
    }

    /// Number of samples (columns).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.cols()
    }

    #[inline]
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Dense copy of one feature row.
    pub fn row_dense(&self, row: usize) -> Vec<u64> {
        let mut dense = vec![0u64; self.n_samples()];
        if let Some(row_vec) = self.data.outer_view(row) {
            for (col, &val) in row_vec.iter() {
                dense[col] = val;
            }
        }
        dense
    }

    /// Total reads per feature, accumulated in `u128` so no row can overflow.
    pub fn row_sums(&self) -> Vec<u128> {
        (0..self.n_features())
            .into_par_iter()
            .map(|row| {
                self.data
                    .outer_view(row)
                    .map(|v| v.iter().map(|(_, &val)| u128::from(val)).sum())
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Subset the matrix to the given feature rows, in the given order.
    pub fn subset_features(&self, indices: &[usize]) -> Result<Self> {
        let n_samples = self.n_samples();
        let mut tri_mat = TriMat::new((indices.len(), n_samples));
        let mut new_feature_ids = Vec::with_capacity(indices.len());

        for (new_row, &old_row) in indices.iter().enumerate() {
            if old_row >= self.n_features() {
                return Err(ClrError::InvalidParameter(format!(
                    "Feature index {} out of bounds",
                    old_row
                )));
            }
            new_feature_ids.push(self.feature_ids[old_row].clone());

            if let Some(row_vec) = self.data.outer_view(old_row) {
                for (col, &val) in row_vec.iter() {
                    tri_mat.add_triplet(new_row, col, val);
                }
            }
        }

        Self::new(tri_mat.to_csr(), new_feature_ids, self.sample_ids.clone())
    }

    /// Convert to a dense matrix (f64).
    pub fn to_dense(&self) -> nalgebra::DMatrix<f64> {
        let mut dense = nalgebra::DMatrix::zeros(self.n_features(), self.n_samples());
        for (row, row_vec) in self.data.outer_iterator().enumerate() {
            for (col, &val) in row_vec.iter() {
                dense[(row, col)] = val as f64;
            }
        }
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_matrix() -> CountMatrix {
        // 3 features × 4 samples; otu_3 only seen in s1
        CountMatrix::from_rows(
            &[
                vec![10, 20, 0, 5],
                vec![100, 200, 150, 175],
                vec![1, 0, 0, 0],
            ],
            vec!["otu_1".into(), "otu_2".into(), "otu_3".into()],
            vec!["s1".into(), "s2".into(), "s3".into(), "s4".into()],
        )
        .unwrap()
    }

    #[test]
    fn test_dimensions() {
        let mat = create_test_matrix();
        assert_eq!(mat.n_features(), 3);
        assert_eq!(mat.n_samples(), 4);
    }

    #[test]
    fn test_get_and_dense_views() {
        let mat = create_test_matrix();
        assert_eq!(mat.get(0, 2), 0);
        assert_eq!(mat.get(2, 0), 1);
        assert_eq!(mat.row_dense(0), vec![10, 20, 0, 5]);
        assert_eq!(mat.row_dense(2), vec![1, 0, 0, 0]);
    }

    #[test]
    fn test_sums() {
        let mat = create_test_matrix();
        assert_eq!(mat.row_sums(), vec![35, 625, 1]);
    }

    #[test]
    fn test_row_sums_do_not_overflow() {
        let mat = CountMatrix::from_rows(
            &[vec![u64::MAX, u64::MAX], vec![3, 4]],
            vec!["big".into(), "small".into()],
            vec!["s1".into(), "s2".into()],
        )
        .unwrap();
        assert_eq!(mat.row_sums(), vec![2 * u128::from(u64::MAX), 7]);
    }

    #[test]
    fn test_subset_features_keeps_order() {
        let mat = create_test_matrix();
        let subset = mat.subset_features(&[0, 2]).unwrap();
        assert_eq!(subset.feature_ids(), &["otu_1", "otu_3"]);
        assert_eq!(subset.get(1, 0), 1);
        assert!(mat.subset_features(&[5]).is_err());
    }

    #[test]
    fn test_from_rows_rejects_ragged_rows() {
        let result = CountMatrix::from_rows(
            &[vec![1, 2], vec![3]],
            vec!["a".into(), "b".into()],
            vec!["s1".into(), "s2".into()],
        );
        assert!(matches!(result, Err(ClrError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_tsv_roundtrip() {
        let mat = create_test_matrix();
        let temp_file = NamedTempFile::new().unwrap();
        mat.to_tsv(temp_file.path()).unwrap();

        let loaded = CountMatrix::from_tsv(temp_file.path()).unwrap();
        assert_eq!(loaded.feature_ids(), mat.feature_ids());
        assert_eq!(loaded.sample_ids(), mat.sample_ids());
        for row in 0..mat.n_features() {
            assert_eq!(loaded.row_dense(row), mat.row_dense(row));
        }
    }

    #[test]
    fn test_from_tsv_rejects_fractional_count() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "feature_id\ts1\ts2").unwrap();
        writeln!(temp_file, "otu_1\t3\t2.5").unwrap();
        temp_file.flush().unwrap();
        let result = CountMatrix::from_tsv(temp_file.path());
        assert!(matches!(result, Err(ClrError::InvalidInput(_))));
    }
}
