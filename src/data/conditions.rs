//! Per-sample condition labels.

use crate::error::{ClrError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One condition label per sample column, in the table's column order.
///
/// Levels (distinct labels) are always reported in order of first appearance,
/// which is also the order per-condition denominators are returned in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionLabels {
    labels: Vec<String>,
}

impl ConditionLabels {
    /// Create labels from anything string-like.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Read a condition column from a sample metadata TSV.
    ///
    /// Expected format:
    /// - First row: header with column names (first column is sample ID)
    /// - Subsequent rows: sample ID followed by variable values
    ///
    /// Labels are returned in the order of `sample_ids`, so the metadata rows
    /// may be in any order. Every sample must be present with a non-missing
    /// value.
    pub fn from_tsv<P: AsRef<Path>>(path: P, column: &str, sample_ids: &[String]) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| ClrError::InvalidInput("Empty metadata file".to_string()))??;
        let header: Vec<&str> = header_line.split('\t').map(str::trim).collect();
        let col_idx = header
            .iter()
            .skip(1)
            .position(|name| *name == column)
            .map(|i| i + 1)
            .ok_or_else(|| {
                ClrError::InvalidInput(format!("Missing column '{}' in metadata", column))
            })?;

        let mut by_sample: HashMap<String, String> = HashMap::new();
        for line_result in lines {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let value = fields.get(col_idx).map(|v| v.trim()).unwrap_or("");
            if value.is_empty() || value == "NA" || value == "na" {
                continue;
            }
            by_sample.insert(fields[0].trim().to_string(), value.to_string());
        }

        let labels = sample_ids
            .iter()
            .map(|id| {
                by_sample.get(id).cloned().ok_or_else(|| {
                    ClrError::InvalidInput(format!(
                        "Sample '{}' has no value for '{}' in metadata",
                        id, column
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { labels })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label of the sample at column `sample`.
    pub fn label(&self, sample: usize) -> Option<&str> {
        self.labels.get(sample).map(String::as_str)
    }

    /// Distinct labels in first-appearance order.
    pub fn levels(&self) -> Vec<&str> {
        let mut levels: Vec<&str> = Vec::new();
        for label in &self.labels {
            if !levels.contains(&label.as_str()) {
                levels.push(label);
            }
        }
        levels
    }

    /// Number of distinct conditions.
    pub fn n_levels(&self) -> usize {
        self.levels().len()
    }

    /// Sample column indices per level, levels in first-appearance order.
    pub fn group_indices(&self) -> Vec<(String, Vec<usize>)> {
        let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
        for (idx, label) in self.labels.iter().enumerate() {
            match groups.iter_mut().find(|(level, _)| level == label) {
                Some((_, indices)) => indices.push(idx),
                None => groups.push((label.clone(), vec![idx])),
            }
        }
        groups
    }
}
