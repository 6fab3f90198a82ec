//! Inter-quartile log-ratio (IQLR) denominator.

use crate::data::CountMatrix;
use crate::error::{ClrError, Result};
use crate::zero::DEFAULT_PRIOR;
use statrs::statistics::Statistics;

/// Features whose across-sample CLR variance lies within [Q1, Q3].
///
/// Each sample is CLR transformed (log2, prior-adjusted counts, all features
/// as reference), then the sample variance of every feature across samples is
/// computed. Features in the inter-quartile band of those variances form the
/// denominator. If the band is empty (possible with very few features) every
/// feature is used instead.
pub fn iqlr_features(counts: &CountMatrix) -> Result<Vec<usize>> {
    let n_samples = counts.n_samples();
    if n_samples < 2 {
        return Err(ClrError::InvalidInput(
            "IQLR denominator needs at least two samples to estimate variance".to_string(),
        ));
    }

    let mut log_data = counts.to_dense().add_scalar(DEFAULT_PRIOR).map(f64::log2);
    for mut col in log_data.column_iter_mut() {
        let mean = col.sum() / col.len() as f64;
        col.add_scalar_mut(-mean);
    }

    let variances: Vec<f64> = log_data
        .row_iter()
        .map(|row| row.iter().copied().variance())
        .collect();

    let band = variance_band(&variances);
    if band.is_empty() {
        log::warn!("IQLR variance band is empty; falling back to all features");
        return Ok((0..counts.n_features()).collect());
    }
    Ok(band)
}

/// Indices of values between the first and third quartile, inclusive.
fn variance_band(values: &[f64]) -> Vec<usize> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);

    values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v >= q1 && **v <= q3)
        .map(|(i, _)| i)
        .collect()
}

/// Linear-interpolation quantile of sorted data.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}
