//! Monte Carlo Centered Log-Ratio (CLR) transform for count data
//!
//! Sequencing read counts carry only relative information. This library
//! turns a features × samples count table into many plausible CLR-transformed
//! versions of itself: each sample's counts (plus a 0.5 prior) parameterize
//! a Dirichlet distribution, a number of Monte Carlo instances are drawn
//! from it, and every instance is log2-ratio transformed against a
//! reference ("denominator") set of features.
//!
//! # Overview
//!
//! - **data**: Count tables, condition labels and the [`data::AldexClr`] result
//! - **sanitize**: Input validation, zero-sum removal and prior addition
//! - **filter**: Zero-sum feature filter
//! - **zero**: Prior (pseudocount) handling
//! - **denom**: Denominator modes (`all`, `iqlr`, `zero`, explicit indices)
//! - **montecarlo**: Seeded Dirichlet sampling per sample
//! - **normalize**: DEFAULT and RESTRICTED CLR transforms
//! - **parallel**: Serial or rayon map over samples
//! - **pipeline**: Configuration and end-to-end execution
//!
//! # Example
//!
//! ```no_run
//! use aldex_clr::prelude::*;
//!
//! let counts = CountTable::from_tsv("counts.tsv").unwrap();
//! let conditions = ConditionLabels::new(["ctl", "ctl", "trt", "trt"]);
//!
//! let config = ClrConfig::default()
//!     .with_mc_samples(256)
//!     .with_denom(DenominatorMode::Iqlr)
//!     .with_seed(42);
//! let result = transform(&counts, &conditions, &config).unwrap();
//!
//! let clr = result.sample_clr(&counts.sample_ids()[0]).unwrap();
//! println!("{} features × {} instances", clr.n_features(), clr.n_instances());
//! result.expected_clr().to_tsv("expected_clr.tsv").unwrap();
//! ```

pub mod data;
pub mod denom;
pub mod error;
pub mod filter;
pub mod montecarlo;
pub mod normalize;
pub mod parallel;
pub mod pipeline;
pub mod sanitize;
pub mod zero;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::data::{AldexClr, ClrSummary, ConditionLabels, CountMatrix, CountTable};
    pub use crate::denom::{
        iqlr_features, nonzero_features_per_condition, BuiltinResolver, DenominatorMode,
        DenominatorResolver, FeatureSubset,
    };
    pub use crate::error::{ClrError, Result};
    pub use crate::filter::{filter_zero_sum, ZeroSumFilterResult};
    pub use crate::montecarlo::{sample_monte_carlo, MonteCarloSample};
    pub use crate::normalize::{
        clr_default, clr_restricted, transform_samples, ClrBranch, ClrMatrix, TransformedMatrix,
    };
    pub use crate::parallel::{Rayon, SampleMap, Sequential};
    pub use crate::pipeline::{transform, transform_with, ClrConfig};
    pub use crate::sanitize::{sanitize, ConfigWarning, SanitizedInput, MIN_RELIABLE_MC_SAMPLES};
    pub use crate::zero::{add_prior, PriorAdjustedTable, DEFAULT_PRIOR};
}
