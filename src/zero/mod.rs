//! Zero handling before Dirichlet sampling.

pub mod prior;

pub use prior::{add_prior, PriorAdjustedTable, DEFAULT_PRIOR};
