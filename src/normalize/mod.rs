//! Log-ratio transformation of Monte Carlo instances.
//!
//! - **DEFAULT**: reference is the geometric mean of all features
//! - **RESTRICTED**: reference is the geometric mean of a feature subset,
//!   shared by all samples or chosen per condition

pub mod clr;

pub use clr::{
    clr_default, clr_restricted, instance_reference, select_branch, transform_samples, ClrBranch,
    ClrMatrix, TransformedMatrix,
};
