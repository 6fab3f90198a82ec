//! Feature filtering applied during sanitization.

pub mod zero_sum;

pub use zero_sum::{filter_zero_sum, ZeroSumFilterResult};
