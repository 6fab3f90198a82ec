//! Pipeline composition: sanitize, resolve, sample, transform.

mod config;
mod runner;

pub use config::ClrConfig;
pub use runner::{transform, transform_with};
