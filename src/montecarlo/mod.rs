//! Monte Carlo Dirichlet sampling of per-sample relative abundances.
//!
//! Each sample's prior-adjusted counts are the concentration parameters of a
//! Dirichlet distribution; every draw is one plausible composition given the
//! observed reads. Draws are stored features × instances.

mod dirichlet;
mod seeds;

pub use dirichlet::{draw_instances, sample_monte_carlo, MonteCarloSample};
pub use seeds::sample_seeds;
