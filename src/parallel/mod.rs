//! Per-sample map used by the sampler and the transformer.
//!
//! Work over samples is embarrassingly parallel, so the pipeline only needs
//! an order-preserving map. [`Sequential`] and [`Rayon`] give identical
//! output for the same input; callers may inject their own implementation
//! through [`crate::pipeline::transform_with`].

use crate::error::Result;
use rayon::prelude::*;

/// Order-preserving map over a collection of per-sample work items.
pub trait SampleMap: Sync {
    /// Apply `f` to every item, returning results in input order.
    fn map<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync + Send;

    /// Fallible variant of [`SampleMap::map`]; the first error in input order wins.
    fn try_map<T, R, F>(&self, items: Vec<T>, f: F) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> Result<R> + Sync + Send,
    {
        self.map(items, f).into_iter().collect()
    }

    /// Name used in log messages.
    fn name(&self) -> &'static str;
}

/// Plain iterator map on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl SampleMap for Sequential {
    fn map<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync + Send,
    {
        items.into_iter().map(f).collect()
    }

    fn name(&self) -> &'static str {
        "sequential"
    }
}

/// Map on the global rayon thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rayon;

impl SampleMap for Rayon {
    fn map<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync + Send,
    {
        items.into_par_iter().map(f).collect()
    }

    fn name(&self) -> &'static str {
        "rayon"
    }
}
