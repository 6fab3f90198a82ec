//! End-to-end Monte Carlo CLR.

use super::ClrConfig;
use crate::data::{AldexClr, ConditionLabels, CountTable};
use crate::denom::{BuiltinResolver, DenominatorResolver};
use crate::error::Result;
use crate::montecarlo::sample_monte_carlo;
use crate::normalize::transform_samples;
use crate::parallel::{Rayon, SampleMap, Sequential};
use crate::sanitize::sanitize;
use log::{debug, info};

/// Run the Monte Carlo CLR transform with the built-in denominator modes.
///
/// The sample map is [`Rayon`] when `config.use_parallel` is set, otherwise
/// [`Sequential`]; both give identical output for a fixed seed.
///
/// # Example
///
/// ```no_run
/// use aldex_clr::prelude::*;
///
/// let counts = CountTable::from_tsv("counts.tsv").unwrap();
/// let conditions = ConditionLabels::from_tsv("metadata.tsv", "group", counts.sample_ids()).unwrap();
/// let config = ClrConfig::default().with_denom(DenominatorMode::Iqlr).with_seed(42);
/// let result = transform(&counts, &conditions, &config).unwrap();
/// println!("{}", result.summary());
/// ```
pub fn transform(
    table: &CountTable,
    conditions: &ConditionLabels,
    config: &ClrConfig,
) -> Result<AldexClr> {
    if config.use_parallel {
        transform_with(table, conditions, config, &BuiltinResolver, &Rayon)
    } else {
        transform_with(table, conditions, config, &BuiltinResolver, &Sequential)
    }
}

/// Run the transform with an injected denominator resolver and sample map.
///
/// Steps: sanitize, resolve the denominator, draw Dirichlet instances,
/// CLR-transform each sample, assemble the result. The first error aborts
/// the run.
pub fn transform_with<D, M>(
    table: &CountTable,
    conditions: &ConditionLabels,
    config: &ClrConfig,
    resolver: &D,
    mapper: &M,
) -> Result<AldexClr>
where
    D: DenominatorResolver + ?Sized,
    M: SampleMap,
{
    let sanitized = sanitize(table, conditions, config.mc_samples)?;
    if config.verbose {
        info!(
            "Sanitized {} features × {} samples ({} zero-sum features removed)",
            sanitized.counts.n_features(),
            sanitized.counts.n_samples(),
            sanitized.zero_sum.n_removed()
        );
    }

    let denominator = resolver.resolve(&sanitized.counts, conditions, &config.denom)?;
    denominator.validate(sanitized.counts.n_features(), conditions)?;
    if config.verbose {
        info!(
            "Denominator '{}' resolved to {} feature set(s)",
            config.denom,
            denominator.n_sets()
        );
    }
    debug!("Denominator features: {:?}", denominator);

    if config.verbose {
        info!(
            "Drawing {} Monte Carlo instances per sample ({})",
            config.mc_samples,
            mapper.name()
        );
    }
    let draws = sample_monte_carlo(
        &sanitized.prior_adjusted,
        config.mc_samples,
        config.seed,
        mapper,
    )?;

    let (branch, clrs) = transform_samples(&draws, conditions, &denominator, mapper)?;
    if config.verbose {
        info!("CLR transform complete ({:?} reference)", branch);
    }

    AldexClr::new(
        clrs,
        sanitized.prior_adjusted,
        conditions.clone(),
        config.mc_samples,
        config.denom.clone(),
        denominator,
        branch,
        sanitized.warnings,
    )
}
