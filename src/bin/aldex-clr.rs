//! aldex-clr - Monte Carlo CLR CLI
//!
//! Command-line interface for the Dirichlet Monte Carlo CLR transform.

use aldex_clr::data::{ConditionLabels, CountTable};
use aldex_clr::denom::{BuiltinResolver, DenominatorMode, DenominatorResolver};
use aldex_clr::error::Result;
use aldex_clr::pipeline::{transform, ClrConfig};
use aldex_clr::sanitize::sanitize;
use clap::{ArgAction, Parser, Subcommand};
use log::{info, LevelFilter};
use std::path::{Path, PathBuf};

/// Monte Carlo centered log-ratio transform of count tables
#[derive(Parser)]
#[command(name = "aldex-clr")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Inputs shared by every subcommand that reads data.
#[derive(clap::Args)]
struct InputArgs {
    /// Path to count table TSV (features × samples)
    #[arg(short = 'c', long)]
    counts: PathBuf,

    /// Path to sample metadata TSV
    #[arg(short, long)]
    metadata: PathBuf,

    /// Metadata column holding the condition labels
    #[arg(short, long)]
    group: String,

    /// YAML run configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Denominator: all, iqlr, zero, or comma-separated feature indices
    #[arg(short, long)]
    denom: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform counts and write the expected CLR value per feature and sample
    Clr {
        #[command(flatten)]
        input: InputArgs,

        /// Output path for the expected CLR TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Monte Carlo instances per sample
        #[arg(long)]
        mc_samples: Option<usize>,

        /// Master random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Map over samples in parallel
        #[arg(long)]
        parallel: bool,

        /// Also write the run summary as JSON
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Print the resolved denominator features as JSON
    Denom {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Write a run configuration YAML with default settings
    Config {
        /// Output path for the YAML file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let result = match cli.command {
        Commands::Clr {
            input,
            output,
            mc_samples,
            seed,
            parallel,
            summary,
        } => cmd_clr(
            &input,
            &output,
            mc_samples,
            seed,
            parallel,
            summary.as_deref(),
            cli.verbose > 0,
        ),
        Commands::Denom { input } => cmd_denom(&input),
        Commands::Config { output } => cmd_config(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Build the run configuration from an optional YAML file plus flag overrides.
fn load_config(input: &InputArgs) -> Result<ClrConfig> {
    let mut config = match &input.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            ClrConfig::from_yaml_file(path)?
        }
        None => ClrConfig::default(),
    };
    if let Some(denom) = &input.denom {
        config.denom = denom.parse::<DenominatorMode>()?;
    }
    Ok(config)
}

fn load_inputs(input: &InputArgs) -> Result<(CountTable, ConditionLabels)> {
    info!("Loading counts from {:?}", input.counts);
    let table = CountTable::from_tsv(&input.counts)?;
    let conditions = ConditionLabels::from_tsv(&input.metadata, &input.group, table.sample_ids())?;
    info!(
        "Loaded {} features x {} samples in {} conditions",
        table.n_features(),
        table.n_samples(),
        conditions.n_levels()
    );
    Ok((table, conditions))
}

/// Run the transform and write the expected CLR table
fn cmd_clr(
    input: &InputArgs,
    output: &Path,
    mc_samples: Option<usize>,
    seed: Option<u64>,
    parallel: bool,
    summary_path: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let mut config = load_config(input)?;
    if let Some(mc_samples) = mc_samples {
        config.mc_samples = mc_samples;
    }
    if seed.is_some() {
        config.seed = seed;
    }
    if parallel {
        config.use_parallel = true;
    }
    if verbose {
        config.verbose = true;
    }

    let (table, conditions) = load_inputs(input)?;
    let result = transform(&table, &conditions, &config)?;

    info!("Writing expected CLR values to {:?}", output);
    result.expected_clr().to_tsv(output)?;

    let summary = result.summary();
    if let Some(path) = summary_path {
        std::fs::write(path, serde_json::to_string_pretty(&summary)?)?;
    }
    eprint!("{}", summary);

    Ok(())
}

/// Resolve the denominator without sampling
fn cmd_denom(input: &InputArgs) -> Result<()> {
    let config = load_config(input)?;
    let (table, conditions) = load_inputs(input)?;
    let sanitized = sanitize(&table, &conditions, config.mc_samples)?;

    let subset = BuiltinResolver.resolve(&sanitized.counts, &conditions, &config.denom)?;
    subset.validate(sanitized.counts.n_features(), &conditions)?;

    let named = serde_json::json!({
        "mode": config.denom.to_string(),
        "feature_ids": sanitized.counts.feature_ids(),
        "denominator": subset,
    });
    println!("{}", serde_json::to_string_pretty(&named)?);
    Ok(())
}

/// Write a default configuration
fn cmd_config(output: &Path) -> Result<()> {
    let yaml = ClrConfig::default().to_yaml()?;
    std::fs::write(output, yaml)?;
    eprintln!("Wrote default configuration to {:?}", output);
    Ok(())
}
