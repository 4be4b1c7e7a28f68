use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use canopy_data::{DataMatrix, TableReader};
use canopy_summary::{
    BaggingConfig, LeafStore, Merged, OobMode, Summary, SummarySet, SummaryType,
};

#[derive(Parser)]
#[command(name = "canopy")]
#[command(about = "Per-feature leaf summaries for random forests: bag, store, merge, inspect")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// List the registered summary kinds
    Types,

    /// Build bagged leaf summaries from a CSV file and save them as a leaf store
    Fit {
        /// Path to the input CSV file (header row of feature names)
        #[arg(long)]
        data: PathBuf,

        /// One type code per feature, e.g. "GBNC"; missing codes use the defaults
        #[arg(long)]
        codes: Option<String>,

        /// Columns to read as discrete even if numeric (comma-separated)
        #[arg(long, value_delimiter = ',')]
        discrete: Vec<String>,

        /// Number of bootstrap bags
        #[arg(long, default_value_t = 10)]
        bags: usize,

        /// Fraction of rows drawn per bag
        #[arg(long, default_value_t = 1.0)]
        bootstrap_fraction: f64,

        /// Skip out-of-bag error scoring
        #[arg(long, default_value_t = false)]
        no_oob: bool,

        /// Path of the leaf store to write
        #[arg(long)]
        output: PathBuf,
    },

    /// Merge the stored sets and print the aggregate per feature
    Merge {
        /// Path to a leaf store
        #[arg(long)]
        store: PathBuf,

        /// Treat the sets as consecutive groups of this many trees, one group per exemplar
        #[arg(long)]
        trees: Option<usize>,
    },

    /// Print every stored set's statistics
    Inspect {
        /// Path to a leaf store
        #[arg(long)]
        store: PathBuf,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct FitOutput {
    n_rows: usize,
    n_features: usize,
    n_bags: usize,
    codes: String,
    oob_error: Option<Vec<f64>>,
    oob_rows_scored: Option<usize>,
    output: PathBuf,
}

#[derive(Serialize)]
struct InspectOutput {
    n_sets: usize,
    n_features: usize,
    sets: Vec<SetOutput>,
}

#[derive(Serialize)]
struct SetOutput {
    codes: String,
    encoded_bytes: usize,
    features: Vec<SummaryOutput>,
}

#[derive(Serialize)]
struct SummaryOutput {
    count: Option<u32>,
    statistics: Merged,
}

fn row_count(summary: &Summary) -> Option<u32> {
    match summary {
        Summary::Nothing(_) => None,
        Summary::Categorical(s) => Some(s.count()),
        Summary::Gaussian(s) => Some(s.count()),
        Summary::BiGaussian(s) => Some(s.count()),
    }
}

fn describe_set(set: &SummarySet) -> Result<SetOutput> {
    // A one-set merge reproduces each summary's own statistics.
    let merged = SummarySet::merge(&[set]).context("failed to read set statistics")?;
    let features = set
        .summaries()
        .iter()
        .zip(merged.into_inner())
        .map(|(summary, statistics)| SummaryOutput {
            count: row_count(summary),
            statistics,
        })
        .collect();
    Ok(SetOutput {
        codes: set.codes(),
        encoded_bytes: set.encoded_len(),
        features,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Types => {
            let types: Vec<&SummaryType> = SummaryType::list().collect();
            println!("{}", serde_json::to_string_pretty(&types)?);
        }

        Command::Fit {
            data,
            codes,
            discrete,
            bags,
            bootstrap_fraction,
            no_oob,
            output,
        } => {
            // 1. Read dataset
            let table = TableReader::new(&data)
                .with_discrete(discrete)
                .read()
                .context("failed to read input CSV")?;
            info!(
                n_rows = table.n_rows(),
                n_features = table.n_features(),
                "dataset loaded"
            );

            // 2. Bag
            let oob_mode = if no_oob {
                OobMode::Disabled
            } else {
                OobMode::Enabled
            };
            let result = BaggingConfig::new(bags)?
                .with_seed(cli.seed)
                .with_codes(codes)
                .with_bootstrap_fraction(bootstrap_fraction)
                .with_oob_mode(oob_mode)
                .fit(&table)
                .context("bagging failed")?;

            // 3. Save
            result
                .store()
                .save(&output)
                .context("failed to save leaf store")?;

            // 4. Print summary
            let output = FitOutput {
                n_rows: table.n_rows(),
                n_features: table.n_features(),
                n_bags: result.store().len(),
                codes: result
                    .store()
                    .sets()
                    .first()
                    .map(SummarySet::codes)
                    .unwrap_or_default(),
                oob_error: result.oob_error().map(|e| e.mean()),
                oob_rows_scored: result.oob_error().map(|e| e.n_scored),
                output,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Merge { store, trees } => {
            let store = LeafStore::load(&store).context("failed to load leaf store")?;
            info!(n_sets = store.len(), "leaf store loaded");

            match trees {
                None => {
                    let merged = SummarySet::merge(store.sets()).context("merge failed")?;
                    println!("{}", serde_json::to_string_pretty(&merged)?);
                }
                Some(trees) => {
                    if trees == 0 || store.len() % trees != 0 {
                        anyhow::bail!(
                            "--trees {trees} does not divide the {} stored sets",
                            store.len()
                        );
                    }
                    let exemplars = store.len() / trees;
                    let batch = SummarySet::merge_many(exemplars, trees, store.sets())
                        .context("merge failed")?;
                    println!("{}", serde_json::to_string_pretty(&batch)?);
                }
            }
        }

        Command::Inspect { store } => {
            let store = LeafStore::load(&store).context("failed to load leaf store")?;
            let sets = store
                .sets()
                .iter()
                .map(describe_set)
                .collect::<Result<Vec<_>>>()?;
            let output = InspectOutput {
                n_sets: store.len(),
                n_features: store.n_features(),
                sets,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
