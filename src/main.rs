use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use steelmatch::pipeline::{load_inventory, load_rfqs, prepare, scenario_output};
use steelmatch::{
    ablation_scenarios, comparison_scenarios, run_scenarios, FeatureFamily, InventoryMatcher, MetricStrategy,
    Scenario, Settings, SimilarityEngine,
};
use steelmatch_similarity::{cluster, log_insights, summarize};
use steelmatch_storage::{write_clusters, write_matches, write_scored_items};

/// Similarity ranking for steel RFQs
#[derive(Parser, Debug)]
#[command(name = "steelmatch")]
#[command(about = "Feature engineering and similarity ranking for steel RFQs", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// JSON settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for result tables
    #[arg(short, long, global = true, default_value = "outputs")]
    output_dir: PathBuf,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(clap::Args, Debug)]
struct RfqInputs {
    /// RFQ table (CSV, or TSV by extension)
    #[arg(long)]
    rfqs: PathBuf,

    /// Grade reference table
    #[arg(long)]
    reference: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank inventory items for each RFQ
    Match {
        #[arg(long)]
        rfqs: PathBuf,

        #[arg(long)]
        inventory: PathBuf,

        /// Matches kept per RFQ
        #[arg(long)]
        top_n: Option<usize>,

        /// Also write numeric and categorical sub-scores
        #[arg(long)]
        explain: bool,
    },

    /// Rank the most similar RFQs for each RFQ
    Rank {
        #[command(flatten)]
        inputs: RfqInputs,

        /// Matches kept per RFQ
        #[arg(long)]
        top_n: Option<usize>,

        /// cosine_blend or hybrid
        #[arg(long)]
        strategy: Option<MetricStrategy>,

        /// Active feature families, comma separated
        #[arg(long, value_delimiter = ',')]
        families: Vec<FeatureFamily>,

        /// Dimensional, grade and categorical weights, comma separated
        #[arg(long, value_delimiter = ',')]
        weights: Option<Vec<f64>>,
    },

    /// Run every ablation scenario and report average scores
    Ablation {
        #[command(flatten)]
        inputs: RfqInputs,
    },

    /// Compare the cosine blend with the hybrid metric
    Compare {
        #[command(flatten)]
        inputs: RfqInputs,
    },

    /// Group RFQs into product families
    Cluster {
        #[command(flatten)]
        inputs: RfqInputs,

        /// Number of clusters
        #[arg(short)]
        k: Option<usize>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting steelmatch v{}", env!("CARGO_PKG_VERSION"));
    let mut settings = Settings::load(args.config.as_deref())?;

    match args.command {
        Command::Match {
            rfqs,
            inventory,
            top_n,
            explain,
        } => {
            if let Some(top_n) = top_n {
                settings.matcher.top_n = top_n;
            }
            run_match(&settings, &rfqs, &inventory, explain, &args.output_dir)
        }
        Command::Rank {
            inputs,
            top_n,
            strategy,
            families,
            weights,
        } => {
            if let Some(top_n) = top_n {
                settings.engine.top_n = top_n;
            }
            if let Some(strategy) = strategy {
                settings.engine.strategy = strategy;
            }
            if !families.is_empty() {
                settings.engine.active_families = families.into_iter().collect();
            }
            if let Some(weights) = weights {
                let [dimensional, grade, categorical] = weights[..] else {
                    bail!("--weights takes exactly three values");
                };
                settings.engine = settings.engine.with_weights(dimensional, grade, categorical);
            }
            run_rank(&settings, &inputs, &args.output_dir)
        }
        Command::Ablation { inputs } => run_named(&settings, &inputs, &ablation_scenarios(), &args.output_dir),
        Command::Compare { inputs } => run_named(&settings, &inputs, &comparison_scenarios(), &args.output_dir),
        Command::Cluster { inputs, k } => {
            if let Some(k) = k {
                settings.cluster.k = k;
            }
            run_cluster(&settings, &inputs, &args.output_dir)
        }
    }
}

fn run_match(settings: &Settings, rfq_path: &Path, inventory_path: &Path, explain: bool, output_dir: &Path) -> Result<()> {
    info!("Loading data...");
    let rfqs = load_rfqs(rfq_path, settings)?;
    let inventory = load_inventory(inventory_path, settings)?;
    let matcher = InventoryMatcher::new(settings.matcher.clone(), settings.aliases.clone())?;

    info!(rfqs = rfqs.len(), items = inventory.len(), "Scoring inventory...");
    let matches = matcher.rank(&rfqs, &inventory);
    let top_n = settings.matcher.top_n;
    write_matches(&output_dir.join(format!("top{top_n}.csv")), &matches)?;

    if explain {
        let scored: Vec<_> = rfqs
            .iter()
            .enumerate()
            .map(|(i, rfq)| {
                let items = matcher.explain(&rfqs, i, &inventory).into_iter().take(top_n).collect();
                (rfq.id.clone(), items)
            })
            .collect();
        write_scored_items(&output_dir.join(format!("top{top_n}_explained.csv")), &scored)?;
    }
    Ok(())
}

fn run_rank(settings: &Settings, inputs: &RfqInputs, output_dir: &Path) -> Result<()> {
    let features = prepare(&inputs.rfqs, inputs.reference.as_deref(), settings)?;
    let engine = SimilarityEngine::new(settings.engine.clone())?;

    info!(top_n = settings.engine.top_n, "Calculating similar RFQs...");
    let matches = engine.rank(&features);
    write_matches(&scenario_output(output_dir, settings.engine.top_n, "similar"), &matches)?;
    Ok(())
}

/// Run scenarios on top of the configured engine settings
fn run_named(settings: &Settings, inputs: &RfqInputs, scenarios: &[Scenario], output_dir: &Path) -> Result<()> {
    let features = prepare(&inputs.rfqs, inputs.reference.as_deref(), settings)?;
    let scenarios: Vec<Scenario> = scenarios
        .iter()
        .map(|s| {
            let mut scenario = s.clone();
            scenario.config.top_n = settings.engine.top_n;
            scenario.config.interval_metric = settings.engine.interval_metric;
            scenario.config.score_precision = settings.engine.score_precision;
            scenario
        })
        .collect();

    let outcomes = run_scenarios(&features, &scenarios)?;
    for outcome in &outcomes {
        write_matches(&scenario_output(output_dir, settings.engine.top_n, &outcome.name), &outcome.matches)?;
    }

    info!("Average similarity scores:");
    for outcome in &outcomes {
        match outcome.mean_score {
            Some(mean) => info!("{}: {:.3}", outcome.name, mean),
            None => info!("{}: no matches", outcome.name),
        }
    }
    Ok(())
}

fn run_cluster(settings: &Settings, inputs: &RfqInputs, output_dir: &Path) -> Result<()> {
    let features = prepare(&inputs.rfqs, inputs.reference.as_deref(), settings)?;

    info!(k = settings.cluster.k, "Clustering into families...");
    let clustering = cluster(&features, &settings.cluster)?;
    write_clusters(&output_dir.join("rfq_clusters.csv"), &clustering.assignments)?;

    info!("Generating cluster insights...");
    log_insights(&summarize(&features, &clustering));
    Ok(())
}
