//! MongoDB index recommendation benchmark
//!
//! Measures how much the indexes recommended by `mindexer` speed up a
//! query workload.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use config::{Config, create_artifact_store};
use database::connect;
use index_bench::commands::{self, finish_experiment};
use index_bench::settings::RunSettings;
use mongodb::Client;
use serde_json::json;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{EnvFilter, fmt};
use tracker::{Experiment, Params};
use uuid::Uuid;
use workloads::{Workload, get_workload};

const LOG_FILE: &str = "index_bench.log";

/// MongoDB index recommendation benchmark
#[derive(Parser)]
#[command(name = "index-bench")]
#[command(about = "Benchmarks recommended MongoDB indexes against a query workload")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Profile a workload and ask the recommender for indexes
    Profile(RunArgs),

    /// Run the recommender on the current profile without re-running the workload
    Recommend(RunArgs),

    /// Profile, recommend and time the workload with and without the indexes
    Evaluate(RunArgs),

    /// List the built-in workloads
    Workloads,

    /// Print a stored experiment
    Show {
        /// Experiment id
        id: Uuid,
    },
}

/// Parameters of a tracked run. Flags override `--param`, which overrides `--config`.
#[derive(Args, Debug, Default)]
struct RunArgs {
    /// JSON file with experiment parameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Parameter override, e.g. `mindexer.sample_ratio=0.05` (repeatable)
    #[arg(short, long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Experiment name (defaults to `<workload>-<command>`)
    #[arg(short, long)]
    name: Option<String>,

    /// Workload to run (e.g. "test", "ember", "linkbench")
    #[arg(short, long)]
    workload: Option<String>,

    /// Database overriding the workload default
    #[arg(long)]
    db: Option<String>,

    /// Collection overriding the workload default
    #[arg(long)]
    collection: Option<String>,

    /// Profiler threshold in milliseconds
    #[arg(long)]
    slowms: Option<u32>,

    /// Timed runs per series
    #[arg(long)]
    num_runs: Option<usize>,

    /// Drop the fastest and slowest run before computing statistics
    #[arg(long)]
    discard_best_worst: bool,
}

impl RunArgs {
    /// Merges the config file, overrides and flags into one parameter set.
    fn params(&self) -> Result<Params> {
        let mut params = match &self.config {
            Some(path) => Params::from_json_file(path)
                .with_context(|| format!("Failed to load parameters from {}", path.display()))?,
            None => Params::new(),
        };

        for assignment in &self.params {
            params.apply_override(assignment)?;
        }

        if let Some(workload) = &self.workload {
            params.set("workload", json!(workload));
        }
        if let Some(db) = &self.db {
            params.set("db", json!(db));
        }
        if let Some(collection) = &self.collection {
            params.set("collection", json!(collection));
        }
        if let Some(slowms) = self.slowms {
            params.set("slowms", json!(slowms));
        }
        if let Some(num_runs) = self.num_runs {
            params.set("num_runs", json!(num_runs));
        }
        if self.discard_best_worst {
            params.set("discard_best_worst", json!(true));
        }

        Ok(params)
    }
}

fn init_tracing(verbose: bool, log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let log_file = File::options()
        .create(true)
        .append(true)
        .open(log_dir.join(LOG_FILE))
        .context("Failed to open log file")?;

    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Console layer
    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stdout);

    // File layer
    let file_layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}

/// Commands that are recorded as experiments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
enum TrackedCommand {
    Profile,
    Recommend,
    Evaluate,
}

async fn run_tracked(
    command: TrackedCommand,
    workload: &dyn Workload,
    settings: &RunSettings,
    experiment: &mut Experiment,
) -> Result<()> {
    match command {
        TrackedCommand::Recommend => commands::recommend::run(workload, settings, experiment).await,
        TrackedCommand::Profile => {
            let client = connect_client(&settings.uri).await?;
            commands::profile::run(&client, workload, settings, experiment).await
        }
        TrackedCommand::Evaluate => {
            let client = connect_client(&settings.uri).await?;
            commands::evaluate::run(&client, workload, settings, experiment).await?;
            Ok(())
        }
    }
}

async fn connect_client(uri: &str) -> Result<Client> {
    connect(uri).await.context("Failed to connect to MongoDB")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    init_tracing(cli.verbose, &config.base_path.join("logs"))?;

    let (command, args) = match cli.command {
        Commands::Workloads => {
            commands::workloads::run();
            return Ok(());
        }
        Commands::Show { id } => {
            let store = create_artifact_store(&config.base_path)?;
            return commands::show::run(store.as_ref(), id).await;
        }
        Commands::Profile(args) => (TrackedCommand::Profile, args),
        Commands::Recommend(args) => (TrackedCommand::Recommend, args),
        Commands::Evaluate(args) => (TrackedCommand::Evaluate, args),
    };

    let mut params = args.params()?;
    let settings = RunSettings::from_params(&params, &config)?;
    settings.record_into(&mut params);

    let workload = get_workload(&settings.workload, settings.namespace.clone())?;
    let name = args
        .name
        .clone()
        .unwrap_or_else(|| format!("{}-{command}", workload.name()));

    let store = create_artifact_store(&config.base_path)?;
    let mut experiment = Experiment::start(store, name, command.to_string(), params).await?;

    let result = run_tracked(command, workload.as_ref(), &settings, &mut experiment).await;

    finish_experiment(&mut experiment, result).await?;

    info!(
        experiment_id = %experiment.id(),
        path = %config.base_path.join(experiment.dir()).display(),
        "Results stored"
    );

    Ok(())
}
