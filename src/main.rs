mod cli;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use liftlog::config::LiftlogConfig;

#[derive(Parser)]
#[command(name = "liftlog", version, about = "Semantic workout log with filtered vector search")]
struct Cli {
    /// Act as this owner instead of `storage.default_owner`
    #[arg(long, global = true)]
    owner: Option<String>,

    /// Config file (default: ~/.liftlog/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log an activity
    Log(LogArgs),
    /// Search activities by meaning and filters
    Search(SearchArgs),
    /// Show one activity with its audit history
    Get {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Delete an activity and its vector
    Delete { id: String },
    /// List recent activities
    List {
        #[arg(long, default_value_t = 50)]
        limit: usize,
        /// Only this exercise (case-insensitive)
        #[arg(long)]
        exercise: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Workout statistics
    Stats {
        /// Aggregate over every owner
        #[arg(long)]
        all_owners: bool,
        #[arg(long)]
        json: bool,
    },
    /// Find and repair records and vectors that are out of step
    Reconcile {
        /// Report without repairing
        #[arg(long)]
        dry_run: bool,
    },
    /// Regenerate every vector with the configured embedder
    ReEmbed,
    /// Run database diagnostics
    Doctor,
    /// Export all activities as JSON to stdout
    Export,
    /// Import activities from a JSON export
    Import { file: PathBuf },
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.liftlog/models/
    Download,
}

#[derive(Args)]
pub struct LogArgs {
    /// Exercise name, e.g. "bench press"
    #[arg(long, required_unless_present = "json")]
    pub exercise: Option<String>,
    #[arg(long)]
    pub sets: Option<u32>,
    #[arg(long)]
    pub reps: Option<u32>,
    #[arg(long)]
    pub weight: Option<f64>,
    /// lbs or kg (default lbs when a weight is given)
    #[arg(long)]
    pub unit: Option<String>,
    /// Duration in minutes
    #[arg(long)]
    pub duration: Option<u32>,
    /// Workout day, YYYY-MM-DD (default: today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Read a parsed activity as JSON from a file, or `-` for stdin
    #[arg(long, conflicts_with = "exercise")]
    pub json: Option<PathBuf>,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Free-text query
    pub text: Vec<String>,
    /// First day to include, YYYY-MM-DD
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Last day to include, YYYY-MM-DD
    #[arg(long)]
    pub to: Option<NaiveDate>,
    /// Exactly this day (shorthand for --from D --to D)
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub on: Option<NaiveDate>,
    #[arg(long)]
    pub category: Option<String>,
    /// Boost activities with exactly this exercise name
    #[arg(long)]
    pub exercise: Option<String>,
    /// Search across every owner
    #[arg(long)]
    pub all_owners: bool,
    #[arg(long)]
    pub json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => LiftlogConfig::load_from(path)?,
        None => LiftlogConfig::load()?,
    };
    if let Some(owner) = cli.owner {
        config.storage.default_owner = owner;
    }

    // stdout carries command output; logs go to stderr
    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Log(args) => cli::log::log(&config, args).await?,
        Command::Search(args) => cli::search::search(&config, args).await?,
        Command::Get { id, json } => cli::inspect::inspect(&config, &id, json)?,
        Command::Delete { id } => cli::inspect::delete(&config, &id).await?,
        Command::List {
            limit,
            exercise,
            json,
        } => cli::list::list(&config, limit, exercise.as_deref(), json)?,
        Command::Stats { all_owners, json } => cli::stats::stats(&config, all_owners, json)?,
        Command::Reconcile { dry_run } => cli::maintenance::reconcile(&config, dry_run).await?,
        Command::ReEmbed => cli::re_embed::re_embed(&config).await?,
        Command::Doctor => cli::doctor::doctor(&config)?,
        Command::Export => cli::export::export(&config)?,
        Command::Import { file } => cli::import::import(&config, &file).await?,
        Command::Model { action } => match action {
            ModelAction::Download => cli::model_download(&config.embedding).await?,
        },
    }

    Ok(())
}
