//! NextStat CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod select;

#[derive(Parser)]
#[command(name = "nextstat")]
#[command(about = "NextStat - event selection and cutflow accounting")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the diphoton selection to a JSONL event file and write the
    /// cutflow and categorization tables.
    Select {
        /// Input events, one JSON object per line.
        #[arg(long)]
        events: PathBuf,

        /// Selector config (YAML, or JSON by `.json` extension). Defaults to
        /// every built-in cut and scheme.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Categorization scheme to fill (repeatable). Defaults to all.
        #[arg(long = "scheme")]
        schemes: Vec<String>,

        /// Cut that gates categorization. Every cut is still evaluated for
        /// the cutflow.
        #[arg(long, default_value = ns_select::ALL_CUTS)]
        cut: String,

        /// Sample name used in output file names.
        #[arg(long, default_value = "data")]
        sample: String,

        /// Weight events by `pileup_weight * norm`.
        #[arg(long)]
        weighted: bool,

        /// Normalisation factor (luminosity × cross-section) for weighted runs.
        #[arg(long, default_value = "1.0")]
        norm: f64,

        /// Output directory for the report files.
        #[arg(long)]
        out_dir: PathBuf,

        /// Also write `selection_<sample>.json`.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Select {
            events,
            config,
            schemes,
            cut,
            sample,
            weighted,
            norm,
            out_dir,
            json,
        } => select::cmd_select(&select::SelectArgs {
            events,
            config,
            schemes,
            cut,
            sample,
            weighted,
            norm,
            out_dir,
            json,
        }),
    }
}
