//! # Context Retrieval CLI (`ctxr`)
//!
//! Loads JSONL chunk corpora, embeds them once per process, and selects
//! the best-matching chunks for a query under a character budget.
//!
//! ## Usage
//!
//! ```bash
//! ctxr --config ./config/ctxr.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ctxr sources` | List corpus locations and matching chunk files |
//! | `ctxr stats` | Load the corpus (no embedding) and print counts |
//! | `ctxr retrieve "<query>"` | Build the index and print one context bundle |
//! | `ctxr session` | Build the index once and answer one query per stdin line |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use context_retrieval::retrieve_cmd::RetrieveOptions;
use context_retrieval::{config, logging, retrieve_cmd, session, sources, stats};

/// Context Retrieval CLI — budget-constrained semantic retrieval of
/// text chunks for LLM prompt context.
#[derive(Parser)]
#[command(
    name = "ctxr",
    about = "Context Retrieval — select the best-matching text chunks for a query under a character budget",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ctxr.toml")]
    config: PathBuf,

    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// List configured corpus locations and their chunk files.
    Sources,

    /// Load the corpus without embedding and print a summary.
    Stats,

    /// Retrieve context for a single query.
    ///
    /// Loads the corpus, embeds it, ranks chunks by inner product with the
    /// query, and prints the best chunks that fit in the character budget.
    Retrieve {
        /// The query text.
        query: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Build the index once and answer one query per stdin line.
    Session {
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(clap::Args)]
struct OutputArgs {
    /// Number of top-ranked candidates considered (overrides `retrieval.top_n`).
    #[arg(long)]
    top_n: Option<usize>,

    /// Character budget (overrides `retrieval.max_total_chars`).
    #[arg(long)]
    max_chars: Option<usize>,

    /// Show rank, score, and provenance for each selected chunk.
    #[arg(long)]
    explain: bool,

    /// Print the bundle as JSON.
    #[arg(long, conflicts_with = "explain")]
    json: bool,
}

impl From<OutputArgs> for RetrieveOptions {
    fn from(args: OutputArgs) -> Self {
        Self {
            top_n: args.top_n,
            max_chars: args.max_chars,
            explain: args.explain,
            json: args.json,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg)?;
        }
        Commands::Retrieve { query, output } => {
            retrieve_cmd::run_retrieve(&cfg, &query, &output.into())?;
        }
        Commands::Session { output } => {
            session::run_session(&cfg, &output.into())?;
        }
    }

    Ok(())
}
