//! Command-line interface for the polish rewriting engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "polish")]
#[command(about = "Catalog-driven source rewriting", long_about = None)]
pub struct Cli {
    /// Log filter, e.g. `info` or `polish_engine=trace` (overrides POLISH_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the rules of the built-in catalog and its bundles
    Rules {
        /// Include draft rules
        #[arg(long)]
        all: bool,
    },

    /// Print the active rules in execution order
    Schedule {
        /// Engine configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Rewrite one source unit
    Rewrite {
        /// Source unit in interchange JSON
        unit: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the rewritten unit here instead of over the input
        #[arg(long, short)]
        out: Option<PathBuf>,

        /// Print the rewritten source instead of writing JSON
        #[arg(long)]
        print: bool,
    },

    /// Rewrite many source units in parallel
    Batch {
        #[arg(required = true)]
        units: Vec<PathBuf>,

        /// Worker threads (defaults to the configured or available parallelism)
        #[arg(long, short)]
        jobs: Option<usize>,

        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory for the rewritten units; inputs are overwritten without it
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}
