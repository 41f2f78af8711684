// qualis/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "qualis")]
#[command(about = "Data-quality rules and query performance grading", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Project directory (holds qualis.yaml)
    #[arg(long, global = true, default_value = ".", env = "QUALIS_PROJECT_DIR")]
    pub project_dir: PathBuf,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 📋 Lists the configured rules
    Rules {
        /// Only rules targeting this table id
        #[arg(long, short)]
        table: Option<String>,
    },

    /// 🚀 Executes one rule, a table's rules, or every active rule
    Run {
        /// Rule id to execute
        #[arg(long, short, conflicts_with = "table")]
        rule: Option<String>,

        /// Table id whose active rules are executed
        #[arg(long, short)]
        table: Option<String>,
    },

    /// 📊 Prints per-table quality score cards
    Scores,

    /// ⚡ Runs a read-only query and grades its performance
    Analyze {
        query: String,

        /// Source id the query runs against
        #[arg(long, short)]
        source: String,

        /// Fetch the execution plan first
        #[arg(long)]
        explain: bool,

        /// Run the query this many times (feeds history and stats)
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..=100))]
        repeat: u32,
    },
}
