use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "othd", version, about = "Match files against read-only OTHD hash databases")]
pub struct Cli {
    /// Log debug output (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Describe a single hash database.
    Describe {
        #[arg(value_name = "DB")]
        database: PathBuf,
        /// Print the description as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Load every configured and discovered database and list the result.
    Databases {
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Additional search roots.
        #[arg(value_name = "PATH")]
        roots: Vec<PathBuf>,
    },
    /// Check whether files are known to any loaded database.
    Check {
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Report every matching database rather than the first.
        #[arg(short, long)]
        all: bool,
        /// Additional candidate database (repeatable).
        #[arg(short, long = "database", value_name = "PATH", action = clap::ArgAction::Append)]
        databases: Vec<PathBuf>,
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },
}
