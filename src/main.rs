//! `othd`: inspect hash databases and check files against them.

mod cli;
mod error;
mod report;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use futures::StreamExt;
use othd_config::Config;
use othd_hashdb::{Handle, Mode};
use othd_library::{CheckEvent, check, load_registry};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Rows shown by `describe` in human-readable form.
const SAMPLE_ROWS: u32 = 20;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{}", *err);
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

fn setup_logging(verbose: bool) {
    let default = if verbose { "othd=debug,warn" } else { "othd=info,warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Describe { database, json } => describe(&database, json).await,
        Command::Databases { config, roots } => {
            let mut config = load_config(config.as_deref())?;
            config.search_roots.extend(roots);
            databases(&config).await
        },
        Command::Check { config, all, databases, files } => {
            let mut config = load_config(config.as_deref())?;
            config.report_all_matches |= all;
            config.databases.extend(databases);
            check_files(&config, files).await
        },
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path).or_raise(|| ErrorKind::Config)
}

async fn describe(path: &Path, json: bool) -> Result<()> {
    let failed = || ErrorKind::Describe(path.to_path_buf());
    let handle = Handle::open(path, Some(1)).await.or_raise(failed)?;
    let description = handle.describe().await.or_raise(failed)?;
    if json {
        let out = serde_json::to_string_pretty(&description).or_raise(|| ErrorKind::Output)?;
        println!("{out}");
    } else {
        let samples = handle.sample_rows(SAMPLE_ROWS).await.or_raise(failed)?;
        print!("{}", report::DescriptionReport { description: &description, samples: &samples });
    }
    handle.close().await;
    Ok(())
}

async fn databases(config: &Config) -> Result<()> {
    let loaded = load_registry(config).await.or_raise(|| ErrorKind::Load)?;
    print!("{}", report::RegistryReport(&loaded));
    loaded.registry.close().await;
    Ok(())
}

async fn check_files(config: &Config, files: Vec<PathBuf>) -> Result<()> {
    let loaded = load_registry(config).await.or_raise(|| ErrorKind::Load)?;
    let registry = &loaded.registry;
    let mut failed = 0;
    let mut events = std::pin::pin!(check(registry, files, Mode::from(config.report_all_matches), config.concurrency));
    while let Some(event) = events.next().await {
        match event {
            Ok(CheckEvent::Started(count)) => tracing::info!(files = count, databases = registry.len(), "checking files"),
            Ok(CheckEvent::Checked { path, verdict }) => println!("{}", report::verdict(registry, &path, &verdict)),
            Ok(CheckEvent::Complete) => tracing::debug!("check complete"),
            Err(err) => {
                failed += 1;
                eprintln!("Error: {err:?}");
            },
        }
    }
    registry.close().await;
    if failed > 0 {
        exn::bail!(ErrorKind::Check(failed));
    }
    Ok(())
}
