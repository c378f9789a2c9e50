//! The load phase: turn a configuration into a ready-to-share [`Registry`].

use crate::discover::discover;
use crate::error::{ErrorKind, Result};
use futures::StreamExt;
use othd_config::Config;
use othd_hashdb::Registry;
use othd_hashdb::error::Error as HashDbError;
use std::path::PathBuf;
use tracing::instrument;

/// A loaded registry plus the reasons any candidate was left out.
#[derive(Debug)]
pub struct Loaded {
    pub registry: Registry,
    /// One entry per excluded candidate: open/header/schema failures and
    /// every uuid conflict.
    pub diagnostics: Vec<HashDbError>,
}

/// Discover candidates according to `config` and load them.
pub async fn load_registry(config: &Config) -> Result<Loaded> {
    let candidates: Vec<PathBuf> = discover(config).collect().await;
    load_candidates(config, candidates).await
}

/// Admit every candidate into a fresh registry.
///
/// Individual failures never stop the load; they are returned as
/// diagnostics. The load only fails (with [`ErrorKind::NoDatabases`]) when
/// `require_database` is set and nothing usable is left.
#[instrument(level = "debug", skip_all, fields(candidates = candidates.len()))]
pub async fn load_candidates(config: &Config, candidates: Vec<PathBuf>) -> Result<Loaded> {
    let mut registry = Registry::new().with_max_connections(config.max_connections);
    let diagnostics = registry.admit_all(candidates, config.concurrency).await;
    tracing::info!(
        loaded = registry.len(),
        excluded = diagnostics.len(),
        conflicts = registry.conflicts().len(),
        required = %registry.required_hashes(),
        "hash databases loaded"
    );
    if registry.is_empty() && config.require_database {
        registry.close().await;
        exn::bail!(ErrorKind::NoDatabases);
    }
    Ok(Loaded { registry, diagnostics })
}
