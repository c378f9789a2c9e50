//! Layered configuration for othd.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults ([`Config::default`]),
//! 2. a config file (TOML, YAML or JSON, chosen by extension), either given
//!    explicitly or found at [`Config::default_path`],
//! 3. environment variables prefixed with `OTHD_` (e.g.
//!    `OTHD_REQUIRE_DATABASE=true`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "OTHD_";
/// Conventional name of the directory hash databases are kept in on each
/// storage volume.
pub const DEFAULT_DIRECTORY_NAME: &str = "HashDatabases";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Volumes or directories searched (recursively) for `directory_name`.
    pub search_roots: Vec<PathBuf>,
    /// Name of the well-known directory holding candidate databases.
    pub directory_name: String,
    /// Extensions (without the dot, case-insensitive) of candidate files
    /// inside a well-known directory.
    pub extensions: Vec<String>,
    /// Candidate databases given explicitly, in addition to discovered ones.
    pub databases: Vec<PathBuf>,
    /// Treat a load phase that ends with no usable database as fatal.
    pub require_database: bool,
    /// Report every matching database instead of stopping at the first.
    pub report_all_matches: bool,
    /// Read-only connections per database.
    pub max_connections: u32,
    /// Files evaluated at the same time.
    pub concurrency: usize,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            search_roots: Vec::new(),
            directory_name: DEFAULT_DIRECTORY_NAME.to_string(),
            extensions: ["othd", "sqlite", "db"].map(String::from).to_vec(),
            databases: Vec::new(),
            require_database: false,
            report_all_matches: false,
            max_connections: 4,
            concurrency: 16,
        }
    }
}

impl Config {
    /// Location of the config file used when none is given explicitly.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "othd").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// The merged (but not yet extracted) configuration sources.
    ///
    /// An explicit `file` is merged whether or not it exists; use
    /// [`load`](Self::load) to have a missing explicit file reported.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        let file = file.map(Path::to_path_buf).or_else(Self::default_path);
        if let Some(file) = file {
            figment = match file.extension().and_then(|e| e.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
                Some("json") => figment.merge(Json::file(file)),
                _ => figment.merge(Toml::file(file)),
            };
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load and validate the configuration.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        if let Some(file) = file
            && !file.is_file()
        {
            exn::bail!(ErrorKind::NotFound(file.to_path_buf()));
        }
        let config = Self::from_figment(&Self::figment(file))?;
        tracing::debug!(?config, "loaded configuration");
        Ok(config)
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            exn::bail!(ErrorKind::Invalid("max_connections"));
        }
        if self.concurrency == 0 {
            exn::bail!(ErrorKind::Invalid("concurrency"));
        }
        let mut components = Path::new(&self.directory_name).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(std::path::Component::Normal(_)), None)
        );
        if !single_normal {
            exn::bail!(ErrorKind::Invalid("directory_name"));
        }
        Ok(())
    }

    /// Does `path` have one of the configured candidate extensions?
    pub fn is_candidate_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
    }
}
