//! Configuration for ctrlrepo.
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. A TOML file: the one passed explicitly, or `config.toml` in the
//!    platform's configuration directory.
//! 3. Environment variables prefixed `CTRLREPO_`, e.g. `CTRLREPO_LOCALE=fr`.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "CTRLREPO_";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the repository to work on.
    pub repository: Option<PathBuf>,
    /// Parent directory for package scratch areas. The system's temporary
    /// directory if unset.
    pub scratch_dir: Option<PathBuf>,
    /// Locale used to pick category labels.
    pub locale: String,
}

impl Default for Config {
    fn default() -> Self {
        Self { repository: None, scratch_dir: None, locale: "en".into() }
    }
}

impl Config {
    /// The configuration file used when none is given explicitly.
    pub fn default_file() -> Option<PathBuf> {
        ProjectDirs::from("", "", "ctrlrepo").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Build the layered figment without extracting it, so callers can merge
    /// further providers (command-line flags) on top.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match file {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::MissingFile(path.to_path_buf()));
                }
                figment = figment.merge(Toml::file_exact(path));
            },
            None => match Self::default_file() {
                Some(path) if path.is_file() => {
                    tracing::debug!(path = %path.display(), "using configuration file");
                    figment = figment.merge(Toml::file_exact(path));
                },
                _ => tracing::debug!("no configuration file"),
            },
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate the configuration.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::from_figment(&Self::figment(file)?)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(dir) = &self.scratch_dir
            && !dir.is_dir()
        {
            exn::bail!(ErrorKind::InvalidScratchDir(dir.clone()));
        }
        Ok(())
    }
}
