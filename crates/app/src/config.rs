//! User configuration, read from `config.toml`.
//!
//! Lookup: an explicit `--config` path, else `config.toml` in the platform
//! config directory. A missing default file means all defaults; a missing
//! explicit file is an error.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tally_import::bill_split::DEFAULT_SUMMARY_SENTINEL;
use tally_import::match_engine::DEFAULT_CANDIDATE_WINDOW_DAYS;
use tally_import::{BillSplitImporter, ReconciliationEngine};
use thiserror::Error;

pub const CONFIG_FILE: &str = "config.toml";
pub const DATABASE_FILE: &str = "ledger.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Could not determine the user's home directory")]
    NoProjectDirs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ledger database; defaults to `ledger.db` in the platform data directory.
    pub database_path: Option<PathBuf>,
    pub party_a_name: String,
    pub party_b_name: String,
    /// Currency for manual expenses and bill-split rows that leave it blank.
    pub default_currency: String,
    pub candidate_window_days: u32,
    /// Description of the trailing balance row in bill-split exports.
    pub summary_sentinel: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            party_a_name: "Party A".to_string(),
            party_b_name: "Party B".to_string(),
            default_currency: "BRL".to_string(),
            candidate_window_days: DEFAULT_CANDIDATE_WINDOW_DAYS,
            summary_sentinel: DEFAULT_SUMMARY_SENTINEL.to_string(),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("com", "tally", "Tally").ok_or(ConfigError::NoProjectDirs)
}

impl Config {
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        match explicit {
            Some(path) => Self::read(path),
            None => {
                let path = project_dirs()?.config_dir().join(CONFIG_FILE);
                if path.exists() {
                    Self::read(&path)
                } else {
                    tracing::debug!(path = %path.display(), "no config file, using defaults");
                    Ok(Config::default())
                }
            }
        }
    }

    fn read(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Config, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join(DATABASE_FILE)),
        }
    }

    pub fn importer(&self) -> BillSplitImporter {
        BillSplitImporter::new(&self.summary_sentinel, &self.default_currency)
    }

    pub fn engine(&self) -> ReconciliationEngine {
        ReconciliationEngine::new(self.candidate_window_days)
    }
}
