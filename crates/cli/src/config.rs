use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use finguide_client::ApiConfig;
use finguide_core::FilterRules;
use finguide_sms::{ImportOptions, DEFAULT_BATCH_SIZE};
use serde::{Deserialize, Serialize};

pub const TOKEN_ENV: &str = "FINGUIDE_API_TOKEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSection {
    pub batch_size: usize,
}

impl Default for ImportSection {
    fn default() -> Self {
        Self { batch_size: DEFAULT_BATCH_SIZE }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InboxSection {
    /// JSON export of the phone's inbox. Defaults to `<data_dir>/inbox.json`.
    pub path: Option<PathBuf>,
    /// Folder watched for new messages. Defaults to `<data_dir>/intake`.
    pub intake_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: Option<PathBuf>,
    pub api: ApiConfig,
    pub import: ImportSection,
    pub inbox: InboxSection,
    pub filter: FilterRules,
}

impl AppConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config")
    }

    /// Read `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Self::from_toml(&content).with_context(|| format!("In {}", path.display()))?
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Self::default()
        };

        if let Ok(token) = std::env::var(TOKEN_ENV) {
            config.api.token = Some(token);
        }
        Ok(config)
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions { batch_size: self.import.batch_size }
    }

    pub fn data_dir(&self, default_dir: &Path) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| default_dir.to_path_buf())
    }

    pub fn inbox_path(&self, data_dir: &Path) -> PathBuf {
        self.inbox.path.clone().unwrap_or_else(|| data_dir.join("inbox.json"))
    }

    pub fn intake_dir(&self, data_dir: &Path) -> PathBuf {
        self.inbox.intake_dir.clone().unwrap_or_else(|| data_dir.join("intake"))
    }
}

pub fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "finguide", "FinGuide")
        .context("Failed to get app directory")
}
