use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::github::DEFAULT_API_URL;
use crate::api::IssueState;
use crate::batch::BatchOptions;

pub const DEFAULT_LABEL_COLOR: &str = "0075ca";
pub const DEFAULT_LABEL_DESCRIPTION: &str = "Label created automatically by tissue";
pub const DEFAULT_PACING_MS: u64 = 100;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitHubConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Defaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    #[serde(default = "default_label_color")]
    pub label_color: String,
    #[serde(default = "default_label_description")]
    pub label_description: String,
    #[serde(default)]
    pub dedup_state: IssueState,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_pacing_ms() -> u64 {
    DEFAULT_PACING_MS
}

fn default_label_color() -> String {
    DEFAULT_LABEL_COLOR.to_string()
}

fn default_label_description() -> String {
    DEFAULT_LABEL_DESCRIPTION.to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: default_api_url(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            pacing_ms: DEFAULT_PACING_MS,
            label_color: default_label_color(),
            label_description: default_label_description(),
            dedup_state: IssueState::default(),
        }
    }
}

impl Settings {
    /// Layered load: config file (optional), then `TISSUE_*` environment
    /// variables, then `GITHUB_TOKEN` when no token is set.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let mut settings = Self::from_file(&config_path, true)?;

        if settings.github.token.is_empty() {
            if let Ok(token) = std::env::var("GITHUB_TOKEN") {
                settings.github.token = token;
            }
        }

        Ok(settings)
    }

    /// The config file alone, without environment layering. This is what
    /// `init` and `config set` edit and write back.
    pub fn load_file() -> Result<Self> {
        Self::from_file(&Self::config_path()?, false)
    }

    /// Apply one `config set` to the file at `path`.
    pub fn update_file(path: &Path, key: &str, value: &str) -> Result<()> {
        let mut settings = Self::from_file(path, false)?;
        settings.set(key, value)?;
        settings.save_to(path)
    }

    pub fn from_file(path: &Path, with_env: bool) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from(path.to_path_buf()).required(false));

        if with_env {
            builder = builder.add_source(
                config::Environment::with_prefix("TISSUE")
                    .prefix_separator("_")
                    .separator("__"),
            );
        }

        let settings = builder
            .build()
            .map_err(crate::errors::TissueError::from)
            .context("Failed to read configuration")?
            .try_deserialize::<Settings>()
            .map_err(crate::errors::TissueError::from)
            .context("Failed to parse configuration")?;

        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let config_str = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(config_path, config_str)
            .context("Failed to write config file")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(config_path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(config_path, perms)?;
        }

        Ok(())
    }

    /// Set a `section.field` key, as used by `tissue config set`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let (section, field) = key
            .split_once('.')
            .context("Invalid key format. Use format: section.field (e.g., github.token)")?;

        match (section, field) {
            ("github", "token") => self.github.token = value.to_string(),
            ("github", "api_url") => self.github.api_url = value.to_string(),
            ("defaults", "repo") => self.defaults.repo = Some(value.to_string()),
            ("defaults", "project") => self.defaults.project = Some(value.to_string()),
            ("batch", "pacing_ms") => {
                self.batch.pacing_ms = value
                    .parse()
                    .context("batch.pacing_ms must be a number of milliseconds")?
            }
            ("batch", "label_color") => {
                let color = value.trim_start_matches('#');
                if color.len() != 6 || !color.chars().all(|c| c.is_ascii_hexdigit()) {
                    anyhow::bail!("batch.label_color must be a 6-digit hex color");
                }
                self.batch.label_color = color.to_lowercase();
            }
            ("batch", "label_description") => self.batch.label_description = value.to_string(),
            ("batch", "dedup_state") => {
                self.batch.dedup_state = value.parse().map_err(|e: String| anyhow::anyhow!(e))?
            }
            _ => anyhow::bail!("Unknown configuration key: {}", key),
        }

        Ok(())
    }

    pub fn batch_options(&self, verbose: bool) -> BatchOptions {
        BatchOptions {
            verbose,
            pacing: Duration::from_millis(self.batch.pacing_ms),
            dedup_state: self.batch.dedup_state,
            label_color: self.batch.label_color.clone(),
            label_description: self.batch.label_description.clone(),
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn config_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .context("HOME environment variable not set")?;
        Ok(PathBuf::from(home).join(".tissue"))
    }
}
