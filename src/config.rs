//! Run configuration.
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! TOML/YAML/JSON config file, then environment variables (a `.env` file is
//! loaded into the environment at startup). CLI flags are applied last by
//! the caller.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm::LlmConfig;
use crate::scrapers::{BrowserEngineConfig, SiteConfig};

/// Resume text used when the resume file is missing.
pub const DEFAULT_RESUME: &str = "Experienced Java Developer with Spring Boot skills.";

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "jobhub.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Search keywords, scraped in order.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    /// Maximum number of unique jobs collected per run.
    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,
    /// Obsidian vault directory (`~` allowed).
    #[serde(default = "default_vault_path")]
    pub vault_path: String,
    /// Plain-text resume used for matching.
    #[serde(default = "default_resume_path")]
    pub resume_path: String,
    /// Offline listings used when the live scrape finds nothing.
    #[serde(default = "default_sample_data_path")]
    pub sample_data_path: String,
    /// Scraper source tag.
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub browser: BrowserEngineConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    /// File this config was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

fn default_keywords() -> Vec<String> {
    vec!["Java".to_string()]
}

fn default_max_jobs() -> usize {
    5
}

fn default_vault_path() -> String {
    "./obsidian_output".to_string()
}

fn default_resume_path() -> String {
    "resume.txt".to_string()
}

fn default_sample_data_path() -> String {
    "data/sample_jobs.json".to_string()
}

fn default_source() -> String {
    "104".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            max_jobs: default_max_jobs(),
            vault_path: default_vault_path(),
            resume_path: default_resume_path(),
            sample_data_path: default_sample_data_path(),
            source: default_source(),
            site: SiteConfig::default(),
            browser: BrowserEngineConfig::default(),
            llm: LlmConfig::default(),
            source_path: None,
        }
    }
}

impl Config {
    /// Load from `path`, or from `jobhub.toml` in the working directory if
    /// present, then apply environment overrides.
    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::load_from_path(path).await?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load_from_path(default_path).await?
                } else {
                    debug!("No config file, using defaults");
                    Self::default()
                }
            }
        };
        Ok(config.with_env_overrides())
    }

    /// Load configuration from a specific file path.
    /// The format follows the extension: `.toml`, `.yaml`/`.yml`, otherwise JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)?,
            _ => serde_json::from_str(&contents)?,
        };

        debug!("Loaded config from {}", path.display());
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Apply process environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        self.browser = self.browser.with_env_overrides();
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// - `SEARCH_KEYWORDS`: comma-separated keywords
    /// - `MAX_JOBS`: job budget
    /// - `OBSIDIAN_VAULT_PATH`, `RESUME_PATH`, `SAMPLE_JOBS_PATH`
    /// - LLM variables, see [`LlmConfig::with_env_overrides`]
    pub fn with_overrides_from(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(val) = var("SEARCH_KEYWORDS") {
            let keywords = parse_keywords(&val);
            if !keywords.is_empty() {
                self.keywords = keywords;
            }
        }
        if let Some(n) = var("MAX_JOBS").and_then(|v| v.trim().parse().ok()) {
            self.max_jobs = n;
        }
        if let Some(val) = var("OBSIDIAN_VAULT_PATH") {
            self.vault_path = val;
        }
        if let Some(val) = var("RESUME_PATH") {
            self.resume_path = val;
        }
        if let Some(val) = var("SAMPLE_JOBS_PATH") {
            self.sample_data_path = val;
        }
        self.llm = self.llm.with_overrides_from(&var);
        self
    }

    /// Effective configuration as TOML. Secrets are never included.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn sample_data_file(&self) -> PathBuf {
        expand_path(&self.sample_data_path)
    }

    /// Read the resume, falling back to a placeholder when it is missing.
    pub async fn load_resume(&self) -> String {
        let path = expand_path(&self.resume_path);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    "Resume not found at {} ({}), using default placeholder",
                    path.display(),
                    e
                );
                DEFAULT_RESUME.to_string()
            }
        }
    }
}

/// Split a comma-separated keyword list, dropping blanks.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

/// Expand a leading `~` in a path.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
