use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::retry::RetryConfig;
use crate::pipeline::validation::audit::RateTables;

/// Application-level constants
pub const APP_NAME: &str = "docintake";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Overrides `max_concurrent_model_calls` when set.
pub const MAX_MODEL_CALLS_ENV: &str = "DOCINTAKE_MAX_MODEL_CALLS";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "docintake=debug"
    } else {
        "docintake=info"
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {name}: {value}")]
    Env { name: String, value: String },

    #[error("Unknown default jurisdiction: {0}")]
    UnknownJurisdiction(String),
}

/// Runtime settings for the intake pipeline. Every field has a default,
/// so an empty JSON object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Upper bound on simultaneous classifier/extractor calls.
    pub max_concurrent_model_calls: usize,
    pub retry: RetryConfig,
    /// Jurisdiction used when the seller's VAT number gives no prefix.
    pub default_jurisdiction: String,
    /// JSON file replacing the built-in VAT rate tables.
    pub rate_table_path: Option<PathBuf>,
    /// Per-document deadline after which remaining retries are skipped.
    pub document_timeout_secs: Option<u64>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_concurrent_model_calls: 4,
            retry: RetryConfig::default(),
            default_jurisdiction: "BE".into(),
            rate_table_path: None,
            document_timeout_secs: None,
        }
    }
}

impl PipelineSettings {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read settings from a JSON file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?.with_env_overrides(|name| std::env::var(name).ok())?;
        tracing::info!(
            path = %path.display(),
            max_model_calls = settings.max_concurrent_model_calls,
            max_retries = settings.retry.max_retries,
            "Pipeline settings loaded"
        );
        Ok(settings)
    }

    /// Apply overrides looked up through `lookup` (the process environment
    /// in production).
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(MAX_MODEL_CALLS_ENV) {
            self.max_concurrent_model_calls = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Env {
                    name: MAX_MODEL_CALLS_ENV.into(),
                    value,
                })?;
        }
        Ok(self)
    }

    pub fn document_timeout(&self) -> Option<Duration> {
        self.document_timeout_secs.map(Duration::from_secs)
    }

    /// Built-in tables, or the configured file, with the configured default
    /// jurisdiction applied.
    pub fn rate_tables(&self) -> Result<RateTables, ConfigError> {
        let mut tables = match &self.rate_table_path {
            Some(path) => {
                let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
                serde_json::from_str::<RateTables>(&json)?
            }
            None => RateTables::builtin(),
        };
        if tables.table(&self.default_jurisdiction).is_none() {
            return Err(ConfigError::UnknownJurisdiction(self.default_jurisdiction.clone()));
        }
        tables.default_jurisdiction = self.default_jurisdiction.clone();
        Ok(tables)
    }
}
