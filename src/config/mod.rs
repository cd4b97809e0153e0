use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs, io};

use serde::de::{Error as _, Unexpected};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

pub const DEFAULT_DATASET_PATH: &str = "resource/db/recipes.json";
pub const DEFAULT_DEST_DIR: &str = "resource/db";
pub const DEFAULT_DATASET_URL: &str =
    "https://raw.githubusercontent.com/bozoh/openrewrite-db-mcp/main/resource/db/recipes.json";
pub const DEFAULT_CHECKSUM_URL: &str =
    "https://raw.githubusercontent.com/bozoh/openrewrite-db-mcp/main/resource/db/recipes.json.sha256";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_DATASET_PATH: &str = "RECIPE_DB_PATH";
pub const ENV_DATASET_URL: &str = "RECIPE_DB_URL";
pub const ENV_CHECKSUM_URL: &str = "RECIPE_DB_SHA256_URL";

/// Runtime settings. Every field has a default, so a settings file only needs
/// to name what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    /// Dataset read by the queries.
    pub dataset_path: PathBuf,
    /// Published dataset.
    pub dataset_url: String,
    /// Published digest of `dataset_url`.
    pub checksum_url: String,
    /// Directory the updater installs into.
    pub dest_dir: PathBuf,
    pub timeout_secs: u64,
    /// Parse the dataset incrementally instead of loading it whole.
    pub streaming: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            dataset_url: DEFAULT_DATASET_URL.to_string(),
            checksum_url: DEFAULT_CHECKSUM_URL.to_string(),
            dest_dir: PathBuf::from(DEFAULT_DEST_DIR),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            streaming: false,
        }
    }
}

// ---- Public API (serde hidden from callers) ----

impl Settings {
    /// Read settings from a JSON file. A file that does not exist means
    /// "all defaults".
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match fs::read_to_string(path.as_ref()) {
            Ok(data) => Self::from_json_str(&data),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    /// Parse a settings object. Anything but a JSON object is rejected, even
    /// though serde would read an array positionally into the struct.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(json)?;
        if !value.is_object() {
            let unexpected = match &value {
                Value::Array(_) => Unexpected::Seq,
                Value::String(s) => Unexpected::Str(s),
                Value::Bool(b) => Unexpected::Bool(*b),
                Value::Null => Unexpected::Unit,
                _ => Unexpected::Other("a number"),
            };
            return Err(serde_json::Error::invalid_type(unexpected, &"a settings object").into());
        }
        let settings: Settings = serde_json::from_value(value)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply `RECIPE_DB_*` environment overrides.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|name| env::var(name).ok())
    }

    fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = lookup(ENV_DATASET_PATH) {
            self.dataset_path = PathBuf::from(path);
        }
        if let Some(url) = lookup(ENV_DATASET_URL) {
            self.dataset_url = url;
        }
        if let Some(url) = lookup(ENV_CHECKSUM_URL) {
            self.checksum_url = url;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Where the updater's `recipes.json.sha256` ends up for this configuration.
    #[allow(unused)]
    pub fn checksum_path(&self) -> PathBuf {
        crate::dataset::sidecar_path(&self.dest_dir.join(crate::updater::DATASET_FILE_NAME))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for url in [&self.dataset_url, &self.checksum_url] {
            Url::parse(url).map_err(|source| ConfigError::InvalidUrl {
                url: url.clone(),
                source,
            })?;
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

/// ---- Errors ----
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl { url: String, source: url::ParseError },
    #[error("timeout-secs must be greater than zero")]
    ZeroTimeout,
}
