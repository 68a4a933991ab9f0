//! Configuration loading and work directory resolution
//!
//! Priority order for every setting:
//! 1. Command-line argument (highest priority, applied by the binary)
//! 2. Environment variable (`DAT_*`, applied by the binary)
//! 3. TOML config file
//! 4. Compiled default (fallback)

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::scoring::{EmbeddingScorer, FixedScorer, Scorer, ScoringLimits};
use crate::{Error, Result};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "DAT_CONFIG";

const APP_DIR: &str = "dat-score";

/// Contents of `config.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TomlConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Session storage root; `None` means the OS default
    pub work_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
    pub session_ttl_secs: u64,
    pub reaper_interval_secs: u64,
    pub cookie_secure: bool,
    pub scoring: ScoringConfig,
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 5780,
            work_dir: None,
            max_upload_bytes: 10 * 1024 * 1024,
            session_ttl_secs: 3600,
            reaper_interval_secs: 60,
            cookie_secure: false,
            scoring: ScoringConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// `[scoring]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    pub engine: EngineKind,
    pub vectors_path: PathBuf,
    pub dictionary_path: PathBuf,
    /// Score returned by the `fixed` engine
    pub fixed_value: f64,
    /// Rows scored concurrently; `None` means available parallelism
    pub workers: Option<usize>,
    pub row_timeout_secs: u64,
    pub compute_deadline_secs: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::Embedding,
            vectors_path: PathBuf::from("word_vector/glove.840B.300d.txt"),
            dictionary_path: PathBuf::from("word_vector/words.txt"),
            fixed_value: 0.5,
            workers: None,
            row_timeout_secs: 30,
            compute_deadline_secs: 300,
        }
    }
}

/// `[logging]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub fn filter_directive(&self) -> String {
        let level = &self.level;
        format!("dat_web={level},dat_common={level},tower_http={level}")
    }
}

/// Scoring engine selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Word-vector DAT engine
    Embedding,
    /// Constant score, for smoke runs
    Fixed,
}

impl FromStr for EngineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "embedding" => Ok(Self::Embedding),
            "fixed" => Ok(Self::Fixed),
            other => Err(Error::Config(format!(
                "Unknown scoring engine '{}' (expected 'embedding' or 'fixed')",
                other
            ))),
        }
    }
}

impl TomlConfig {
    /// Parse and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Invalid config file {}: {}", path.display(), e))
        })?;
        config.validate()?;
        info!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Load `path` if given, else compiled defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_upload_bytes == 0 {
            return Err(Error::Config("max_upload_bytes must be greater than 0".to_string()));
        }
        if self.session_ttl_secs == 0 {
            return Err(Error::Config("session_ttl_secs must be greater than 0".to_string()));
        }
        if self.reaper_interval_secs == 0 {
            return Err(Error::Config(
                "reaper_interval_secs must be greater than 0".to_string(),
            ));
        }
        self.scoring.validate()
    }

    /// Session storage root
    pub fn work_dir(&self) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(default_work_dir)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn reaper_interval(&self) -> Duration {
        Duration::from_secs(self.reaper_interval_secs)
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == Some(0) {
            return Err(Error::Config("scoring.workers must be at least 1".to_string()));
        }
        if self.row_timeout_secs == 0 {
            return Err(Error::Config(
                "scoring.row_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.compute_deadline_secs == 0 {
            return Err(Error::Config(
                "scoring.compute_deadline_secs must be greater than 0".to_string(),
            ));
        }
        if !self.fixed_value.is_finite() {
            return Err(Error::Config("scoring.fixed_value must be finite".to_string()));
        }
        Ok(())
    }

    pub fn limits(&self) -> ScoringLimits {
        let defaults = ScoringLimits::default();
        ScoringLimits {
            workers: self.workers.unwrap_or(defaults.workers),
            row_timeout: Duration::from_secs(self.row_timeout_secs),
            compute_deadline: Duration::from_secs(self.compute_deadline_secs),
        }
    }

    /// Construct the configured engine
    ///
    /// Loading word vectors reads a large file; call from a blocking context.
    pub fn build_scorer(&self) -> Result<Arc<dyn Scorer>> {
        match self.engine {
            EngineKind::Embedding => Ok(Arc::new(EmbeddingScorer::load(
                &self.vectors_path,
                &self.dictionary_path,
            )?)),
            EngineKind::Fixed => Ok(Arc::new(FixedScorer::new(self.fixed_value))),
        }
    }
}

/// Config file location
///
/// 1. Command-line argument
/// 2. Environment variable `env_var_name`
/// 3. `<config_dir>/dat-score/config.toml`, only if it exists
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join(APP_DIR).join("config.toml"))
        .filter(|path| path.exists())
}

/// OS-dependent default work directory
pub fn default_work_dir() -> PathBuf {
    if cfg!(target_os = "macos") {
        // ~/Library/Application Support/dat-score
        dirs::data_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| std::env::temp_dir().join(APP_DIR))
    } else {
        // ~/.local/share/dat-score, %LOCALAPPDATA%\dat-score
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| std::env::temp_dir().join(APP_DIR))
    }
}
