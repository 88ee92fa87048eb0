//! Configuration loading.
//!
//! Every field has a default, so a host without a configuration file still
//! gets a complete collection. The file is looked up in this order:
//!
//! 1. Path given with `--config`
//! 2. `HOSTDIAG_CONFIG` environment variable
//! 3. `/etc/hostdiag/config.toml`
//!
//! If none of these exist the defaults are used.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::layout::Category;
use crate::privacy::RedactionSettings;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "HOSTDIAG_CONFIG";

/// Environment variable overriding `product.home`.
pub const PRODUCT_HOME_ENV: &str = "HOSTDIAG_PRODUCT_HOME";

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/hostdiag/config.toml";

/// Complete collector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagConfig {
    /// Directory holding the bundle tree and the finished archive.
    pub output_dir: PathBuf,
    /// Prefix of generated bundle names.
    pub bundle_prefix: String,
    /// Free space required in `output_dir` before anything is collected.
    pub min_free_mb: u64,
    /// Keep the bundle tree after archiving.
    pub keep_tree: bool,
    /// Product whose files and logs are snapshotted.
    pub product: ProductConfig,
    /// Redaction of captured output.
    pub redaction: RedactionSettings,
    /// Additional commands to capture.
    pub extra_checks: Vec<ExtraCheck>,
}

impl Default for DiagConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("/tmp"),
            bundle_prefix: String::from("hostdiag"),
            min_free_mb: 100,
            keep_tree: false,
            product: ProductConfig::default(),
            redaction: RedactionSettings::default(),
            extra_checks: Vec::new(),
        }
    }
}

/// Product-specific snapshot settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductConfig {
    /// Display name, used in the bundle summary.
    pub name: Option<String>,
    /// Installation directory. Enables the `enterprise/find` listing.
    pub home: Option<PathBuf>,
    /// Log directories copied into `logs/`.
    pub log_dirs: Vec<PathBuf>,
    /// Configuration files copied into `enterprise/find/`.
    pub config_files: Vec<PathBuf>,
    /// Depth limit of the product home listing.
    pub find_max_depth: usize,
    /// Depth limit when copying log directories.
    pub log_max_depth: usize,
}

impl Default for ProductConfig {
    fn default() -> Self {
        Self {
            name: None,
            home: None,
            log_dirs: Vec::new(),
            config_files: Vec::new(),
            find_max_depth: 8,
            log_max_depth: 4,
        }
    }
}

/// A user-defined command check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraCheck {
    pub name: String,
    pub category: String,
    /// File name inside the category directory.
    pub output: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ExtraCheck {
    /// Category this check writes to.
    pub fn category(&self) -> Result<Category> {
        self.category
            .parse()
            .map_err(|e| Error::Config(format!("extra check '{}': {}", self.name, e)))
    }
}

impl DiagConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: DiagConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Required free space in bytes.
    pub fn min_free_bytes(&self) -> u64 {
        self.min_free_mb.saturating_mul(1024 * 1024)
    }

    /// Whether any product snapshot is configured.
    pub fn has_product(&self) -> bool {
        self.product.home.is_some()
            || !self.product.log_dirs.is_empty()
            || !self.product.config_files.is_empty()
    }

    /// Check the configuration for values that cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.bundle_prefix.trim().is_empty() {
            return Err(Error::Config("bundle_prefix must not be empty".to_string()));
        }
        if self.bundle_prefix.contains('/') {
            return Err(Error::Config(
                "bundle_prefix must not contain '/'".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for check in &self.extra_checks {
            if check.name.trim().is_empty() {
                return Err(Error::Config("extra check with empty name".to_string()));
            }
            if !names.insert(check.name.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate extra check '{}'",
                    check.name
                )));
            }
            check.category()?;
            if check.output.is_empty()
                || check.output.contains('/')
                || check.output == "."
                || check.output == ".."
            {
                return Err(Error::Config(format!(
                    "extra check '{}': output must be a plain file name, got '{}'",
                    check.name, check.output
                )));
            }
            if check.program.trim().is_empty() {
                return Err(Error::Config(format!(
                    "extra check '{}': program must not be empty",
                    check.name
                )));
            }
        }

        Ok(())
    }
}

/// Resolves which configuration file to read.
pub struct ConfigLoader {
    explicit: Option<PathBuf>,
    system_path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader. `explicit` is the `--config` path, if any.
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            system_path: PathBuf::from(SYSTEM_CONFIG_PATH),
        }
    }

    /// Use a different system-wide configuration path.
    pub fn system_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.system_path = path.into();
        self
    }

    /// Locate the configuration file, if there is one.
    ///
    /// An explicit path or `HOSTDIAG_CONFIG` must exist. The system-wide file
    /// is optional.
    pub fn resolve(&self) -> Result<Option<PathBuf>> {
        if let Some(path) = &self.explicit {
            if !path.is_file() {
                return Err(Error::Config(format!(
                    "configuration file not found: {}",
                    path.display()
                )));
            }
            return Ok(Some(path.clone()));
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(env_path);
            if !path.is_file() {
                return Err(Error::Config(format!(
                    "{} points to a missing file: {}",
                    CONFIG_ENV,
                    path.display()
                )));
            }
            return Ok(Some(path));
        }

        if self.system_path.is_file() {
            return Ok(Some(self.system_path.clone()));
        }

        Ok(None)
    }

    /// Load the configuration, applying environment overrides.
    pub fn load(&self) -> Result<DiagConfig> {
        let mut config = match self.resolve()? {
            Some(path) => {
                tracing::info!("Using configuration from {}", path.display());
                DiagConfig::load(&path)?
            }
            None => {
                tracing::debug!("No configuration file found, using defaults");
                DiagConfig::default()
            }
        };

        if let Ok(home) = std::env::var(PRODUCT_HOME_ENV) {
            if !home.is_empty() {
                config.product.home = Some(PathBuf::from(home));
            }
        }

        Ok(config)
    }
}
