//! SDK Configuration
//!
//! Locates the Strata home directory and loads the engine configuration
//! from it.
//!
//! ```text
//! ~/.strata/                 # or $STRATA_HOME
//! ├── config.toml            # StrataConfig (optional)
//! └── strata-data/           # default base directory
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use strata_core::StrataConfig;

/// Environment variable overriding the home directory
pub const HOME_ENV: &str = "STRATA_HOME";

const CONFIG_FILE: &str = "config.toml";

/// SDK configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SDKConfig {
    /// Directory holding `config.toml`; relative paths resolve against it
    pub home_dir: PathBuf,

    /// Engine configuration
    pub engine: StrataConfig,
}

impl Default for SDKConfig {
    fn default() -> Self {
        Self::new(discover_home())
    }
}

/// `$STRATA_HOME` if set, otherwise `~/.strata`
pub fn discover_home() -> PathBuf {
    std::env::var(HOME_ENV).map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".strata")
    })
}

impl SDKConfig {
    /// Default engine configuration rooted at `home_dir`
    pub fn new(home_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self {
            home_dir: home_dir.into(),
            engine: StrataConfig::default(),
        };
        config.resolve_paths();
        config
    }

    /// Load from the discovered home directory
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(discover_home())
    }

    /// Load `config.toml` from `home_dir`, falling back to defaults
    pub fn load_from(home_dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let home_dir = home_dir.into();
        let config_path = home_dir.join(CONFIG_FILE);

        if !config_path.exists() {
            tracing::debug!("No {}; using defaults", config_path.display());
            return Ok(Self::new(home_dir));
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let engine = StrataConfig::from_toml_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        let mut config = Self { home_dir, engine };
        config.resolve_paths();
        Ok(config)
    }

    /// Replace the engine configuration
    pub fn with_engine(mut self, engine: StrataConfig) -> Self {
        self.engine = engine;
        self.resolve_paths();
        self
    }

    /// Path of the configuration file
    pub fn config_path(&self) -> PathBuf {
        self.home_dir.join(CONFIG_FILE)
    }

    /// Write the default configuration unless a file already exists.
    ///
    /// Returns the path of the configuration file.
    pub fn write_default(&self) -> anyhow::Result<PathBuf> {
        let path = self.config_path();
        if path.exists() {
            return Ok(path);
        }

        std::fs::create_dir_all(&self.home_dir)
            .with_context(|| format!("Failed to create {}", self.home_dir.display()))?;
        let content = StrataConfig::default()
            .to_toml_string()
            .context("Failed to serialize default config")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::info!("Wrote default configuration to {}", path.display());
        Ok(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.home_dir.as_os_str().is_empty() {
            return Err(ConfigValidationError::InvalidValue {
                field: "home_dir".into(),
                message: "must not be empty".into(),
            });
        }
        self.engine.validate()?;
        Ok(())
    }

    fn resolve_paths(&mut self) {
        let home = self.home_dir.clone();
        let resolve = |p: &Path| if p.is_relative() { home.join(p) } else { p.to_path_buf() };

        let paths = &mut self.engine.paths;
        paths.base_dir = resolve(&paths.base_dir);
        if let Some(t) = paths.template_dir.as_mut() {
            *t = resolve(t);
        }
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error(transparent)]
    Engine(#[from] strata_core::Error),
}
