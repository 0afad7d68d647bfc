//! Engine configuration.
//!
//! One [`StrataConfig`] is built per process and handed to every component
//! constructor. It deserializes from TOML; every section has defaults so an
//! empty file is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrataConfig {
    /// Filesystem locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// The base records that feed the bottom tier
    #[serde(default)]
    pub episodes: EpisodeConfig,

    /// Tiers in cascade order, lowest first
    #[serde(default = "default_tiers")]
    pub tiers: Vec<TierConfig>,

    /// Character budgets written into fresh placeholders
    #[serde(default)]
    pub placeholders: PlaceholderBudget,
}

impl Default for StrataConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            episodes: EpisodeConfig::default(),
            tiers: default_tiers(),
            placeholders: PlaceholderBudget::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root directory for all persisted documents
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Override for the episodes directory (default: `<base>/episodes`)
    pub episodes_dir: Option<PathBuf>,

    /// Override for the digests directory (default: `<base>/digests`)
    pub digests_dir: Option<PathBuf>,

    /// Override for the essences directory (default: `<base>/essences`)
    pub essences_dir: Option<PathBuf>,

    /// Directory holding template documents used on first creation
    pub template_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            episodes_dir: None,
            digests_dir: None,
            essences_dir: None,
            template_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeConfig {
    /// Filename prefix of episode records
    #[serde(default = "default_episode_prefix")]
    pub prefix: String,

    /// Zero-padded width of episode numbers
    #[serde(default = "default_episode_width")]
    pub digit_width: usize,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            prefix: default_episode_prefix(),
            digit_width: default_episode_width(),
        }
    }
}

/// One tier as written in configuration.
///
/// Source and next tiers are not configured: they follow from the position
/// in [`StrataConfig::tiers`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    pub name: String,
    pub prefix: String,
    pub digit_width: usize,
    pub directory: String,
    pub threshold: usize,
}

impl TierConfig {
    pub fn new(
        name: impl Into<String>,
        prefix: impl Into<String>,
        digit_width: usize,
        directory: impl Into<String>,
        threshold: usize,
    ) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            digit_width,
            directory: directory.into(),
            threshold,
        }
    }
}

/// Placeholder sizing hints, scaled by the number of staged sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceholderBudget {
    /// Narrative characters requested per staged source (default: 400)
    #[serde(default = "default_narrative_chars")]
    pub narrative_chars_per_source: usize,

    /// Reflection characters requested per staged source (default: 160)
    #[serde(default = "default_reflection_chars")]
    pub reflection_chars_per_source: usize,

    /// Number of keyword slots in a fresh placeholder (default: 5)
    #[serde(default = "default_keyword_slots")]
    pub keyword_slots: usize,
}

impl Default for PlaceholderBudget {
    fn default() -> Self {
        Self {
            narrative_chars_per_source: default_narrative_chars(),
            reflection_chars_per_source: default_reflection_chars(),
            keyword_slots: default_keyword_slots(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("strata-data")
}

fn default_episode_prefix() -> String {
    "L".to_string()
}

fn default_episode_width() -> usize {
    5
}

fn default_narrative_chars() -> usize {
    400
}

fn default_reflection_chars() -> usize {
    160
}

fn default_keyword_slots() -> usize {
    5
}

/// The eight standard tiers, week through century.
pub fn default_tiers() -> Vec<TierConfig> {
    vec![
        TierConfig::new("weekly", "W", 4, "1_weekly", 5),
        TierConfig::new("monthly", "M", 3, "2_monthly", 5),
        TierConfig::new("quarterly", "Q", 3, "3_quarterly", 3),
        TierConfig::new("annual", "A", 2, "4_annual", 4),
        TierConfig::new("triennial", "T", 2, "5_triennial", 3),
        TierConfig::new("decadal", "D", 2, "6_decadal", 3),
        TierConfig::new("multi_decadal", "MD", 2, "7_multi_decadal", 3),
        TierConfig::new("centurial", "C", 2, "8_centurial", 4),
    ]
}

impl StrataConfig {
    /// Create a default configuration rooted at `base_dir`
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            paths: PathsConfig {
                base_dir: base_dir.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::config(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_io(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(format!("cannot serialize: {}", e)))
    }

    /// Set the threshold for one tier
    pub fn with_threshold(mut self, tier: &str, threshold: usize) -> Self {
        if let Some(t) = self.tiers.iter_mut().find(|t| t.name == tier) {
            t.threshold = threshold;
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.tiers.is_empty() {
            return Err(Error::config("at least one tier must be configured"));
        }

        validate_prefix("episodes.prefix", &self.episodes.prefix)?;
        if self.episodes.digit_width == 0 {
            return Err(Error::config("episodes.digit_width must be greater than 0"));
        }

        let mut names = std::collections::HashSet::new();
        let mut prefixes = std::collections::HashSet::new();
        prefixes.insert(self.episodes.prefix.as_str());

        for tier in &self.tiers {
            if tier.name.trim().is_empty() {
                return Err(Error::config("tier name cannot be empty"));
            }
            if !names.insert(tier.name.as_str()) {
                return Err(Error::config(format!("duplicate tier name: {}", tier.name)));
            }
            validate_prefix(&format!("tiers.{}.prefix", tier.name), &tier.prefix)?;
            if !prefixes.insert(tier.prefix.as_str()) {
                return Err(Error::config(format!(
                    "duplicate prefix '{}' on tier {}",
                    tier.prefix, tier.name
                )));
            }
            if tier.digit_width == 0 || tier.digit_width > 9 {
                return Err(Error::config(format!(
                    "tiers.{}.digit_width must be between 1 and 9",
                    tier.name
                )));
            }
            if tier.threshold == 0 {
                return Err(Error::config(format!(
                    "tiers.{}.threshold must be greater than 0",
                    tier.name
                )));
            }
            if tier.directory.trim().is_empty() {
                return Err(Error::config(format!(
                    "tiers.{}.directory cannot be empty",
                    tier.name
                )));
            }
        }

        Ok(())
    }
}

fn validate_prefix(field: &str, prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(Error::config(format!("{} cannot be empty", field)));
    }
    if !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Error::config(format!(
            "{} must be ASCII letters only, got '{}'",
            field, prefix
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StrataConfig::default();
        assert_eq!(config.tiers.len(), 8);
        assert_eq!(config.tiers[0].name, "weekly");
        assert_eq!(config.tiers[7].name, "centurial");
        assert_eq!(config.episodes.prefix, "L");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = StrataConfig::from_toml_str("").unwrap();
        assert_eq!(config.tiers.len(), 8);
        assert_eq!(config.placeholders.keyword_slots, 5);
    }

    #[test]
    fn test_toml_overrides() {
        let config = StrataConfig::from_toml_str(
            r#"
            [paths]
            base_dir = "/srv/memory"

            [[tiers]]
            name = "weekly"
            prefix = "W"
            digit_width = 4
            directory = "weekly"
            threshold = 7

            [[tiers]]
            name = "monthly"
            prefix = "M"
            digit_width = 3
            directory = "monthly"
            threshold = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.paths.base_dir, PathBuf::from("/srv/memory"));
        assert_eq!(config.tiers.len(), 2);
        assert_eq!(config.tiers[0].threshold, 7);
    }

    #[test]
    fn test_config_validation() {
        let mut config = StrataConfig::default();
        config.tiers[1].prefix = "W".into();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = StrataConfig::default();
        config.tiers[0].threshold = 0;
        assert!(config.validate().is_err());

        let mut config = StrataConfig::default();
        config.tiers[0].prefix = "W1".into();
        assert!(config.validate().is_err());

        let mut config = StrataConfig::default();
        config.tiers.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_threshold() {
        let config = StrataConfig::default().with_threshold("quarterly", 9);
        assert_eq!(config.tiers[2].threshold, 9);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = StrataConfig::with_base_dir("/data");
        let text = config.to_toml_string().unwrap();
        let parsed = StrataConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.paths.base_dir, PathBuf::from("/data"));
        assert_eq!(parsed.tiers, config.tiers);
    }
}
