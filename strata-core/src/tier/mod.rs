//! Tier registry.
//!
//! Static metadata for every tier, built once from [`StrataConfig`] and never
//! mutated afterwards. The cascade chain follows declaration order:
//!
//! ```text
//! episodes ─▶ weekly ─▶ monthly ─▶ quarterly ─▶ annual ─▶ … ─▶ centurial
//!   (L)        (W)        (M)         (Q)         (A)            (C)
//! ```

pub mod codec;

use crate::config::{EpisodeConfig, StrataConfig};
use crate::error::{Error, Result};

/// Immutable description of one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierDefinition {
    /// Symbolic name (e.g. `weekly`)
    pub name: String,
    /// Filename prefix of this tier's artifacts (e.g. `W`)
    pub prefix: String,
    /// Zero-padded width of sequence numbers
    pub digit_width: usize,
    /// Directory name under the digests directory
    pub directory_name: String,
    /// Tier feeding this one; `None` for the bottom tier, which consumes episodes
    pub source_tier: Option<String>,
    /// Tier this one cascades into; `None` at the top
    pub next_tier: Option<String>,
    /// Advisory number of staged items that makes a promotion worthwhile
    pub threshold: usize,
}

impl TierDefinition {
    /// Format a sequence identifier for this tier
    pub fn format_id(&self, number: u32) -> String {
        codec::format_id(&self.prefix, self.digit_width, number)
    }

    /// Whether this is the top of the chain
    pub fn is_top(&self) -> bool {
        self.next_tier.is_none()
    }
}

/// Lookup table over all configured tiers.
#[derive(Debug, Clone)]
pub struct TierRegistry {
    tiers: Vec<TierDefinition>,
    episodes: EpisodeConfig,
}

impl TierRegistry {
    /// Build the registry from a validated configuration
    pub fn from_config(config: &StrataConfig) -> Result<Self> {
        config.validate()?;

        let tiers = config
            .tiers
            .iter()
            .enumerate()
            .map(|(i, tier)| TierDefinition {
                name: tier.name.clone(),
                prefix: tier.prefix.clone(),
                digit_width: tier.digit_width,
                directory_name: tier.directory.clone(),
                source_tier: i.checked_sub(1).map(|j| config.tiers[j].name.clone()),
                next_tier: config.tiers.get(i + 1).map(|t| t.name.clone()),
                threshold: tier.threshold,
            })
            .collect();

        Ok(Self {
            tiers,
            episodes: config.episodes.clone(),
        })
    }

    /// Registry of the eight standard tiers
    pub fn standard() -> Self {
        // The default configuration always validates.
        Self::from_config(&StrataConfig::default()).unwrap_or_else(|_| Self {
            tiers: Vec::new(),
            episodes: EpisodeConfig::default(),
        })
    }

    /// Resolve a tier by name
    pub fn resolve(&self, name: &str) -> Result<&TierDefinition> {
        self.tiers
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| Error::UnknownTier(name.to_string()))
    }

    /// Check whether a tier name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tiers.iter().any(|t| t.name == name)
    }

    /// All tier names, lowest first
    pub fn all_tier_names(&self) -> Vec<&str> {
        self.tiers.iter().map(|t| t.name.as_str()).collect()
    }

    /// Iterate over tier definitions, lowest first
    pub fn iter(&self) -> impl Iterator<Item = &TierDefinition> {
        self.tiers.iter()
    }

    /// The tier a promotion of `name` cascades into
    pub fn cascade_target(&self, name: &str) -> Result<Option<&TierDefinition>> {
        match &self.resolve(name)?.next_tier {
            Some(next) => self.resolve(next).map(Some),
            None => Ok(None),
        }
    }

    /// The lowest tier (consumes episodes)
    pub fn bottom(&self) -> Option<&TierDefinition> {
        self.tiers.first()
    }

    /// The highest tier
    pub fn top(&self) -> Option<&TierDefinition> {
        self.tiers.last()
    }

    /// Prefix of the items a tier consumes
    pub fn source_prefix(&self, name: &str) -> Result<&str> {
        match &self.resolve(name)?.source_tier {
            Some(source) => Ok(self.resolve(source)?.prefix.as_str()),
            None => Ok(self.episodes.prefix.as_str()),
        }
    }

    /// Digit width of the items a tier consumes
    pub fn source_width(&self, name: &str) -> Result<usize> {
        match &self.resolve(name)?.source_tier {
            Some(source) => Ok(self.resolve(source)?.digit_width),
            None => Ok(self.episodes.digit_width),
        }
    }

    /// Episode record settings
    pub fn episodes(&self) -> &EpisodeConfig {
        &self.episodes
    }

    /// Format `{prefix}{number}` for a tier name
    pub fn format(&self, name: &str, number: u32) -> Result<String> {
        let tier = self
            .resolve(name)
            .map_err(|_| Error::InvalidTier(name.to_string()))?;
        Ok(tier.format_id(number))
    }

    /// Number of tiers
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TierConfig;

    #[test]
    fn test_standard_chain() {
        let registry = TierRegistry::standard();
        assert_eq!(registry.len(), 8);
        assert_eq!(
            registry.all_tier_names(),
            vec![
                "weekly",
                "monthly",
                "quarterly",
                "annual",
                "triennial",
                "decadal",
                "multi_decadal",
                "centurial"
            ]
        );

        let weekly = registry.resolve("weekly").unwrap();
        assert_eq!(weekly.source_tier, None);
        assert_eq!(weekly.next_tier.as_deref(), Some("monthly"));

        let top = registry.top().unwrap();
        assert!(top.is_top());
        assert!(registry.cascade_target("centurial").unwrap().is_none());
    }

    #[test]
    fn test_chain_is_linear() {
        let registry = TierRegistry::standard();
        let mut visited = vec![registry.bottom().unwrap().name.clone()];
        let mut current = registry.bottom().unwrap().name.clone();

        while let Some(next) = registry.cascade_target(&current).unwrap() {
            assert_eq!(next.source_tier.as_deref(), Some(current.as_str()));
            assert!(!visited.contains(&next.name));
            visited.push(next.name.clone());
            current = next.name.clone();
        }

        assert_eq!(visited.len(), registry.len());
    }

    #[test]
    fn test_unknown_tier() {
        let registry = TierRegistry::standard();
        assert!(matches!(
            registry.resolve("fortnightly"),
            Err(Error::UnknownTier(_))
        ));
        assert!(matches!(
            registry.format("fortnightly", 1),
            Err(Error::InvalidTier(_))
        ));
        assert!(registry.cascade_target("fortnightly").is_err());
    }

    #[test]
    fn test_source_prefix() {
        let registry = TierRegistry::standard();
        assert_eq!(registry.source_prefix("weekly").unwrap(), "L");
        assert_eq!(registry.source_prefix("monthly").unwrap(), "W");
        assert_eq!(registry.source_prefix("centurial").unwrap(), "MD");

        assert_eq!(registry.source_width("weekly").unwrap(), 5);
        assert_eq!(registry.source_width("monthly").unwrap(), 4);
        assert!(registry.source_width("hourly").is_err());
    }

    #[test]
    fn test_custom_registry() {
        let config = StrataConfig {
            tiers: vec![
                TierConfig::new("daily", "D", 3, "daily", 7),
                TierConfig::new("yearly", "Y", 2, "yearly", 12),
            ],
            ..Default::default()
        };
        let registry = TierRegistry::from_config(&config).unwrap();
        assert_eq!(registry.format("daily", 7).unwrap(), "D007");
        assert_eq!(registry.resolve("yearly").unwrap().threshold, 12);
        assert_eq!(registry.source_prefix("yearly").unwrap(), "D");
    }
}
