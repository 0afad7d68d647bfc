//! Confirmed artifacts: the immutable output of a tier promotion.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::{self, Layout};
use crate::provisional::ProvisionalEntry;
use crate::staging::DraftAggregate;
use crate::store::{self, SaveOutcome, WritePolicy};
use crate::tier::{TierDefinition, codec};
use crate::traits::ArtifactSink;

const MAX_TITLE_CHARS: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub tier: String,
    /// Sequence identifier, e.g. `W0001`
    pub id: String,
    pub number: u32,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub source_count: usize,
    /// Individual entries generated from the aggregate instead of analysed
    #[serde(default)]
    pub degraded_items: usize,
}

/// A promoted draft with its per-item entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedArtifact {
    pub metadata: ArtifactMetadata,
    pub aggregate: DraftAggregate,
    pub individual: Vec<ProvisionalEntry>,
}

impl ConfirmedArtifact {
    pub fn new(
        tier: &TierDefinition,
        number: u32,
        title: &str,
        aggregate: DraftAggregate,
        individual: Vec<ProvisionalEntry>,
    ) -> Self {
        let degraded_items = individual.iter().filter(|e| e.degraded).count();
        Self {
            metadata: ArtifactMetadata {
                tier: tier.name.clone(),
                id: tier.format_id(number),
                number,
                title: title.trim().to_string(),
                created_at: Utc::now(),
                source_count: aggregate.source_files.len(),
                degraded_items,
            },
            aggregate,
            individual,
        }
    }

    /// Highest source sequence number the artifact consumed
    pub fn last_source_number(&self) -> Option<u32> {
        self.aggregate
            .source_files
            .iter()
            .filter_map(|f| codec::parse(f).map(|(_, n)| n))
            .max()
    }
}

/// Reduce a free-form title to a filename component.
///
/// Alphanumerics are kept, every other run of characters becomes one `_`.
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::new();
    for c in title.trim().chars() {
        if c.is_alphanumeric() || c == '-' {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }

    let out: String = out.chars().take(MAX_TITLE_CHARS).collect();
    let out = out.trim_end_matches('_');
    if out.is_empty() {
        "untitled".to_string()
    } else {
        out.to_string()
    }
}

/// Confirmed artifacts stored as JSON files under each tier directory.
pub struct ArtifactStore {
    layout: Layout,
}

impl ArtifactStore {
    pub fn new(layout: &Layout) -> Self {
        Self {
            layout: layout.clone(),
        }
    }

    /// Artifact file names of a tier, sorted
    pub fn list(&self, tier: &TierDefinition) -> Result<Vec<String>> {
        let names = layout::list_file_names(&self.layout.tier_dir(tier))?;
        Ok(names
            .into_iter()
            .filter(|n| codec::number_with_prefix(n, &tier.prefix).is_some())
            .collect())
    }
}

impl ArtifactSink for ArtifactStore {
    fn next_number(&self, tier: &TierDefinition) -> Result<u32> {
        let names = self.list(tier)?;
        let next = codec::max_number(names.iter().map(String::as_str), &tier.prefix)
            .unwrap_or(0)
            + 1;

        let limit = 10u64.pow(tier.digit_width as u32) - 1;
        if u64::from(next) > limit {
            return Err(Error::validation(format!(
                "tier {} has run out of {}-digit sequence numbers",
                tier.name, tier.digit_width
            )));
        }
        Ok(next)
    }

    fn path_for(&self, tier: &TierDefinition, number: u32, title: &str) -> PathBuf {
        self.layout.tier_dir(tier).join(format!(
            "{}_{}.json",
            tier.format_id(number),
            sanitize_title(title)
        ))
    }

    fn locate(&self, tier: &TierDefinition, file_name: &str) -> PathBuf {
        self.layout.tier_dir(tier).join(file_name)
    }

    fn write(
        &self,
        path: &Path,
        artifact: &ConfirmedArtifact,
        policy: WritePolicy<'_>,
    ) -> Result<SaveOutcome> {
        store::save(path, artifact, policy)
    }

    fn read(&self, path: &Path) -> Result<ConfirmedArtifact> {
        store::read(path)
    }

    fn remove(&self, path: &Path) -> Result<bool> {
        store::remove(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrataConfig;
    use crate::tier::TierRegistry;
    use tempfile::tempdir;

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("Sprint kickoff!"), "Sprint_kickoff");
        assert_eq!(sanitize_title("  a / b -- c  "), "a_b_--_c");
        assert_eq!(sanitize_title("???"), "untitled");
        assert_eq!(sanitize_title("春の計画"), "春の計画");
        assert_eq!(sanitize_title(&"x".repeat(100)).len(), 60);
    }

    #[test]
    fn test_next_number_follows_directory() {
        let dir = tempdir().unwrap();
        let config = StrataConfig::with_base_dir(dir.path());
        let registry = TierRegistry::from_config(&config).unwrap();
        let store = ArtifactStore::new(&Layout::from_config(&config));
        let weekly = registry.resolve("weekly").unwrap();

        assert_eq!(store.next_number(weekly).unwrap(), 1);

        let tier_dir = dir.path().join("digests/1_weekly");
        std::fs::create_dir_all(tier_dir.join("provisional")).unwrap();
        std::fs::write(tier_dir.join("W0001_a.json"), "{}").unwrap();
        std::fs::write(tier_dir.join("W0004_b.json"), "{}").unwrap();
        std::fs::write(tier_dir.join("notes.md"), "").unwrap();
        std::fs::write(tier_dir.join("provisional/W0009_individual.json"), "{}").unwrap();

        assert_eq!(store.next_number(weekly).unwrap(), 5);
        assert_eq!(
            store.path_for(weekly, 5, "Week five"),
            tier_dir.join("W0005_Week_five.json")
        );
    }

    #[test]
    fn test_sequence_exhausted() {
        let dir = tempdir().unwrap();
        let config = StrataConfig::with_base_dir(dir.path());
        let registry = TierRegistry::from_config(&config).unwrap();
        let store = ArtifactStore::new(&Layout::from_config(&config));
        let centurial = registry.resolve("centurial").unwrap();

        let tier_dir = dir.path().join("digests/8_centurial");
        std::fs::create_dir_all(&tier_dir).unwrap();
        std::fs::write(tier_dir.join("C99_last.json"), "{}").unwrap();

        assert!(matches!(store.next_number(centurial), Err(Error::Validation(_))));
    }
}
