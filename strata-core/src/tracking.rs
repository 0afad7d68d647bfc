//! Tracking state: what each tier last promoted, and when.
//!
//! Only the cascade engine writes here (after a successful promotion).
//! Readers use it to find source items that arrived since the last run.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::store::{self, WritePolicy};
use crate::tier::{TierRegistry, codec};
use crate::traits::TrackingStore;

/// Bookkeeping for one tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEntry {
    /// When the tier was last promoted
    pub last_timestamp: Option<DateTime<Utc>>,
    /// Highest source sequence number consumed by that promotion
    pub last_processed_number: Option<u32>,
}

/// The tracking document: one entry per tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingDocument {
    pub tiers: BTreeMap<String, TrackingEntry>,
}

impl TrackingDocument {
    /// Every registered tier present, nothing processed
    pub fn template(registry: &TierRegistry) -> Self {
        Self {
            tiers: registry
                .all_tier_names()
                .into_iter()
                .map(|name| (name.to_string(), TrackingEntry::default()))
                .collect(),
        }
    }
}

/// File-backed tracking state.
pub struct TrackingState {
    path: PathBuf,
    template: Option<PathBuf>,
    registry: Arc<TierRegistry>,
}

impl TrackingState {
    pub fn new(layout: &Layout, registry: Arc<TierRegistry>) -> Self {
        Self {
            path: layout.tracking_path(),
            template: layout.tracking_template(),
            registry,
        }
    }

    /// Load the document, creating it on first use
    pub fn load(&self) -> Result<TrackingDocument> {
        let mut doc: TrackingDocument = store::load_or_create(&self.path, self.template.as_deref(), || {
            TrackingDocument::template(&self.registry)
        })?;

        if let Some(unknown) = doc.tiers.keys().find(|name| !self.registry.contains(name)) {
            return Err(Error::validation(format!(
                "{} tracks unregistered tier '{}'",
                self.path.display(),
                unknown
            )));
        }
        for name in self.registry.all_tier_names() {
            doc.tiers.entry(name.to_string()).or_default();
        }

        Ok(doc)
    }

    /// Tracking entry of one tier
    pub fn entry(&self, tier: &str) -> Result<TrackingEntry> {
        self.registry.resolve(tier)?;
        Ok(self.load()?.tiers.remove(tier).unwrap_or_default())
    }

    /// Source filenames newer than the tier's last processed number.
    ///
    /// Only names carrying the tier's source prefix are considered; the result
    /// is sorted by sequence number.
    pub fn new_since_last(&self, tier: &str, filenames: &[String]) -> Result<Vec<String>> {
        let prefix = self.registry.source_prefix(tier)?;
        let last = self.entry(tier)?.last_processed_number.unwrap_or(0);

        let mut fresh: Vec<(u32, &String)> = filenames
            .iter()
            .filter_map(|f| codec::number_with_prefix(f, prefix).map(|n| (n, f)))
            .filter(|(n, _)| *n > last)
            .collect();
        fresh.sort();

        Ok(fresh.into_iter().map(|(_, f)| f.clone()).collect())
    }
}

impl TrackingStore for TrackingState {
    fn record_promotion(&self, tier: &str, last_number: u32, at: DateTime<Utc>) -> Result<()> {
        self.registry.resolve(tier)?;
        let mut doc = self.load()?;
        let entry = doc.tiers.entry(tier.to_string()).or_default();

        if entry.last_processed_number.is_some_and(|prev| prev > last_number) {
            tracing::warn!(
                "Tier {} tracking moves backwards ({:?} -> {})",
                tier,
                entry.last_processed_number,
                last_number
            );
        }
        entry.last_processed_number = Some(last_number);
        entry.last_timestamp = Some(at);

        store::save(&self.path, &doc, WritePolicy::Replace)?;
        tracing::debug!("Tracking for {} now at {}", tier, last_number);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrataConfig;
    use tempfile::tempdir;

    fn setup(dir: &std::path::Path) -> TrackingState {
        let config = StrataConfig::with_base_dir(dir);
        let registry = Arc::new(TierRegistry::from_config(&config).unwrap());
        TrackingState::new(&Layout::from_config(&config), registry)
    }

    #[test]
    fn test_created_empty() {
        let dir = tempdir().unwrap();
        let tracking = setup(dir.path());

        let doc = tracking.load().unwrap();
        assert_eq!(doc.tiers.len(), 8);
        assert!(doc.tiers.values().all(|e| *e == TrackingEntry::default()));
        assert!(dir.path().join("digests/tracking.json").exists());
    }

    #[test]
    fn test_record_promotion() {
        let dir = tempdir().unwrap();
        let tracking = setup(dir.path());
        let at = Utc::now();

        tracking.record_promotion("weekly", 5, at).unwrap();
        let entry = tracking.entry("weekly").unwrap();
        assert_eq!(entry.last_processed_number, Some(5));
        assert_eq!(entry.last_timestamp, Some(at));
        assert_eq!(tracking.entry("monthly").unwrap(), TrackingEntry::default());

        assert!(matches!(
            tracking.record_promotion("hourly", 1, at),
            Err(Error::UnknownTier(_))
        ));
    }

    #[test]
    fn test_new_since_last() {
        let dir = tempdir().unwrap();
        let tracking = setup(dir.path());
        let files: Vec<String> = ["L00003_c.txt", "L00001_a.txt", "L00002_b.txt", "notes.md", "W0001.json"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(
            tracking.new_since_last("weekly", &files).unwrap(),
            vec!["L00001_a.txt", "L00002_b.txt", "L00003_c.txt"]
        );

        tracking.record_promotion("weekly", 2, Utc::now()).unwrap();
        assert_eq!(tracking.new_since_last("weekly", &files).unwrap(), vec!["L00003_c.txt"]);
        assert_eq!(tracking.new_since_last("monthly", &files).unwrap(), vec!["W0001.json"]);
    }

    #[test]
    fn test_unregistered_tier_in_document() {
        let dir = tempdir().unwrap();
        let tracking = setup(dir.path());
        std::fs::create_dir_all(dir.path().join("digests")).unwrap();
        std::fs::write(
            dir.path().join("digests/tracking.json"),
            r#"{"tiers": {"hourly": {"last_timestamp": null, "last_processed_number": 3}}}"#,
        )
        .unwrap();

        assert!(matches!(tracking.load(), Err(Error::Validation(_))));
    }
}
