//! Confirmed index: the latest confirmed aggregate of every tier.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::store::{self, WritePolicy};
use crate::summary::SummaryFields;
use crate::tier::TierRegistry;
use crate::traits::IndexStore;

/// Latest confirmation of one tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// File name of the artifact, e.g. `W0003_release.json`
    pub artifact: Option<String>,
    /// SHA-256 of the artifact bytes
    pub content_hash: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source_count: usize,
    pub aggregate: Option<SummaryFields>,
}

impl IndexEntry {
    pub fn is_empty(&self) -> bool {
        self.artifact.is_none()
    }
}

/// Replacement entry for one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexUpdate {
    pub artifact: String,
    pub content_hash: String,
    pub confirmed_at: DateTime<Utc>,
    pub source_count: usize,
    pub fields: SummaryFields,
}

impl From<IndexUpdate> for IndexEntry {
    fn from(update: IndexUpdate) -> Self {
        Self {
            artifact: Some(update.artifact),
            content_hash: Some(update.content_hash),
            confirmed_at: Some(update.confirmed_at),
            source_count: update.source_count,
            aggregate: Some(update.fields),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedIndexDocument {
    #[serde(default)]
    pub metadata: IndexMetadata,
    pub tiers: BTreeMap<String, IndexEntry>,
}

impl ConfirmedIndexDocument {
    /// Every registered tier present and empty
    pub fn template(registry: &TierRegistry) -> Self {
        Self {
            metadata: IndexMetadata::default(),
            tiers: registry
                .all_tier_names()
                .into_iter()
                .map(|name| (name.to_string(), IndexEntry::default()))
                .collect(),
        }
    }
}

/// File-backed confirmed index.
pub struct ConfirmedIndex {
    path: PathBuf,
    template: Option<PathBuf>,
    registry: Arc<TierRegistry>,
}

impl ConfirmedIndex {
    pub fn new(layout: &Layout, registry: Arc<TierRegistry>) -> Self {
        Self {
            path: layout.index_path(),
            template: layout.index_template(),
            registry,
        }
    }

    pub fn load_or_create(&self) -> Result<ConfirmedIndexDocument> {
        let mut doc: ConfirmedIndexDocument =
            store::load_or_create(&self.path, self.template.as_deref(), || {
                ConfirmedIndexDocument::template(&self.registry)
            })?;

        if let Some(unknown) = doc.tiers.keys().find(|name| !self.registry.contains(name)) {
            return Err(Error::validation(format!(
                "{} indexes unregistered tier '{}'",
                self.path.display(),
                unknown
            )));
        }
        for name in self.registry.all_tier_names() {
            doc.tiers.entry(name.to_string()).or_default();
        }

        Ok(doc)
    }

    pub fn save(&self, doc: &ConfirmedIndexDocument) -> Result<()> {
        store::save(&self.path, doc, WritePolicy::Replace)?;
        Ok(())
    }

    /// Replace one tier's entry, leaving every other tier untouched
    pub fn update_tier(&self, tier: &str, update: IndexUpdate) -> Result<()> {
        self.registry.resolve(tier)?;
        let mut doc = self.load_or_create()?;
        let artifact = update.artifact.clone();

        doc.tiers.insert(tier.to_string(), update.into());
        doc.metadata.last_updated = Some(Utc::now());
        self.save(&doc)?;

        tracing::debug!("Index entry for {} now points at {}", tier, artifact);
        Ok(())
    }

    pub fn entry(&self, tier: &str) -> Result<IndexEntry> {
        self.registry.resolve(tier)?;
        Ok(self.load_or_create()?.tiers.remove(tier).unwrap_or_default())
    }
}

impl IndexStore for ConfirmedIndex {
    fn update_tier(&self, tier: &str, update: IndexUpdate) -> Result<()> {
        ConfirmedIndex::update_tier(self, tier, update)
    }

    fn entry(&self, tier: &str) -> Result<IndexEntry> {
        ConfirmedIndex::entry(self, tier)
    }
}
