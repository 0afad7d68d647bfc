//! Provisional queue: short-form summaries of individual source items.
//!
//! Entries accumulate per tier in a document addressed by the sequence number
//! the next confirmed artifact will take (`provisional/W0002_individual.json`).
//! Promotion consumes the document; when none exists, entries are generated
//! from the aggregate and flagged as degraded.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactStore;
use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::staging::DraftAggregate;
use crate::store::{self, WritePolicy};
use crate::summary::{self, SummaryRecord, targets};
use crate::tier::{TierDefinition, TierRegistry, codec};
use crate::traits::{ArtifactSink, ProvisionalStore};

/// Short-form summary of one source item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionalEntry {
    pub source_file: String,
    pub digest_type: String,
    pub keywords: Vec<String>,
    pub narrative: String,
    pub reflection: String,
    /// Generated from the aggregate rather than analysed individually
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl ProvisionalEntry {
    /// Short form of a summarizer record
    pub fn from_record(source_file: impl Into<String>, record: &SummaryRecord) -> Self {
        Self {
            source_file: source_file.into(),
            digest_type: record.theme.clone(),
            keywords: record.keywords.clone(),
            narrative: record.narrative.short.clone(),
            reflection: record.reflection.short.clone(),
            degraded: false,
        }
    }

    /// Stand-in derived from the aggregate fields of a draft
    pub fn degraded_from(source_file: &str, draft: &DraftAggregate) -> Self {
        let fields = &draft.fields;
        Self {
            source_file: source_file.to_string(),
            digest_type: fields.digest_type.clone(),
            keywords: fields.keywords.clone(),
            narrative: summary::truncate_chars(&fields.narrative, targets::NARRATIVE_SHORT),
            reflection: summary::truncate_chars(&fields.reflection, targets::REFLECTION_SHORT),
            degraded: true,
        }
    }

    fn has_placeholder(&self) -> bool {
        summary::is_placeholder(&self.digest_type)
            || summary::is_placeholder(&self.narrative)
            || summary::is_placeholder(&self.reflection)
            || self.keywords.iter().any(|k| summary::is_placeholder(k))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionalMetadata {
    pub tier: String,
    /// Identifier of the artifact this queue feeds, e.g. `W0002`
    pub target: String,
    pub target_number: u32,
    pub item_count: usize,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionalDocument {
    pub metadata: ProvisionalMetadata,
    pub items: Vec<ProvisionalEntry>,
}

/// Entries resolved for a promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionalBatch {
    pub items: Vec<ProvisionalEntry>,
    /// Document to delete once the promotion is committed
    pub path: Option<PathBuf>,
    /// Number of generated (degraded) entries
    pub degraded: usize,
}

/// Drop entries whose source reference was already seen; first one wins
pub fn remove_duplicates(items: Vec<ProvisionalEntry>) -> Vec<ProvisionalEntry> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.source_file.clone()))
        .collect()
}

/// File-backed provisional queues for all tiers.
pub struct ProvisionalQueue {
    layout: Layout,
    registry: Arc<TierRegistry>,
}

impl ProvisionalQueue {
    pub fn new(layout: &Layout, registry: Arc<TierRegistry>) -> Self {
        Self {
            layout: layout.clone(),
            registry,
        }
    }

    fn document_path(&self, tier: &TierDefinition, target: u32) -> PathBuf {
        self.layout
            .provisional_dir(tier)
            .join(format!("{}_individual.json", tier.format_id(target)))
    }

    /// Number of the artifact the tier's queue currently feeds
    pub fn current_target(&self, tier: &TierDefinition) -> Result<u32> {
        ArtifactStore::new(&self.layout).next_number(tier)
    }

    /// Entries queued for the tier's next artifact
    pub fn pending(&self, tier: &str) -> Result<Vec<ProvisionalEntry>> {
        let def = self.registry.resolve(tier)?;
        let path = self.document_path(def, self.current_target(def)?);
        Ok(store::load::<ProvisionalDocument>(&path)?
            .map(|doc| remove_duplicates(doc.items))
            .unwrap_or_default())
    }

    /// Queue short-form entries for the tier's next artifact.
    ///
    /// Returns the document path and the number of entries actually added.
    pub fn append(&self, tier: &str, items: &[ProvisionalEntry]) -> Result<(PathBuf, usize)> {
        let def = self.registry.resolve(tier)?;
        let prefix = self.registry.source_prefix(tier)?;

        for item in items {
            if codec::number_with_prefix(&item.source_file, prefix).is_none() {
                return Err(Error::validation(format!(
                    "provisional entry for {} does not reference a {} item: '{}'",
                    tier, prefix, item.source_file
                )));
            }
            if item.has_placeholder() {
                return Err(Error::validation(format!(
                    "provisional entry for {} still contains a placeholder",
                    item.source_file
                )));
            }
        }

        let target = self.current_target(def)?;
        let path = self.document_path(def, target);
        let existing = match store::load::<ProvisionalDocument>(&path)? {
            Some(doc) => doc.items,
            None => Vec::new(),
        };
        let before = existing.len();

        let mut merged = existing;
        merged.extend(items.iter().cloned());
        let merged = remove_duplicates(merged);
        let added = merged.len() - before.min(merged.len());

        let doc = ProvisionalDocument {
            metadata: ProvisionalMetadata {
                tier: def.name.clone(),
                target: def.format_id(target),
                target_number: target,
                item_count: merged.len(),
                updated_at: Utc::now(),
            },
            items: merged,
        };
        if added > 0 {
            store::save(&path, &doc, WritePolicy::Replace)?;
            tracing::debug!(
                "Queued {} provisional entr{} for {}",
                added,
                if added == 1 { "y" } else { "ies" },
                doc.metadata.target
            );
        }

        Ok((path, added))
    }
}

impl ProvisionalStore for ProvisionalQueue {
    fn load_or_generate(
        &self,
        tier: &TierDefinition,
        draft: &DraftAggregate,
        target: u32,
    ) -> Result<ProvisionalBatch> {
        let path = self.document_path(tier, target);

        let Some(doc) = store::load::<ProvisionalDocument>(&path)? else {
            let items: Vec<ProvisionalEntry> = draft
                .source_files
                .iter()
                .map(|source| ProvisionalEntry::degraded_from(source, draft))
                .collect();
            tracing::warn!(
                "No provisional entries for {}; generated {} degraded entries from the aggregate",
                tier.format_id(target),
                items.len()
            );
            return Ok(ProvisionalBatch {
                degraded: items.len(),
                items,
                path: None,
            });
        };

        if doc.metadata.tier != tier.name {
            return Err(Error::validation(format!(
                "{} belongs to tier {}, expected {}",
                path.display(),
                doc.metadata.tier,
                tier.name
            )));
        }

        let mut items = remove_duplicates(doc.items);
        let covered: HashSet<String> = items.iter().map(|i| i.source_file.clone()).collect();
        let mut degraded = 0;
        for source in &draft.source_files {
            if !covered.contains(source) {
                items.push(ProvisionalEntry::degraded_from(source, draft));
                degraded += 1;
            }
        }
        if degraded > 0 {
            tracing::warn!(
                "{} source(s) of {} had no provisional entry; generated from the aggregate",
                degraded,
                tier.format_id(target)
            );
        }

        Ok(ProvisionalBatch {
            items,
            path: Some(path),
            degraded,
        })
    }

    fn path_for(&self, tier: &TierDefinition, target: u32) -> PathBuf {
        self.document_path(tier, target)
    }

    fn discard(&self, path: &Path) -> Result<bool> {
        store::remove(path)
    }
}
