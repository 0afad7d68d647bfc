//! Staging buffer: the in-progress draft aggregate of every tier.
//!
//! ```text
//!            append_sources                 merge_summary (all fields real)
//!   Empty ─────────────────▶ Pending ───────────────────────────▶ Analyzed
//!     ▲                        │  ▲                                  │
//!     │                        │  └──── append_sources (kept) ◀──────┤
//!     └──────────────── clear (after finalize) ◀─────────────────────┘
//! ```
//!
//! All tiers live in one document owned by [`StagingBuffer`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::PlaceholderBudget;
use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::store::{self, WritePolicy};
use crate::summary::SummaryFields;
use crate::tier::{TierRegistry, codec};
use crate::traits::StagingStore;

/// Lifecycle state of a tier's draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftState {
    Empty,
    Pending,
    Analyzed,
}

impl DraftState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Pending => "pending",
            Self::Analyzed => "analyzed",
        }
    }
}

impl std::fmt::Display for DraftState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Not-yet-confirmed aggregate of one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftAggregate {
    /// Staged source references, in arrival order
    pub source_files: Vec<String>,
    /// Aggregate summary (real or placeholder)
    #[serde(flatten)]
    pub fields: SummaryFields,
}

impl DraftAggregate {
    /// A draft with no sources and fresh placeholders
    pub fn empty(budget: &PlaceholderBudget) -> Self {
        Self {
            source_files: Vec::new(),
            fields: SummaryFields::pending(0, budget),
        }
    }

    pub fn state(&self) -> DraftState {
        if self.source_files.is_empty() {
            DraftState::Empty
        } else if self.fields.is_analyzed() {
            DraftState::Analyzed
        } else {
            DraftState::Pending
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingMetadata {
    pub last_updated: Option<DateTime<Utc>>,
}

/// The staging document: one draft per tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingDocument {
    #[serde(default)]
    pub metadata: StagingMetadata,
    pub tiers: BTreeMap<String, DraftAggregate>,
}

impl StagingDocument {
    /// Every registered tier present and empty
    pub fn template(registry: &TierRegistry, budget: &PlaceholderBudget) -> Self {
        Self {
            metadata: StagingMetadata::default(),
            tiers: registry
                .all_tier_names()
                .into_iter()
                .map(|name| (name.to_string(), DraftAggregate::empty(budget)))
                .collect(),
        }
    }
}

/// What a caller sees when deciding whether (re-)analysis is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftStateView {
    pub tier: String,
    pub state: DraftState,
    pub source_files: Vec<String>,
    pub analyzed: bool,
    pub placeholder_fields: Vec<&'static str>,
}

/// Result of [`StagingBuffer::append_sources`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendOutcome {
    pub tier: String,
    /// References newly staged
    pub added: Vec<String>,
    /// References that were already staged
    pub already_staged: Vec<String>,
    pub previous: DraftState,
    pub state: DraftState,
    /// New sources joined a draft that already had analysed content
    pub reanalysis_recommended: bool,
}

/// File-backed staging buffer for all tiers.
pub struct StagingBuffer {
    path: PathBuf,
    template: Option<PathBuf>,
    registry: Arc<TierRegistry>,
    budget: PlaceholderBudget,
}

impl StagingBuffer {
    pub fn new(layout: &Layout, registry: Arc<TierRegistry>, budget: PlaceholderBudget) -> Self {
        Self {
            path: layout.staging_path(),
            template: layout.staging_template(),
            registry,
            budget,
        }
    }

    /// Load the staging document, creating it on first use
    pub fn load(&self) -> Result<StagingDocument> {
        let mut doc: StagingDocument =
            store::load_or_create(&self.path, self.template.as_deref(), || {
                StagingDocument::template(&self.registry, &self.budget)
            })?;

        for (name, draft) in &doc.tiers {
            if !self.registry.contains(name) {
                return Err(Error::validation(format!(
                    "{} stages unregistered tier '{}'",
                    self.path.display(),
                    name
                )));
            }
            let mut seen = std::collections::HashSet::new();
            if let Some(dup) = draft.source_files.iter().find(|f| !seen.insert(f.as_str())) {
                return Err(Error::validation(format!(
                    "{}: tier {} stages {} twice",
                    self.path.display(),
                    name,
                    dup
                )));
            }
        }
        for name in self.registry.all_tier_names() {
            doc.tiers
                .entry(name.to_string())
                .or_insert_with(|| DraftAggregate::empty(&self.budget));
        }

        Ok(doc)
    }

    fn save(&self, doc: &mut StagingDocument) -> Result<()> {
        doc.metadata.last_updated = Some(Utc::now());
        store::save(&self.path, doc, WritePolicy::Replace)?;
        Ok(())
    }

    /// A tier's current draft
    pub fn draft(&self, tier: &str) -> Result<DraftAggregate> {
        self.registry.resolve(tier)?;
        let mut doc = self.load()?;
        Ok(doc
            .tiers
            .remove(tier)
            .unwrap_or_else(|| DraftAggregate::empty(&self.budget)))
    }

    /// State of a tier's draft
    pub fn draft_state(&self, tier: &str) -> Result<DraftStateView> {
        let draft = self.draft(tier)?;
        Ok(DraftStateView {
            tier: tier.to_string(),
            state: draft.state(),
            analyzed: draft.fields.is_analyzed(),
            placeholder_fields: draft.fields.placeholder_fields(),
            source_files: draft.source_files,
        })
    }

    /// True iff no summary field holds a placeholder
    pub fn is_analyzed(&self, tier: &str) -> Result<bool> {
        Ok(self.draft(tier)?.fields.is_analyzed())
    }

    /// Stage new source references for a tier
    pub fn append_sources(&self, tier: &str, records: &[String]) -> Result<AppendOutcome> {
        let prefix = self.registry.source_prefix(tier)?;
        let width = self.registry.source_width(tier)?;

        for record in records {
            match codec::parse(record) {
                Some((p, _)) if p == prefix => {
                    if codec::digit_width(record) != Some(width) {
                        return Err(Error::validation(format!(
                            "tier {} stages {}-digit {} references, got '{}'",
                            tier, width, prefix, record
                        )));
                    }
                }
                Some((p, _)) => {
                    return Err(Error::validation(format!(
                        "tier {} stages {} items, got '{}' ({})",
                        tier, prefix, record, p
                    )));
                }
                None => {
                    return Err(Error::validation(format!(
                        "'{}' is not a sequence reference",
                        record
                    )));
                }
            }
        }

        let mut doc = self.load()?;
        let draft = doc
            .tiers
            .entry(tier.to_string())
            .or_insert_with(|| DraftAggregate::empty(&self.budget));
        let previous = draft.state();

        let mut added = Vec::new();
        let mut already_staged = Vec::new();
        for record in records {
            if draft.source_files.contains(record) || added.contains(record) {
                already_staged.push(record.clone());
            } else {
                added.push(record.clone());
            }
        }

        if added.is_empty() {
            return Ok(AppendOutcome {
                tier: tier.to_string(),
                added,
                already_staged,
                previous,
                state: previous,
                reanalysis_recommended: false,
            });
        }

        draft.source_files.extend(added.iter().cloned());
        let total = draft.source_files.len();

        let reanalysis_recommended = match previous {
            DraftState::Empty => {
                draft.fields = SummaryFields::pending(total, &self.budget);
                false
            }
            DraftState::Pending | DraftState::Analyzed => {
                draft.fields.refresh_hints(total, &self.budget);
                let has_real_content = draft.fields.has_real_content();
                if has_real_content {
                    tracing::warn!(
                        "Tier {} gained {} source(s) after analysis; existing summary kept, re-analysis recommended",
                        tier,
                        added.len()
                    );
                }
                has_real_content
            }
        };
        let state = draft.state();

        self.save(&mut doc)?;
        tracing::info!(
            "Staged {} source(s) on {} ({} -> {}, {} total)",
            added.len(),
            tier,
            previous,
            state,
            total
        );

        Ok(AppendOutcome {
            tier: tier.to_string(),
            added,
            already_staged,
            previous,
            state,
            reanalysis_recommended,
        })
    }

    /// Merge an externally produced long-form summary into a tier's draft
    pub fn merge_summary(&self, tier: &str, fields: &SummaryFields) -> Result<Vec<&'static str>> {
        self.registry.resolve(tier)?;
        let mut doc = self.load()?;
        let draft = doc
            .tiers
            .get_mut(tier)
            .ok_or_else(|| Error::UnknownTier(tier.to_string()))?;

        if draft.state() == DraftState::Empty {
            return Err(Error::validation(format!(
                "tier {} has no staged sources to summarize",
                tier
            )));
        }

        let changed = draft.fields.merge(fields);
        let state = draft.state();
        if !changed.is_empty() {
            self.save(&mut doc)?;
            tracing::info!("Merged {:?} into {} draft (now {})", changed, tier, state);
        }
        Ok(changed)
    }

    /// Reset a tier to empty
    pub fn clear(&self, tier: &str) -> Result<()> {
        self.registry.resolve(tier)?;
        let mut doc = self.load()?;
        doc.tiers
            .insert(tier.to_string(), DraftAggregate::empty(&self.budget));
        self.save(&mut doc)?;
        tracing::debug!("Cleared staging for {}", tier);
        Ok(())
    }

    /// Read-only projection of a tier's draft for promotion
    pub fn promote_to_confirmed(&self, tier: &str) -> Result<DraftAggregate> {
        self.draft(tier)
    }
}

impl StagingStore for StagingBuffer {
    fn append_sources(&self, tier: &str, records: &[String]) -> Result<AppendOutcome> {
        StagingBuffer::append_sources(self, tier, records)
    }

    fn promote_to_confirmed(&self, tier: &str) -> Result<DraftAggregate> {
        StagingBuffer::promote_to_confirmed(self, tier)
    }

    fn clear(&self, tier: &str) -> Result<()> {
        StagingBuffer::clear(self, tier)
    }
}
