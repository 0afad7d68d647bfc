//! Narrow interfaces the cascade engine depends on.
//!
//! The file-backed components implement these; tests substitute fakes to
//! inject failures at individual steps.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::artifact::ConfirmedArtifact;
use crate::error::Result;
use crate::index::{IndexEntry, IndexUpdate};
use crate::provisional::ProvisionalBatch;
use crate::staging::{AppendOutcome, DraftAggregate};
use crate::store::{SaveOutcome, WritePolicy};
use crate::tier::TierDefinition;

/// Staging buffer operations used during promotion.
pub trait StagingStore: Send + Sync {
    /// Add source references to a tier's draft.
    fn append_sources(&self, tier: &str, records: &[String]) -> Result<AppendOutcome>;

    /// Read-only copy of a tier's draft.
    fn promote_to_confirmed(&self, tier: &str) -> Result<DraftAggregate>;

    /// Reset a tier's draft to empty.
    fn clear(&self, tier: &str) -> Result<()>;
}

/// Provisional queue operations used during promotion.
pub trait ProvisionalStore: Send + Sync {
    /// Load the queue for `target`, or generate degraded entries from the draft.
    fn load_or_generate(
        &self,
        tier: &TierDefinition,
        draft: &DraftAggregate,
        target: u32,
    ) -> Result<ProvisionalBatch>;

    /// Where the queue for `target` is stored.
    fn path_for(&self, tier: &TierDefinition, target: u32) -> PathBuf;

    /// Delete a consumed queue document.
    fn discard(&self, path: &Path) -> Result<bool>;
}

/// Confirmed index operations.
pub trait IndexStore: Send + Sync {
    /// Replace one tier's entry.
    fn update_tier(&self, tier: &str, update: IndexUpdate) -> Result<()>;

    /// Current entry of one tier.
    fn entry(&self, tier: &str) -> Result<IndexEntry>;
}

/// Tracking state updates.
pub trait TrackingStore: Send + Sync {
    /// Record a successful promotion.
    fn record_promotion(&self, tier: &str, last_number: u32, at: DateTime<Utc>) -> Result<()>;
}

/// Confirmed artifact persistence.
pub trait ArtifactSink: Send + Sync {
    /// Next unused sequence number for a tier.
    fn next_number(&self, tier: &TierDefinition) -> Result<u32>;

    /// Path an artifact with this number and title is written to.
    fn path_for(&self, tier: &TierDefinition, number: u32, title: &str) -> PathBuf;

    /// Path of an artifact recorded in the index by file name.
    fn locate(&self, tier: &TierDefinition, file_name: &str) -> PathBuf;

    /// Persist an artifact.
    fn write(
        &self,
        path: &Path,
        artifact: &ConfirmedArtifact,
        policy: WritePolicy<'_>,
    ) -> Result<SaveOutcome>;

    /// Load a previously written artifact.
    fn read(&self, path: &Path) -> Result<ConfirmedArtifact>;

    /// Delete an artifact that was never committed to the index.
    fn remove(&self, path: &Path) -> Result<bool>;
}
