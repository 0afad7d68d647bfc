//! Cascade engine: promotes a tier's draft into a confirmed artifact and
//! feeds the result into the next tier.
//!
//! A promotion has a critical section and a set of follow-ups:
//!
//! ```text
//! validate ─▶ number ─▶ provisional ─▶ artifact ─▶ write ─▶ index    (abort on error)
//!                                                            │
//!            cascade ◀──────────────────────────────────────┘
//!            clear staging, record tracking, discard provisional  (logged, collected)
//! ```
//!
//! Once the index points at the new artifact the promotion is committed.
//! Follow-up failures are reported in [`FinalizeOutcome::followup_errors`]
//! and can be replayed with [`CascadeEngine::resume`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;

use crate::artifact::{ArtifactStore, ConfirmedArtifact};
use crate::config::StrataConfig;
use crate::confirm::{Confirm, ProposedAction};
use crate::error::{Error, Result};
use crate::index::{ConfirmedIndex, IndexUpdate};
use crate::layout::Layout;
use crate::provisional::ProvisionalQueue;
use crate::staging::{DraftAggregate, StagingBuffer};
use crate::store::WritePolicy;
use crate::tier::{TierDefinition, TierRegistry, codec};
use crate::tracking::TrackingState;
use crate::traits::{ArtifactSink, IndexStore, ProvisionalStore, StagingStore, TrackingStore};

/// Components the engine drives.
#[derive(Clone)]
pub struct EngineComponents {
    pub staging: Arc<dyn StagingStore>,
    pub provisional: Arc<dyn ProvisionalStore>,
    pub index: Arc<dyn IndexStore>,
    pub tracking: Arc<dyn TrackingStore>,
    pub artifacts: Arc<dyn ArtifactSink>,
}

impl EngineComponents {
    /// File-backed components rooted at the configured layout
    pub fn files(config: &StrataConfig, registry: Arc<TierRegistry>) -> Self {
        let layout = Layout::from_config(config);
        Self {
            staging: Arc::new(StagingBuffer::new(
                &layout,
                registry.clone(),
                config.placeholders.clone(),
            )),
            provisional: Arc::new(ProvisionalQueue::new(&layout, registry.clone())),
            index: Arc::new(ConfirmedIndex::new(&layout, registry.clone())),
            tracking: Arc::new(TrackingState::new(&layout, registry)),
            artifacts: Arc::new(ArtifactStore::new(&layout)),
        }
    }
}

/// Result of a promotion (or of replaying its follow-ups).
#[derive(Debug, Clone)]
pub struct FinalizeOutcome {
    pub artifact: ConfirmedArtifact,
    pub path: PathBuf,
    pub content_hash: String,
    /// Tier the artifact was staged into, if any
    pub cascaded_to: Option<String>,
    /// Post-commit steps that failed
    pub followup_errors: Vec<String>,
}

impl FinalizeOutcome {
    /// Whether every follow-up step succeeded
    pub fn is_complete(&self) -> bool {
        self.followup_errors.is_empty()
    }
}

/// Tier promotion engine.
pub struct CascadeEngine {
    registry: Arc<TierRegistry>,
    components: EngineComponents,
    confirm: Arc<dyn Confirm>,
}

impl CascadeEngine {
    pub fn new(
        registry: Arc<TierRegistry>,
        components: EngineComponents,
        confirm: Arc<dyn Confirm>,
    ) -> Self {
        Self {
            registry,
            components,
            confirm,
        }
    }

    /// Engine over file-backed components
    pub fn with_files(config: &StrataConfig, confirm: Arc<dyn Confirm>) -> Result<Self> {
        let registry = Arc::new(TierRegistry::from_config(config)?);
        let components = EngineComponents::files(config, registry.clone());
        Ok(Self::new(registry, components, confirm))
    }

    pub fn registry(&self) -> &TierRegistry {
        &self.registry
    }

    /// Promote a tier's analysed draft into a confirmed artifact.
    pub fn finalize(&self, tier: &str, title: &str) -> Result<FinalizeOutcome> {
        let def = self.registry.resolve(tier)?.clone();
        let draft = self.components.staging.promote_to_confirmed(tier)?;
        self.validate(&def, &draft, title)?;

        // 1. Sequence number and provisional entries
        let number = self.components.artifacts.next_number(&def)?;
        let batch = self
            .components
            .provisional
            .load_or_generate(&def, &draft, number)?;

        // 2. Build the artifact
        let artifact = ConfirmedArtifact::new(&def, number, title, draft, batch.items);

        // 3-4. Persist it, asking before replacing a different document
        let path = self.components.artifacts.path_for(&def, number, title);
        let saved = self.components.artifacts.write(
            &path,
            &artifact,
            WritePolicy::Confirm(self.confirm.as_ref()),
        )?;
        let file_name = artifact_file_name(&path)?;

        // 5. Index update commits the promotion
        let committed = self.components.index.update_tier(
            tier,
            IndexUpdate {
                artifact: file_name.clone(),
                content_hash: saved.content_hash.clone(),
                confirmed_at: artifact.metadata.created_at,
                source_count: artifact.metadata.source_count,
                fields: artifact.aggregate.fields.clone(),
            },
        );
        if let Err(e) = committed {
            // A file this call created must not hold its sequence number.
            if !saved.replaced && !saved.unchanged {
                if let Err(cleanup) = self.components.artifacts.remove(&path) {
                    tracing::warn!(
                        "Could not remove uncommitted {}: {}",
                        path.display(),
                        cleanup
                    );
                }
            }
            return Err(e);
        }

        tracing::info!(
            "Confirmed {} \"{}\" from {} source(s){}",
            artifact.metadata.id,
            artifact.metadata.title,
            artifact.metadata.source_count,
            if batch.degraded > 0 {
                format!(", {} degraded", batch.degraded)
            } else {
                String::new()
            }
        );

        // 6-9. Follow-ups
        let (cascaded_to, followup_errors) =
            self.complete(&def, &artifact, &file_name, true, batch.path.as_deref());

        Ok(FinalizeOutcome {
            artifact,
            path,
            content_hash: saved.content_hash,
            cascaded_to,
            followup_errors,
        })
    }

    /// Replay the follow-up steps of the tier's last confirmed promotion.
    ///
    /// Safe to run any number of times: the cascade is deduplicated, staging
    /// is only cleared when it holds nothing but the artifact's sources, and
    /// a missing provisional document is not an error.
    pub fn resume(&self, tier: &str) -> Result<FinalizeOutcome> {
        let def = self.registry.resolve(tier)?.clone();
        let entry = self.components.index.entry(tier)?;
        let Some(file_name) = entry.artifact else {
            return Err(Error::validation(format!(
                "tier {} has no confirmed artifact to resume",
                tier
            )));
        };

        let path = self.components.artifacts.locate(&def, &file_name);
        let artifact = self.components.artifacts.read(&path)?;

        let staged = self.components.staging.promote_to_confirmed(tier)?;
        let clear = !staged.source_files.is_empty()
            && staged
                .source_files
                .iter()
                .all(|f| artifact.aggregate.source_files.contains(f));
        if !clear && !staged.source_files.is_empty() {
            tracing::warn!(
                "Staging for {} holds sources newer than {}; leaving it in place",
                tier,
                artifact.metadata.id
            );
        }

        let provisional = self
            .components
            .provisional
            .path_for(&def, artifact.metadata.number);
        let (cascaded_to, followup_errors) =
            self.complete(&def, &artifact, &file_name, clear, Some(&provisional));

        tracing::info!("Resumed follow-ups of {}", artifact.metadata.id);
        Ok(FinalizeOutcome {
            content_hash: entry.content_hash.unwrap_or_default(),
            artifact,
            path,
            cascaded_to,
            followup_errors,
        })
    }

    /// Checks that must pass before anything is written
    fn validate(&self, def: &TierDefinition, draft: &DraftAggregate, title: &str) -> Result<()> {
        if draft.source_files.is_empty() {
            return Err(Error::validation(format!(
                "tier {} has no staged sources",
                def.name
            )));
        }
        if title.trim().is_empty() {
            return Err(Error::validation("artifact title is blank"));
        }

        let report = codec::analyze(&draft.source_files)
            .map_err(|issue| Error::validation(format!("tier {}: {}", def.name, issue)))?;

        let expected = self.registry.source_prefix(&def.name)?;
        if report.prefix != expected {
            return Err(Error::validation(format!(
                "tier {} consumes {} items, staged sources are {}",
                def.name, expected, report.prefix
            )));
        }

        if !report.duplicates.is_empty() {
            let listed: Vec<String> = report
                .duplicates
                .iter()
                .map(|(n, refs)| format!("{} ({})", n, refs.join(", ")))
                .collect();
            return Err(Error::validation(format!(
                "tier {} stages duplicate sequence numbers: {}",
                def.name,
                listed.join("; ")
            )));
        }

        if !draft.fields.is_analyzed() {
            return Err(Error::validation(format!(
                "tier {} is not analysed yet (placeholders in {})",
                def.name,
                draft.fields.placeholder_fields().join(", ")
            )));
        }

        if report.has_gaps() {
            let described = codec::describe_gaps(&report.gaps);
            tracing::warn!("Tier {} skips sequence numbers {}", def.name, described);
            let action = ProposedAction::ContinueWithGaps {
                tier: def.name.clone(),
                sources: draft.source_files.clone(),
                missing: report.gaps.clone(),
            };
            if !self.confirm.confirm(&action) {
                return Err(Error::validation(format!(
                    "promotion of {} declined: sequence gaps {}",
                    def.name, described
                )));
            }
        }

        Ok(())
    }

    /// Post-commit steps. Each failure is logged and collected.
    fn complete(
        &self,
        def: &TierDefinition,
        artifact: &ConfirmedArtifact,
        file_name: &str,
        clear: bool,
        provisional: Option<&Path>,
    ) -> (Option<String>, Vec<String>) {
        let mut errors = Vec::new();
        let mut cascaded_to = None;

        // 6. Stage the artifact in the next tier
        match self.registry.cascade_target(&def.name) {
            Ok(Some(next)) => {
                match self
                    .components
                    .staging
                    .append_sources(&next.name, &[file_name.to_string()])
                {
                    Ok(outcome) => {
                        tracing::info!(
                            "Cascaded {} into {} ({} staged)",
                            artifact.metadata.id,
                            next.name,
                            outcome.state
                        );
                        cascaded_to = Some(next.name.clone());
                    }
                    Err(e) => errors.push(format!("Cascade into {} failed: {}", next.name, e)),
                }
            }
            Ok(None) => tracing::debug!("{} is the top tier; nothing to cascade", def.name),
            Err(e) => errors.push(format!("Cascade target lookup failed: {}", e)),
        }

        // 7. Clear the promoted draft
        if clear {
            if let Err(e) = self.components.staging.clear(&def.name) {
                errors.push(format!("Clearing {} staging failed: {}", def.name, e));
            }
        }

        // 8. Record what was consumed
        if let Some(last) = artifact.last_source_number() {
            if let Err(e) = self
                .components
                .tracking
                .record_promotion(&def.name, last, Utc::now())
            {
                errors.push(format!("Tracking update for {} failed: {}", def.name, e));
            }
        }

        // 9. Drop the consumed provisional queue
        if let Some(path) = provisional {
            if let Err(e) = self.components.provisional.discard(path) {
                errors.push(format!(
                    "Removing provisional {} failed: {}",
                    path.display(),
                    e
                ));
            }
        }

        for error in &errors {
            tracing::warn!("{}", error);
        }
        (cascaded_to, errors)
    }
}

fn artifact_file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::validation(format!("{} has no file name", path.display())))
}
