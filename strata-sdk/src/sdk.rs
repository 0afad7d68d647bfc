//! Main SDK Entry Point
//!
//! Provides the main SDK struct that ties together all components.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use strata_core::artifact::ArtifactStore;
use strata_core::index::IndexEntry;
use strata_core::layout::{self, Layout};
use strata_core::provisional::ProvisionalEntry;
use strata_core::staging::{AppendOutcome, DraftStateView};
use strata_core::{
    CascadeEngine, Confirm, ConfirmedIndex, DraftState, EngineComponents, FinalizeOutcome,
    ProvisionalQueue, StagingBuffer, SummaryRecord, TierRegistry, TrackingState,
};

use crate::{SDKConfig, SDKError, SDKResult};

/// What [`SDK::ingest`] changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Draft fields replaced by the record's long form
    pub merged_fields: Vec<&'static str>,
    /// Provisional document the short form went to
    pub provisional: Option<PathBuf>,
    pub state: DraftState,
}

/// Staged count against the advisory threshold of one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierReadiness {
    pub tier: String,
    pub staged: usize,
    pub threshold: usize,
    pub state: DraftState,
    pub threshold_met: bool,
}

impl TierReadiness {
    /// Enough items staged and the draft analysed
    pub fn is_ready(&self) -> bool {
        self.threshold_met && self.state == DraftState::Analyzed
    }
}

/// Latest confirmation of one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierOverview {
    pub tier: String,
    pub directory: PathBuf,
    pub last_processed_number: Option<u32>,
    pub confirmed: IndexEntry,
}

/// Strata SDK - Main entry point
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use strata_sdk::{AlwaysConfirm, SDK, SDKConfig};
///
/// fn example() -> strata_sdk::SDKResult<()> {
///     let sdk = SDK::new(SDKConfig::load()?, Arc::new(AlwaysConfirm))?;
///
///     sdk.scan_new_episodes()?;
///     for tier in sdk.readiness()? {
///         if tier.is_ready() {
///             sdk.finalize(&tier.tier, "Weekly review")?;
///         }
///     }
///     Ok(())
/// }
/// ```
pub struct SDK {
    config: SDKConfig,
    registry: Arc<TierRegistry>,
    layout: Layout,
    staging: Arc<StagingBuffer>,
    provisional: Arc<ProvisionalQueue>,
    index: Arc<ConfirmedIndex>,
    tracking: Arc<TrackingState>,
    engine: CascadeEngine,
}

impl SDK {
    /// Create a new SDK instance
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn new(config: SDKConfig, confirm: Arc<dyn Confirm>) -> SDKResult<Self> {
        config.validate()?;

        let registry = Arc::new(TierRegistry::from_config(&config.engine)?);
        let layout = Layout::from_config(&config.engine);

        let staging = Arc::new(StagingBuffer::new(
            &layout,
            registry.clone(),
            config.engine.placeholders.clone(),
        ));
        let provisional = Arc::new(ProvisionalQueue::new(&layout, registry.clone()));
        let index = Arc::new(ConfirmedIndex::new(&layout, registry.clone()));
        let tracking = Arc::new(TrackingState::new(&layout, registry.clone()));

        let engine = CascadeEngine::new(
            registry.clone(),
            EngineComponents {
                staging: staging.clone(),
                provisional: provisional.clone(),
                index: index.clone(),
                tracking: tracking.clone(),
                artifacts: Arc::new(ArtifactStore::new(&layout)),
            },
            confirm,
        );

        tracing::debug!(
            "Strata SDK over {} ({} tiers)",
            layout.base_dir.display(),
            registry.len()
        );

        Ok(Self {
            config,
            registry,
            layout,
            staging,
            provisional,
            index,
            tracking,
            engine,
        })
    }

    /// Get the SDK configuration
    pub fn config(&self) -> &SDKConfig {
        &self.config
    }

    /// Get the tier registry
    pub fn registry(&self) -> &TierRegistry {
        &self.registry
    }

    /// Stage source references on a tier
    pub fn append_sources(&self, tier: &str, records: &[String]) -> SDKResult<AppendOutcome> {
        Ok(self.staging.append_sources(tier, records)?)
    }

    /// Current draft of a tier
    pub fn draft_state(&self, tier: &str) -> SDKResult<DraftStateView> {
        Ok(self.staging.draft_state(tier)?)
    }

    /// Promote a tier's analysed draft
    pub fn finalize(&self, tier: &str, title: &str) -> SDKResult<FinalizeOutcome> {
        Ok(self.engine.finalize(tier, title)?)
    }

    /// Replay follow-ups of the tier's last promotion
    pub fn resume(&self, tier: &str) -> SDKResult<FinalizeOutcome> {
        Ok(self.engine.resume(tier)?)
    }

    /// Advisory promotion threshold of a tier
    pub fn threshold(&self, tier: &str) -> SDKResult<usize> {
        Ok(self.registry.resolve(tier)?.threshold)
    }

    /// Directory holding a tier's confirmed artifacts
    pub fn tier_directory(&self, tier: &str) -> SDKResult<PathBuf> {
        Ok(self.layout.tier_dir(self.registry.resolve(tier)?))
    }

    /// Apply a summarizer record to a tier.
    ///
    /// The long form is merged into the draft. With a `source_file`, the short
    /// form is also queued as that item's provisional entry.
    pub fn ingest(
        &self,
        tier: &str,
        record: &SummaryRecord,
        source_file: Option<&str>,
    ) -> SDKResult<IngestOutcome> {
        record.validate()?;

        if let Some(source) = source_file {
            let staged = self.staging.draft(tier)?.source_files;
            if !staged.iter().any(|s| s == source) {
                return Err(SDKError::not_found(format!("staged source of {}", tier), source));
            }
        }

        let merged_fields = self.staging.merge_summary(tier, &record.long_form())?;
        let provisional = match source_file {
            Some(source) => {
                let entry = ProvisionalEntry::from_record(source, record);
                Some(self.provisional.append(tier, &[entry])?.0)
            }
            None => None,
        };

        Ok(IngestOutcome {
            merged_fields,
            provisional,
            state: self.staging.draft(tier)?.state(),
        })
    }

    /// Stage episode records that arrived since the bottom tier was last promoted
    pub fn scan_new_episodes(&self) -> SDKResult<AppendOutcome> {
        let bottom = self
            .registry
            .bottom()
            .ok_or_else(|| SDKError::invalid_operation("no tiers configured"))?;

        let files = layout::list_file_names(&self.layout.episodes_dir)?;
        let fresh = self.tracking.new_since_last(&bottom.name, &files)?;
        let staged = self.staging.draft(&bottom.name)?.source_files;
        let new: Vec<String> = fresh.into_iter().filter(|f| !staged.contains(f)).collect();

        if !new.is_empty() {
            tracing::info!("Found {} new episode(s) for {}", new.len(), bottom.name);
        }
        Ok(self.staging.append_sources(&bottom.name, &new)?)
    }

    /// Staged count against threshold for every tier
    pub fn readiness(&self) -> SDKResult<Vec<TierReadiness>> {
        let doc = self.staging.load()?;
        Ok(self
            .registry
            .iter()
            .map(|tier| {
                let (staged, state) = doc
                    .tiers
                    .get(&tier.name)
                    .map(|d| (d.source_files.len(), d.state()))
                    .unwrap_or((0, DraftState::Empty));
                TierReadiness {
                    tier: tier.name.clone(),
                    staged,
                    threshold: tier.threshold,
                    state,
                    threshold_met: staged >= tier.threshold,
                }
            })
            .collect())
    }

    /// Confirmed index and tracking for every tier
    pub fn overview(&self) -> SDKResult<Vec<TierOverview>> {
        let mut index = self.index.load_or_create()?;
        let mut tracking = self.tracking.load()?;
        Ok(self
            .registry
            .iter()
            .map(|tier| TierOverview {
                tier: tier.name.clone(),
                directory: self.layout.tier_dir(tier),
                last_processed_number: tracking
                    .tiers
                    .remove(&tier.name)
                    .and_then(|t| t.last_processed_number),
                confirmed: index.tiers.remove(&tier.name).unwrap_or_default(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::summary::TextPair;
    use strata_core::{AlwaysConfirm, StrataConfig};
    use tempfile::tempdir;

    fn sdk(home: &std::path::Path) -> SDK {
        let config = SDKConfig::new(home).with_engine(StrataConfig::default().with_threshold("weekly", 3));
        SDK::new(config, Arc::new(AlwaysConfirm)).unwrap()
    }

    fn write_episodes(sdk: &SDK, numbers: std::ops::RangeInclusive<u32>) {
        let dir = &sdk.layout.episodes_dir;
        std::fs::create_dir_all(dir).unwrap();
        for n in numbers {
            std::fs::write(dir.join(format!("L{:05}_log.txt", n)), "episode").unwrap();
        }
    }

    fn record(theme: &str) -> SummaryRecord {
        SummaryRecord {
            theme: theme.into(),
            keywords: vec!["loop".into()],
            narrative: TextPair {
                long: format!("Everything about {}", theme),
                short: format!("{} in brief", theme),
            },
            reflection: TextPair {
                long: "Long thoughts.".into(),
                short: "Short thoughts.".into(),
            },
        }
    }

    #[test]
    fn test_threshold_and_directory() {
        let dir = tempdir().unwrap();
        let sdk = sdk(dir.path());

        assert_eq!(sdk.threshold("weekly").unwrap(), 3);
        assert_eq!(sdk.threshold("quarterly").unwrap(), 3);
        assert!(sdk.threshold("hourly").unwrap_err().is_validation());
        assert_eq!(
            sdk.tier_directory("annual").unwrap(),
            dir.path().join("strata-data/digests/4_annual")
        );
    }

    #[test]
    fn test_scan_new_episodes() {
        let dir = tempdir().unwrap();
        let sdk = sdk(dir.path());
        write_episodes(&sdk, 1..=3);

        let outcome = sdk.scan_new_episodes().unwrap();
        assert_eq!(outcome.added.len(), 3);
        assert!(sdk.scan_new_episodes().unwrap().added.is_empty());

        write_episodes(&sdk, 4..=4);
        assert_eq!(sdk.scan_new_episodes().unwrap().added, vec!["L00004_log.txt"]);
    }

    #[test]
    fn test_full_cycle() {
        let dir = tempdir().unwrap();
        let sdk = sdk(dir.path());
        write_episodes(&sdk, 1..=3);
        sdk.scan_new_episodes().unwrap();

        let weekly = &sdk.readiness().unwrap()[0];
        assert!(weekly.threshold_met);
        assert!(!weekly.is_ready());

        for n in 1..=3 {
            let source = format!("L{:05}_log.txt", n);
            let outcome = sdk
                .ingest("weekly", &record(&format!("day {}", n)), Some(&source))
                .unwrap();
            assert!(outcome.provisional.is_some());
            assert_eq!(outcome.state, DraftState::Analyzed);
        }
        sdk.ingest("weekly", &record("the week"), None).unwrap();
        assert!(sdk.readiness().unwrap()[0].is_ready());

        let outcome = sdk.finalize("weekly", "Week one").unwrap();
        assert!(outcome.is_complete());
        assert_eq!(outcome.artifact.metadata.degraded_items, 0);
        assert_eq!(outcome.artifact.individual[2].narrative, "day 3 in brief");
        assert_eq!(outcome.artifact.aggregate.fields.digest_type, "the week");

        let overview = sdk.overview().unwrap();
        assert_eq!(overview[0].confirmed.artifact.as_deref(), Some("W0001_Week_one.json"));
        assert_eq!(overview[0].last_processed_number, Some(3));
        assert!(overview[1].confirmed.is_empty());

        let monthly = sdk.draft_state("monthly").unwrap();
        assert_eq!(monthly.source_files, vec!["W0001_Week_one.json"]);
        assert!(!monthly.analyzed);

        // Finalized episodes are not picked up again.
        assert!(sdk.scan_new_episodes().unwrap().added.is_empty());
    }

    #[test]
    fn test_ingest_requires_staged_source() {
        let dir = tempdir().unwrap();
        let sdk = sdk(dir.path());
        sdk.append_sources("weekly", &["L00001".to_string()]).unwrap();

        let err = sdk.ingest("weekly", &record("x"), Some("L00002")).unwrap_err();
        assert!(err.is_not_found());

        let mut bad = record("x");
        bad.narrative.long = String::new();
        assert!(sdk.ingest("weekly", &bad, None).unwrap_err().is_validation());
        assert!(!sdk.draft_state("weekly").unwrap().analyzed);
    }
}
