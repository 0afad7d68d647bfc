//! strata-core - Core library for Strata
//!
//! Tiered digest cascade: source items are staged per tier, summarised by an
//! external analyser, promoted into confirmed artifacts, and the artifacts are
//! staged into the next tier up (weekly → monthly → … → centurial).
//!
//! - **tier**: tier registry and sequence identifier codec
//! - **store**: JSON documents with template bootstrap and atomic writes
//! - **staging**: per-tier draft aggregates (Empty → Pending → Analyzed)
//! - **provisional**: per-item short-form summaries awaiting promotion
//! - **index**: latest confirmed aggregate per tier
//! - **tracking**: last promoted sequence number per tier
//! - **engine**: finalize and cascade

pub mod artifact;
pub mod config;
pub mod confirm;
pub mod engine;
pub mod error;
pub mod index;
pub mod layout;
pub mod provisional;
pub mod staging;
pub mod store;
pub mod summary;
pub mod tier;
pub mod tracking;
pub mod traits;
pub mod utils;

// Re-export commonly used types
pub use artifact::{ArtifactStore, ConfirmedArtifact};
pub use config::StrataConfig;
pub use confirm::{AlwaysConfirm, Confirm, NeverConfirm, ProposedAction};
pub use engine::{CascadeEngine, EngineComponents, FinalizeOutcome};
pub use error::{Error, Result};
pub use index::ConfirmedIndex;
pub use layout::Layout;
pub use provisional::ProvisionalQueue;
pub use staging::{DraftState, StagingBuffer};
pub use summary::{SummaryFields, SummaryRecord};
pub use tier::{TierDefinition, TierRegistry};
pub use tracking::TrackingState;
