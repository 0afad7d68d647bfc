//! Strata SDK - Entry point for the tiered digest engine
//!
//! Wraps [`strata_core`] behind a single [`SDK`] facade that discovers its
//! configuration, wires the file-backed components together and exposes the
//! operations callers need.
//!
//! # Core Modules (from strata-core)
//!
//! - **tier** - Tier registry and sequence codec
//! - **staging** - Per-tier draft aggregates
//! - **provisional** - Per-item short-form summaries
//! - **index** - Latest confirmed aggregate per tier
//! - **tracking** - Last promoted sequence number per tier
//! - **engine** - Finalize and cascade
//!
//! # SDK Modules
//!
//! - **logging** - `tracing-subscriber` setup
//! - **prompt** - Terminal confirmation (feature `interactive`)
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use strata_sdk::{SDK, SDKConfig, NeverConfirm};
//!
//! fn example() -> strata_sdk::SDKResult<()> {
//!     let sdk = SDK::new(SDKConfig::load()?, Arc::new(NeverConfirm))?;
//!
//!     let staged = sdk.scan_new_episodes()?;
//!     println!("{} new episode(s)", staged.added.len());
//!
//!     Ok(())
//! }
//! ```

// ─────────────────────────────────────────────────────────────────────────────
// Re-export core modules from strata-core
// ─────────────────────────────────────────────────────────────────────────────

/// Tier registry and sequence codec
pub use strata_core::tier;

/// Per-tier draft aggregates
pub use strata_core::staging;

/// Per-item short-form summaries
pub use strata_core::provisional;

/// Latest confirmed aggregate per tier
pub use strata_core::index;

/// Last promoted sequence number per tier
pub use strata_core::tracking;

/// Finalize and cascade
pub use strata_core::engine;

/// Confirmed artifacts
pub use strata_core::artifact;

/// Summary fields, placeholders and summarizer records
pub use strata_core::summary;

/// Confirmation strategies
pub use strata_core::confirm;

/// Engine configuration
pub use strata_core::config as core_config;

/// Error types from core
pub use strata_core::error as core_error;

// ─────────────────────────────────────────────────────────────────────────────
// SDK-specific modules
// ─────────────────────────────────────────────────────────────────────────────

pub mod logging;

#[cfg(feature = "interactive")]
pub mod prompt;

mod config;
mod error;
mod sdk;

// Re-export main SDK types
pub use config::{ConfigValidationError, SDKConfig};
pub use error::{SDKError, SDKResult};
pub use sdk::{IngestOutcome, SDK, TierOverview, TierReadiness};

pub use strata_core::{
    AlwaysConfirm, Confirm, FinalizeOutcome, NeverConfirm, ProposedAction, StrataConfig,
    SummaryRecord,
};

#[cfg(feature = "interactive")]
pub use prompt::TerminalConfirm;
