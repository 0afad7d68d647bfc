//! Tracing setup for binaries and tests embedding the SDK.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::{SDKError, SDKResult};

/// Default filter when `RUST_LOG` does not say otherwise
pub const DEFAULT_DIRECTIVE: &str = "strata=info";

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Install a global subscriber.
///
/// `RUST_LOG` is honoured; `default_directive` is added on top of it.
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing(format: LogFormat, default_directive: &str) -> SDKResult<bool> {
    let directive = default_directive.parse().map_err(|e| {
        SDKError::invalid_operation(format!("bad log directive '{}': {}", default_directive, e))
    })?;
    let filter = EnvFilter::from_default_env().add_directive(directive);

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    };

    Ok(installed.is_ok())
}
