//! Interactive confirmation on the terminal.

use strata_core::{Confirm, ProposedAction};

/// Asks on stdin/stderr before an overwrite or a gapped promotion.
///
/// A prompt that cannot be shown (no terminal) counts as a refusal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConfirm {
    /// Answer preselected in the prompt
    pub default: bool,
}

impl TerminalConfirm {
    pub fn new(default: bool) -> Self {
        Self { default }
    }
}

impl Confirm for TerminalConfirm {
    fn confirm(&self, action: &ProposedAction) -> bool {
        match dialoguer::Confirm::new()
            .with_prompt(action.describe())
            .default(self.default)
            .interact()
        {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!("Cannot prompt for confirmation ({}); declining", e);
                false
            }
        }
    }
}
