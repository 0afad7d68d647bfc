//! Caller confirmation for actions that need a human (or policy) decision.
//!
//! The engine never prompts on its own. It describes the action as a
//! [`ProposedAction`] and asks the injected [`Confirm`] strategy.

use std::path::PathBuf;

use crate::tier::codec::{self, Gap};

/// An action awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposedAction {
    /// Replace an existing document whose content differs
    Overwrite { path: PathBuf },
    /// Promote a tier whose source numbers skip some values
    ContinueWithGaps {
        tier: String,
        sources: Vec<String>,
        missing: Vec<Gap>,
    },
}

impl ProposedAction {
    /// One-line description suitable for a prompt
    pub fn describe(&self) -> String {
        match self {
            Self::Overwrite { path } => {
                format!("{} already exists with different content. Overwrite?", path.display())
            }
            Self::ContinueWithGaps { tier, missing, .. } => format!(
                "Tier {} skips sequence numbers {}. Continue anyway?",
                tier,
                codec::describe_gaps(missing)
            ),
        }
    }
}

/// Strategy deciding whether a proposed action may proceed.
pub trait Confirm: Send + Sync {
    fn confirm(&self, action: &ProposedAction) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&ProposedAction) -> bool + Send + Sync,
{
    fn confirm(&self, action: &ProposedAction) -> bool {
        self(action)
    }
}

/// Approves everything. Equivalent to a force flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _action: &ProposedAction) -> bool {
        true
    }
}

/// Declines everything. Useful for unattended runs that must never overwrite.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

impl Confirm for NeverConfirm {
    fn confirm(&self, action: &ProposedAction) -> bool {
        tracing::warn!("Declined without prompting: {}", action.describe());
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_strategy() {
        let only_gaps = |action: &ProposedAction| matches!(action, ProposedAction::ContinueWithGaps { .. });
        let gaps = ProposedAction::ContinueWithGaps {
            tier: "monthly".into(),
            sources: vec!["W0001".into(), "W0003".into()],
            missing: vec![Gap { first: 2, last: 2 }],
        };
        let overwrite = ProposedAction::Overwrite {
            path: PathBuf::from("W0001_x.json"),
        };

        assert!(only_gaps.confirm(&gaps));
        assert!(!only_gaps.confirm(&overwrite));
        assert!(AlwaysConfirm.confirm(&overwrite));
        assert!(!NeverConfirm.confirm(&gaps));
    }

    #[test]
    fn test_describe() {
        let gaps = ProposedAction::ContinueWithGaps {
            tier: "monthly".into(),
            sources: vec![],
            missing: vec![Gap { first: 2, last: 3 }, Gap { first: 7, last: 7 }],
        };
        assert!(gaps.describe().contains("2-3, 7 (3 missing)"));
        assert!(gaps.describe().contains("monthly"));
    }
}
