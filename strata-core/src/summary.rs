//! Summary fields and pending-analysis placeholders.
//!
//! A draft aggregate carries four summary fields. Each one is either real
//! content or a placeholder: a sentinel string containing
//! [`PLACEHOLDER_MARKER`], optionally hinting how many characters the
//! analysis should produce.

use serde::{Deserialize, Serialize};

use crate::config::PlaceholderBudget;
use crate::error::{Error, Result};

/// Marker substring identifying a placeholder value
pub const PLACEHOLDER_MARKER: &str = "<!-- STRATA:PENDING";

/// Approximate length targets for summarizer output, in characters.
pub mod targets {
    pub const THEME: usize = 40;
    pub const NARRATIVE_LONG: usize = 2400;
    pub const NARRATIVE_SHORT: usize = 1200;
    pub const REFLECTION_LONG: usize = 800;
    pub const REFLECTION_SHORT: usize = 400;
}

/// Build a placeholder value
pub fn placeholder(budget_hint: Option<usize>) -> String {
    match budget_hint {
        Some(chars) => format!("{} ~{} chars -->", PLACEHOLDER_MARKER, chars),
        None => format!("{} -->", PLACEHOLDER_MARKER),
    }
}

/// Check whether a value is a placeholder
pub fn is_placeholder(value: &str) -> bool {
    value.contains(PLACEHOLDER_MARKER)
}

/// The aggregate summary of a tier's staged items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryFields {
    /// Short theme label
    pub digest_type: String,
    /// Ordered keywords
    pub keywords: Vec<String>,
    /// Long-form narrative description
    pub narrative: String,
    /// Long-form reflective commentary
    pub reflection: String,
}

impl SummaryFields {
    /// Fresh placeholders sized for `source_count` staged items
    pub fn pending(source_count: usize, budget: &PlaceholderBudget) -> Self {
        let hint = |per_source: usize| (source_count > 0).then(|| per_source * source_count);
        Self {
            digest_type: placeholder(None),
            keywords: vec![placeholder(None); budget.keyword_slots.max(1)],
            narrative: placeholder(hint(budget.narrative_chars_per_source)),
            reflection: placeholder(hint(budget.reflection_chars_per_source)),
        }
    }

    /// True when no field carries a placeholder
    pub fn is_analyzed(&self) -> bool {
        self.placeholder_fields().is_empty()
    }

    /// True when at least one field already holds analysed content
    pub fn has_real_content(&self) -> bool {
        is_real(&self.digest_type)
            || self.keywords.iter().any(|k| is_real(k))
            || is_real(&self.narrative)
            || is_real(&self.reflection)
    }

    /// Names of the fields that still hold placeholders
    pub fn placeholder_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if is_placeholder(&self.digest_type) {
            fields.push("digest_type");
        }
        if self.keywords.iter().any(|k| is_placeholder(k)) {
            fields.push("keywords");
        }
        if is_placeholder(&self.narrative) {
            fields.push("narrative");
        }
        if is_placeholder(&self.reflection) {
            fields.push("reflection");
        }
        fields
    }

    /// Merge real values from `incoming`, returning the names of fields that changed.
    ///
    /// Empty or placeholder values in `incoming` are ignored, so a merge never
    /// turns analysed content back into a placeholder.
    pub fn merge(&mut self, incoming: &SummaryFields) -> Vec<&'static str> {
        let mut changed = Vec::new();

        if is_real(&incoming.digest_type) && self.digest_type != incoming.digest_type {
            self.digest_type = incoming.digest_type.clone();
            changed.push("digest_type");
        }
        if !incoming.keywords.is_empty()
            && incoming.keywords.iter().all(|k| is_real(k))
            && self.keywords != incoming.keywords
        {
            self.keywords = incoming.keywords.clone();
            changed.push("keywords");
        }
        if is_real(&incoming.narrative) && self.narrative != incoming.narrative {
            self.narrative = incoming.narrative.clone();
            changed.push("narrative");
        }
        if is_real(&incoming.reflection) && self.reflection != incoming.reflection {
            self.reflection = incoming.reflection.clone();
            changed.push("reflection");
        }

        changed
    }

    /// Refresh budget hints on fields that are still placeholders
    pub fn refresh_hints(&mut self, source_count: usize, budget: &PlaceholderBudget) {
        let fresh = Self::pending(source_count, budget);
        if is_placeholder(&self.narrative) {
            self.narrative = fresh.narrative;
        }
        if is_placeholder(&self.reflection) {
            self.reflection = fresh.reflection;
        }
    }
}

fn is_real(value: &str) -> bool {
    !value.trim().is_empty() && !is_placeholder(value)
}

/// A long/short pair produced for one text field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPair {
    pub long: String,
    pub short: String,
}

/// Structured output of the external summarizer for one item or batch.
///
/// Length targets are in [`targets`]; only shape and placeholder absence are
/// checked here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub theme: String,
    pub keywords: Vec<String>,
    pub narrative: TextPair,
    pub reflection: TextPair,
}

impl SummaryRecord {
    /// Parse a record from the summarizer's JSON output
    pub fn from_json(content: &str) -> Result<Self> {
        let record: Self = serde_json::from_str(content)
            .map_err(|e| Error::validation(format!("malformed summary record: {}", e)))?;
        record.validate()?;
        Ok(record)
    }

    /// Structural validation
    pub fn validate(&self) -> Result<()> {
        let text_fields = [
            ("theme", self.theme.as_str()),
            ("narrative.long", self.narrative.long.as_str()),
            ("narrative.short", self.narrative.short.as_str()),
            ("reflection.long", self.reflection.long.as_str()),
            ("reflection.short", self.reflection.short.as_str()),
        ];

        for (name, value) in text_fields {
            if value.trim().is_empty() {
                return Err(Error::validation(format!("summary field {} is empty", name)));
            }
            if is_placeholder(value) {
                return Err(Error::validation(format!(
                    "summary field {} still contains a placeholder",
                    name
                )));
            }
        }

        if self.keywords.is_empty() {
            return Err(Error::validation("summary keywords are empty"));
        }
        if self.keywords.iter().any(|k| k.trim().is_empty() || is_placeholder(k)) {
            return Err(Error::validation("summary keywords contain empty or placeholder entries"));
        }

        if self.theme.chars().count() > targets::THEME * 2 {
            tracing::debug!(
                "Theme is {} chars, well over the {} char target",
                self.theme.chars().count(),
                targets::THEME
            );
        }

        Ok(())
    }

    /// The long form, merged into a tier's draft aggregate
    pub fn long_form(&self) -> SummaryFields {
        SummaryFields {
            digest_type: self.theme.clone(),
            keywords: self.keywords.clone(),
            narrative: self.narrative.long.clone(),
            reflection: self.reflection.long.clone(),
        }
    }
}

/// Truncate to at most `max_chars` characters, appending an ellipsis when cut
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzed() -> SummaryFields {
        SummaryFields {
            digest_type: "planning".into(),
            keywords: vec!["roadmap".into(), "hiring".into()],
            narrative: "We planned the quarter.".into(),
            reflection: "Felt focused.".into(),
        }
    }

    fn record() -> SummaryRecord {
        SummaryRecord {
            theme: "kickoff".into(),
            keywords: vec!["launch".into(), "team".into()],
            narrative: TextPair {
                long: "The team kicked off the project and split the work.".into(),
                short: "Project kickoff.".into(),
            },
            reflection: TextPair {
                long: "Momentum is good but scope is wide.".into(),
                short: "Good momentum.".into(),
            },
        }
    }

    #[test]
    fn test_pending_fields() {
        let budget = PlaceholderBudget::default();
        let fields = SummaryFields::pending(3, &budget);

        assert!(!fields.is_analyzed());
        assert_eq!(
            fields.placeholder_fields(),
            vec!["digest_type", "keywords", "narrative", "reflection"]
        );
        assert_eq!(fields.keywords.len(), 5);
        assert!(fields.narrative.contains("~1200 chars"));
        assert!(fields.reflection.contains("~480 chars"));
    }

    #[test]
    fn test_merge_never_reverts() {
        let mut fields = analyzed();
        let pending = SummaryFields::pending(2, &PlaceholderBudget::default());

        assert!(fields.merge(&pending).is_empty());
        assert_eq!(fields, analyzed());
    }

    #[test]
    fn test_partial_merge() {
        let mut fields = SummaryFields::pending(1, &PlaceholderBudget::default());
        let mut incoming = SummaryFields::pending(1, &PlaceholderBudget::default());
        incoming.narrative = "Only the narrative is done.".into();

        assert_eq!(fields.merge(&incoming), vec!["narrative"]);
        assert_eq!(fields.placeholder_fields(), vec!["digest_type", "keywords", "reflection"]);

        assert_eq!(fields.merge(&analyzed()).len(), 4);
        assert!(fields.is_analyzed());
    }

    #[test]
    fn test_refresh_hints_keeps_real_content() {
        let budget = PlaceholderBudget::default();
        let mut fields = SummaryFields::pending(1, &budget);
        fields.narrative = "done".into();

        fields.refresh_hints(4, &budget);
        assert_eq!(fields.narrative, "done");
        assert!(fields.reflection.contains("~640 chars"));
    }

    #[test]
    fn test_record_validation() {
        assert!(record().validate().is_ok());

        let mut bad = record();
        bad.narrative.short = placeholder(None);
        assert!(matches!(bad.validate(), Err(Error::Validation(_))));

        let mut bad = record();
        bad.theme = "  ".into();
        assert!(bad.validate().is_err());

        assert!(SummaryRecord::from_json(r#"{"theme": "x"}"#).is_err());
    }

    #[test]
    fn test_empty_keywords_rejected() {
        let mut bad = record();
        bad.keywords.clear();
        assert!(matches!(bad.validate(), Err(Error::Validation(_))));

        let json = serde_json::to_string(&bad).unwrap();
        assert!(SummaryRecord::from_json(&json).is_err());
    }

    #[test]
    fn test_has_real_content() {
        let budget = PlaceholderBudget::default();
        let mut fields = SummaryFields::pending(2, &budget);
        assert!(!fields.has_real_content());

        fields.keywords[0] = "retro".into();
        assert!(fields.has_real_content());
        assert!(analyzed().has_real_content());
    }

    #[test]
    fn test_record_from_json() {
        let json = serde_json::to_string(&record()).unwrap();
        let parsed = SummaryRecord::from_json(&json).unwrap();
        assert_eq!(parsed.long_form().digest_type, "kickoff");
        assert_eq!(parsed.long_form().narrative, record().narrative.long);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdefghij", 5), "abcd…");
        assert_eq!(truncate_chars("日本語のテキスト", 4).chars().count(), 4);
    }
}
