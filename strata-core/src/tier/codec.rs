//! Sequence identifiers: `{prefix}{zero-padded number}`.
//!
//! Anything after the digits (`_title.json`, `.txt`) is ignored when parsing,
//! so filenames and bare identifiers decode the same way. The prefix is the
//! full leading run of ASCII letters; tiers must not share an exact prefix.

use std::collections::BTreeMap;
use std::path::Path;

/// Format an identifier, padding the number to `width` digits
pub fn format_id(prefix: &str, width: usize, number: u32) -> String {
    format!("{}{:0width$}", prefix, number, width = width)
}

/// Split a filename into its prefix and sequence number
pub fn parse(filename: &str) -> Option<(String, u32)> {
    let (prefix, digits) = split(filename)?;
    let number = digits.parse::<u32>().ok()?;
    Some((prefix.to_string(), number))
}

/// Number of digits a reference is written with
pub fn digit_width(filename: &str) -> Option<usize> {
    split(filename).map(|(_, digits)| digits.len())
}

fn split(filename: &str) -> Option<(&str, &str)> {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    let prefix_len = name
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(name.len());
    if prefix_len == 0 {
        return None;
    }

    let rest = &name[prefix_len..];
    let digits_len = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_len == 0 {
        return None;
    }

    Some((&name[..prefix_len], &rest[..digits_len]))
}

/// Parse the sequence number of a filename carrying the given prefix
pub fn number_with_prefix(filename: &str, prefix: &str) -> Option<u32> {
    match parse(filename) {
        Some((p, n)) if p == prefix => Some(n),
        _ => None,
    }
}

/// Largest sequence number among filenames with the given prefix
pub fn max_number<'a, I>(filenames: I, prefix: &str) -> Option<u32>
where
    I: IntoIterator<Item = &'a str>,
{
    filenames
        .into_iter()
        .filter_map(|f| number_with_prefix(f, prefix))
        .max()
}

/// A run of consecutive missing sequence numbers, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gap {
    pub first: u32,
    pub last: u32,
}

impl Gap {
    /// Count of missing numbers in the run
    pub fn len(&self) -> u64 {
        u64::from(self.last - self.first) + 1
    }
}

impl std::fmt::Display for Gap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}-{}", self.first, self.last)
        }
    }
}

/// Most gap runs spelled out by [`describe_gaps`]
pub const LISTED_GAPS: usize = 10;

/// Human-readable gap list, e.g. `2-3, 7`, truncated after [`LISTED_GAPS`] runs
pub fn describe_gaps(gaps: &[Gap]) -> String {
    let mut listed: Vec<String> = gaps.iter().take(LISTED_GAPS).map(Gap::to_string).collect();
    if gaps.len() > LISTED_GAPS {
        listed.push(format!("and {} more run(s)", gaps.len() - LISTED_GAPS));
    }
    let total: u64 = gaps.iter().map(Gap::len).sum();
    format!("{} ({} missing)", listed.join(", "), total)
}

/// Shape of a list of source references, as seen by promotion validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceReport {
    /// Common prefix of every reference
    pub prefix: String,
    /// Numbers in ascending order
    pub numbers: Vec<u32>,
    /// Runs of numbers missing between the smallest and largest entry
    pub gaps: Vec<Gap>,
    /// Numbers claimed by more than one reference, with the references
    pub duplicates: Vec<(u32, Vec<String>)>,
}

impl SequenceReport {
    pub fn has_gaps(&self) -> bool {
        !self.gaps.is_empty()
    }

    pub fn last(&self) -> Option<u32> {
        self.numbers.last().copied()
    }
}

/// Why a list of references could not be analysed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceIssue {
    Unparsable(Vec<String>),
    MixedPrefixes(Vec<String>),
}

impl std::fmt::Display for SequenceIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unparsable(refs) => write!(f, "unparsable source references: {}", refs.join(", ")),
            Self::MixedPrefixes(prefixes) => {
                write!(f, "source references mix prefixes: {}", prefixes.join(", "))
            }
        }
    }
}

/// Parse every reference and report gaps and duplicates
pub fn analyze<S: AsRef<str>>(references: &[S]) -> Result<SequenceReport, SequenceIssue> {
    let mut unparsable = Vec::new();
    let mut by_number: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    let mut prefixes: Vec<String> = Vec::new();

    for reference in references {
        let reference = reference.as_ref();
        match parse(reference) {
            Some((prefix, number)) => {
                if !prefixes.contains(&prefix) {
                    prefixes.push(prefix);
                }
                by_number.entry(number).or_default().push(reference.to_string());
            }
            None => unparsable.push(reference.to_string()),
        }
    }

    if !unparsable.is_empty() {
        return Err(SequenceIssue::Unparsable(unparsable));
    }
    if prefixes.len() > 1 {
        return Err(SequenceIssue::MixedPrefixes(prefixes));
    }

    let numbers: Vec<u32> = by_number.keys().copied().collect();
    let gaps = numbers
        .windows(2)
        .filter(|w| w[1] - w[0] > 1)
        .map(|w| Gap {
            first: w[0] + 1,
            last: w[1] - 1,
        })
        .collect();
    let duplicates = by_number
        .into_iter()
        .filter(|(_, refs)| refs.len() > 1)
        .collect();

    Ok(SequenceReport {
        prefix: prefixes.pop().unwrap_or_default(),
        numbers,
        gaps,
        duplicates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::TierRegistry;

    #[test]
    fn test_parse() {
        assert_eq!(parse("W0001"), Some(("W".into(), 1)));
        assert_eq!(parse("L00042_standup.txt"), Some(("L".into(), 42)));
        assert_eq!(parse("MD03_long_view.json"), Some(("MD".into(), 3)));
        assert_eq!(parse("digests/1_weekly/W0012_x.json"), Some(("W".into(), 12)));
        assert_eq!(parse("0001"), None);
        assert_eq!(parse("notes.txt"), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("W99999999999"), None);
    }

    #[test]
    fn test_shared_leading_letters_stay_distinct() {
        assert_eq!(number_with_prefix("M004", "M"), Some(4));
        assert_eq!(number_with_prefix("MD04", "M"), None);
        assert_eq!(number_with_prefix("MD04", "MD"), Some(4));
    }

    #[test]
    fn test_format_pads() {
        assert_eq!(format_id("W", 4, 7), "W0007");
        assert_eq!(format_id("C", 2, 123), "C123");
    }

    #[test]
    fn test_round_trip_every_tier() {
        let registry = TierRegistry::standard();
        for tier in registry.iter() {
            let upper = 10u32.pow(tier.digit_width as u32) - 1;
            for n in 1..=upper {
                let id = registry.format(&tier.name, n).unwrap();
                assert_eq!(parse(&id), Some((tier.prefix.clone(), n)), "tier {}", tier.name);
            }
        }
    }

    #[test]
    fn test_max_number() {
        let files = ["W0001_a.json", "W0010_b.json", "M001_c.json", "W0003.json", "readme"];
        assert_eq!(max_number(files.iter().copied(), "W"), Some(10));
        assert_eq!(max_number(files.iter().copied(), "M"), Some(1));
        assert_eq!(max_number(files.iter().copied(), "Q"), None);
    }

    #[test]
    fn test_analyze_gaps_and_duplicates() {
        let report = analyze(&["W0001", "W0004", "W0002"]).unwrap();
        assert_eq!(report.numbers, vec![1, 2, 4]);
        assert_eq!(report.gaps, vec![Gap { first: 3, last: 3 }]);
        assert!(report.duplicates.is_empty());
        assert_eq!(report.last(), Some(4));

        let report = analyze(&["W0001_a.json", "W0001_b.json"]).unwrap();
        assert_eq!(report.duplicates.len(), 1);
        assert_eq!(report.duplicates[0].0, 1);
    }

    #[test]
    fn test_wide_gaps_stay_compact() {
        let report = analyze(&["L00001", "L4000000000"]).unwrap();
        assert_eq!(
            report.gaps,
            vec![Gap {
                first: 2,
                last: 3_999_999_999
            }]
        );
        assert_eq!(report.gaps[0].len(), 3_999_999_998);
        assert_eq!(describe_gaps(&report.gaps), "2-3999999999 (3999999998 missing)");
    }

    #[test]
    fn test_describe_gaps_truncates() {
        let refs: Vec<String> = (0..30).map(|i| format!("W{:04}", i * 2 + 1)).collect();
        let report = analyze(&refs).unwrap();
        assert_eq!(report.gaps.len(), 29);

        let text = describe_gaps(&report.gaps);
        assert!(text.starts_with("2, 4, 6"));
        assert!(text.contains("and 19 more run(s)"));
        assert!(text.ends_with("(29 missing)"));
    }

    #[test]
    fn test_digit_width() {
        assert_eq!(digit_width("L00001_standup.txt"), Some(5));
        assert_eq!(digit_width("L20000000"), Some(8));
        assert_eq!(digit_width("W0001_x.json"), Some(4));
        assert_eq!(digit_width("notes.txt"), None);
    }

    #[test]
    fn test_analyze_rejects_bad_references() {
        assert!(matches!(analyze(&["W0001", "oops"]), Err(SequenceIssue::Unparsable(_))));
        assert!(matches!(analyze(&["W0001", "M002"]), Err(SequenceIssue::MixedPrefixes(_))));
    }
}
