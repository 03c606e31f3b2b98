// Discourse markers and reason connectors used by the unit detector

use anyhow::Result;
use regex_automata::meta::Regex;
use serde::{Deserialize, Serialize};

use crate::normalization::normalize_punctuation;

/// Marker vocabulary, one pattern per entry; overlapping entries ("first" and
/// "first of all") each report their own match
const MARKER_PATTERNS: &[&str] = &[
    r"(?i)\bfirst(?:ly)?\b",
    r"(?i)\bfirst of all\b",
    r"(?i)\bsecond(?:ly)?\b",
    r"(?i)\bthird(?:ly)?\b",
    r"(?i)\banother\b",
    r"(?i)\balso\b",
    r"(?i)\bmoreover\b",
    r"(?i)\bfurthermore\b",
    r"(?i)\bin addition\b",
    r"(?i)\bone reason is\b",
    r"(?i)\banother reason is\b",
    r"(?i)\bfor example\b",
    r"(?i)\bfor instance\b",
    r"(?i)\badditionally\b",
    r"(?i)\bbesides\b",
];

const CONNECTOR_PATTERNS: &[&str] = &[r"(?i)\bbecause\b", r"(?i)\bsince\b"];

/// "as" counts as a reason connector except in these collocations
const AS_EXCLUSIONS: &[&str] = &["well", "usual"];

/// A discourse marker occurrence; `position` is a byte offset into the normalized text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscourseMarker {
    pub marker: String,
    pub position: usize,
}

impl DiscourseMarker {
    pub fn lowercase(&self) -> String {
        self.marker.to_lowercase()
    }
}

#[derive(Debug, Clone)]
pub struct MarkerDetector {
    markers: Vec<Regex>,
    connectors: Vec<Regex>,
    as_connector: Regex,
}

impl MarkerDetector {
    pub fn new() -> Result<Self> {
        let markers = MARKER_PATTERNS
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        let connectors = CONNECTOR_PATTERNS
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            markers,
            connectors,
            as_connector: Regex::new(r"(?i)\bas\b")?,
        })
    }

    /// All marker matches, sorted by position; ties keep vocabulary order
    pub fn detect_discourse_markers(&self, text: &str) -> Vec<DiscourseMarker> {
        let normalized = normalize_punctuation(text);
        let mut found: Vec<DiscourseMarker> = self
            .markers
            .iter()
            .flat_map(|re| re.find_iter(&normalized))
            .map(|m| DiscourseMarker {
                marker: normalized[m.range()].to_string(),
                position: m.start(),
            })
            .collect();
        found.sort_by_key(|m| m.position);
        found
    }

    /// Count "because", "since" and "as" (excluding "as well" / "as usual")
    pub fn detect_reason_connectors(&self, text: &str) -> usize {
        let normalized = normalize_punctuation(text);
        let plain: usize = self
            .connectors
            .iter()
            .map(|re| re.find_iter(&normalized).count())
            .sum();
        let as_count = self
            .as_connector
            .find_iter(&normalized)
            .filter(|m| !starts_excluded_collocation(&normalized[m.end()..]))
            .count();
        plain + as_count
    }
}

/// True when `rest` is one or more whitespace characters followed by an excluded word
fn starts_excluded_collocation(rest: &str) -> bool {
    let trimmed = rest.trim_start();
    if trimmed.len() == rest.len() {
        return false;
    }
    AS_EXCLUSIONS.iter().any(|word| {
        trimmed
            .get(..word.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(word))
    })
}
