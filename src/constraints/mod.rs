// WHY: server-side deterministic checks (word count, two-unit structure) that never
// depend on the LLM

pub mod markers;
pub mod units;
pub mod word_count;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use markers::{DiscourseMarker, MarkerDetector};
pub use units::{decide_units, Confidence, UnitDecision, UnitEvidence, UnitRule, UNIT_RULES};
pub use word_count::WordCounter;

/// Report produced by [`ConstraintChecker::detect_two_units`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoUnitReport {
    /// 0, 1 or 2
    pub detected_units: u8,
    pub has_two_units: bool,
    pub markers_found: Vec<String>,
    pub reason_connector_count: usize,
    pub sentence_count: usize,
    pub confidence: Confidence,
    pub suggestions: Vec<String>,
}

/// Combined word-range and unit validation for a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintReport {
    pub word_count: usize,
    pub within_word_range: bool,
    pub required_units: u8,
    pub detected_units: u8,
    pub has_required_units: bool,
    /// `None` when unit detection was skipped (`required_units == 0`)
    pub confidence: Option<Confidence>,
    pub markers_found: Vec<String>,
    pub reason_connector_count: usize,
    pub sentence_count: usize,
    pub notes: Vec<String>,
    pub suggestions: Vec<String>,
}

impl ConstraintReport {
    pub fn all_constraints_met(&self) -> bool {
        self.within_word_range && self.has_required_units
    }
}

/// Inclusive word-count range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRange {
    pub min: usize,
    pub max: usize,
}

impl WordRange {
    pub fn contains(&self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

impl Default for WordRange {
    fn default() -> Self {
        Self { min: 80, max: 120 }
    }
}

/// Compiled patterns for all word/unit checks
#[derive(Debug, Clone)]
pub struct ConstraintChecker {
    words: WordCounter,
    markers: MarkerDetector,
}

impl ConstraintChecker {
    pub fn new() -> Result<Self> {
        Ok(Self {
            words: WordCounter::new()?,
            markers: MarkerDetector::new()?,
        })
    }

    pub fn count_words(&self, text: &str) -> usize {
        self.words.count_words(text)
    }

    pub fn count_sentence_boundaries(&self, text: &str) -> usize {
        self.words.count_sentence_boundaries(text)
    }

    pub fn detect_discourse_markers(&self, text: &str) -> Vec<DiscourseMarker> {
        self.markers.detect_discourse_markers(text)
    }

    pub fn detect_reason_connectors(&self, text: &str) -> usize {
        self.markers.detect_reason_connectors(text)
    }

    /// Heuristically detect whether the text presents two reasons/suggestions/examples
    pub fn detect_two_units(&self, text: &str) -> TwoUnitReport {
        let markers = self.detect_discourse_markers(text);
        let reason_connector_count = self.detect_reason_connectors(text);
        let sentence_count = self.count_sentence_boundaries(text);

        let evidence = UnitEvidence::from_markers(&markers, reason_connector_count, sentence_count);
        let decision = decide_units(&evidence);
        debug!(rule = decision.rule, units = decision.units, "Unit detection decided");

        TwoUnitReport {
            detected_units: decision.units,
            has_two_units: decision.units >= 2,
            markers_found: markers.into_iter().map(|m| m.marker).collect(),
            reason_connector_count,
            sentence_count,
            confidence: decision.confidence,
            suggestions: decision.suggestions,
        }
    }

    /// Check word range and (unless `required_units == 0`) unit structure
    pub fn validate_constraints(&self, text: &str, range: WordRange, required_units: u8) -> ConstraintReport {
        let word_count = self.count_words(text);
        let within_word_range = range.contains(word_count);

        let mut notes = Vec::new();
        let mut suggestions = Vec::new();

        if word_count < range.min {
            let shortage = range.min - word_count;
            notes.push(format!("Word count too low: {word_count} words ({shortage} short)"));
            suggestions.push(format!(
                "Add at least {shortage} more words (target: {}-{} words)",
                range.min, range.max
            ));
        } else if word_count > range.max {
            let excess = word_count - range.max;
            notes.push(format!("Word count too high: {word_count} words ({excess} over)"));
            suggestions.push(format!(
                "Cut at least {excess} words (target: {}-{} words)",
                range.min, range.max
            ));
        } else {
            notes.push(format!("Word count OK: {word_count} words ({}-{})", range.min, range.max));
        }

        if required_units == 0 {
            return ConstraintReport {
                word_count,
                within_word_range,
                required_units,
                detected_units: 0,
                has_required_units: true,
                confidence: None,
                markers_found: Vec::new(),
                reason_connector_count: 0,
                sentence_count: 0,
                notes,
                suggestions,
            };
        }

        let units = self.detect_two_units(text);
        let has_required_units = units.detected_units >= required_units;
        if has_required_units {
            notes.push(format!(
                "Units OK: {} detected ({} confidence)",
                units.detected_units,
                units.confidence.as_str()
            ));
            if units.confidence == Confidence::Low {
                suggestions.push(
                    "Make the structure clearer with markers such as 'First, ...' and 'Second, ...'."
                        .to_string(),
                );
            }
        } else {
            notes.push(format!(
                "Not enough units: {} detected ({} required)",
                units.detected_units, required_units
            ));
            suggestions.extend(units.suggestions.iter().cloned());
        }

        ConstraintReport {
            word_count,
            within_word_range,
            required_units,
            detected_units: units.detected_units,
            has_required_units,
            confidence: Some(units.confidence),
            markers_found: units.markers_found,
            reason_connector_count: units.reason_connector_count,
            sentence_count: units.sentence_count,
            notes,
            suggestions,
        }
    }
}
