// WHY: the two-unit heuristic is an ordered decision table so each rule can be
// read and tested on its own; the first rule that fires wins

use serde::{Deserialize, Serialize};

use super::markers::DiscourseMarker;

/// Markers that each count as evidence for one additional unit
const ADDITIVE_MARKERS: &[&str] = &[
    "another",
    "also",
    "moreover",
    "furthermore",
    "in addition",
    "additionally",
];

pub const MAX_UNITS: u8 = 2;

const SUGGEST_MISSING_MARKER: &str =
    "Only one of First/Second was found. Add the other marker to make the structure explicit.";
const SUGGEST_MARKERS_FOR_CONNECTORS: &str =
    "Several reason connectors (because, since, as) were found. Use First, Second, etc. to make each reason stand out.";
const SUGGEST_MARKERS_FOR_LENGTH: &str =
    "There are four or more sentences but no clear structure. Mark each reason with First, Second, etc.";
const SUGGEST_RESTRUCTURE: &str =
    "Two reasons/suggestions/examples could not be told apart. Use a structure like 'First, ...' and 'Second, ...'.";
const SUGGEST_SECOND_UNIT: &str =
    "Only one reason/suggestion was detected. Add a second one and state both clearly.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

/// Everything the rules look at, gathered once per text
#[derive(Debug, Clone, Default)]
pub struct UnitEvidence {
    pub has_first: bool,
    pub has_second: bool,
    pub additive_markers: usize,
    pub reason_connectors: usize,
    pub sentence_count: usize,
}

impl UnitEvidence {
    pub fn from_markers(markers: &[DiscourseMarker], reason_connectors: usize, sentence_count: usize) -> Self {
        let lowered: Vec<String> = markers.iter().map(DiscourseMarker::lowercase).collect();
        Self {
            has_first: lowered.iter().any(|m| m.contains("first")),
            has_second: lowered.iter().any(|m| m.contains("second")),
            additive_markers: lowered
                .iter()
                .filter(|m| ADDITIVE_MARKERS.contains(&m.as_str()))
                .count(),
            reason_connectors,
            sentence_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub units: u8,
    pub confidence: Confidence,
    pub suggestion: Option<&'static str>,
}

/// A named (predicate, outcome) row of the decision table
pub struct UnitRule {
    pub name: &'static str,
    pub evaluate: fn(&UnitEvidence) -> Option<RuleOutcome>,
}

pub const UNIT_RULES: &[UnitRule] = &[
    UnitRule { name: "first-and-second", evaluate: first_and_second },
    UnitRule { name: "first-or-second", evaluate: first_or_second },
    UnitRule { name: "additive-markers", evaluate: additive_markers },
    UnitRule { name: "reason-connectors", evaluate: reason_connectors },
    UnitRule { name: "sentence-count", evaluate: sentence_count },
    UnitRule { name: "no-structure", evaluate: no_structure },
];

fn first_and_second(e: &UnitEvidence) -> Option<RuleOutcome> {
    (e.has_first && e.has_second).then_some(RuleOutcome {
        units: 2,
        confidence: Confidence::High,
        suggestion: None,
    })
}

fn first_or_second(e: &UnitEvidence) -> Option<RuleOutcome> {
    (e.has_first != e.has_second).then_some(RuleOutcome {
        units: 1,
        confidence: Confidence::Medium,
        suggestion: Some(SUGGEST_MISSING_MARKER),
    })
}

fn additive_markers(e: &UnitEvidence) -> Option<RuleOutcome> {
    (e.additive_markers >= 1).then_some(RuleOutcome {
        units: if e.additive_markers >= 2 { 2 } else { 1 },
        confidence: Confidence::Medium,
        suggestion: None,
    })
}

fn reason_connectors(e: &UnitEvidence) -> Option<RuleOutcome> {
    (e.reason_connectors >= 2).then_some(RuleOutcome {
        units: 2,
        confidence: Confidence::Medium,
        suggestion: Some(SUGGEST_MARKERS_FOR_CONNECTORS),
    })
}

fn sentence_count(e: &UnitEvidence) -> Option<RuleOutcome> {
    (e.sentence_count >= 4).then_some(RuleOutcome {
        units: 2,
        confidence: Confidence::Low,
        suggestion: Some(SUGGEST_MARKERS_FOR_LENGTH),
    })
}

fn no_structure(_: &UnitEvidence) -> Option<RuleOutcome> {
    Some(RuleOutcome {
        units: 0,
        confidence: Confidence::Low,
        suggestion: Some(SUGGEST_RESTRUCTURE),
    })
}

/// Result of walking the decision table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDecision {
    pub units: u8,
    pub confidence: Confidence,
    pub suggestions: Vec<String>,
    /// Name of the rule that fired
    pub rule: &'static str,
}

/// Evaluate [`UNIT_RULES`] top to bottom and stop at the first non-zero outcome
pub fn decide_units(evidence: &UnitEvidence) -> UnitDecision {
    decide_with(UNIT_RULES, evidence)
}

pub fn decide_with(rules: &[UnitRule], evidence: &UnitEvidence) -> UnitDecision {
    let mut decision = UnitDecision {
        units: 0,
        confidence: Confidence::Low,
        suggestions: Vec::new(),
        rule: "none",
    };

    for rule in rules {
        let Some(outcome) = (rule.evaluate)(evidence) else {
            continue;
        };
        decision.units = outcome.units.min(MAX_UNITS);
        decision.confidence = outcome.confidence;
        decision.rule = rule.name;
        if let Some(suggestion) = outcome.suggestion {
            decision.suggestions.push(suggestion.to_string());
        }
        if decision.units > 0 {
            break;
        }
    }

    if decision.units == 1 {
        decision.suggestions.push(SUGGEST_SECOND_UNIT.to_string());
    }
    decision
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence() -> UnitEvidence {
        UnitEvidence::default()
    }

    #[test]
    fn test_first_and_second_is_high() {
        let decision = decide_units(&UnitEvidence { has_first: true, has_second: true, ..evidence() });
        assert_eq!(decision.units, 2);
        assert_eq!(decision.confidence, Confidence::High);
        assert_eq!(decision.rule, "first-and-second");
        assert!(decision.suggestions.is_empty());
    }

    #[test]
    fn test_single_marker_is_medium_with_suggestions() {
        let decision = decide_units(&UnitEvidence { has_second: true, reason_connectors: 5, ..evidence() });
        assert_eq!(decision.units, 1);
        assert_eq!(decision.confidence, Confidence::Medium);
        assert_eq!(decision.rule, "first-or-second");
        assert_eq!(decision.suggestions, vec![SUGGEST_MISSING_MARKER, SUGGEST_SECOND_UNIT]);
    }

    #[test]
    fn test_additive_markers() {
        let one = decide_units(&UnitEvidence { additive_markers: 1, ..evidence() });
        assert_eq!((one.units, one.confidence), (1, Confidence::Medium));

        let two = decide_units(&UnitEvidence { additive_markers: 3, ..evidence() });
        assert_eq!((two.units, two.confidence), (2, Confidence::Medium));
        assert!(two.suggestions.is_empty());
    }

    #[test]
    fn test_connectors_then_length() {
        let connectors = decide_units(&UnitEvidence { reason_connectors: 2, sentence_count: 9, ..evidence() });
        assert_eq!(connectors.rule, "reason-connectors");
        assert_eq!((connectors.units, connectors.confidence), (2, Confidence::Medium));

        let length = decide_units(&UnitEvidence { reason_connectors: 1, sentence_count: 4, ..evidence() });
        assert_eq!(length.rule, "sentence-count");
        assert_eq!((length.units, length.confidence), (2, Confidence::Low));
    }

    #[test]
    fn test_fallback() {
        let decision = decide_units(&UnitEvidence { sentence_count: 3, ..evidence() });
        assert_eq!(decision.units, 0);
        assert_eq!(decision.confidence, Confidence::Low);
        assert_eq!(decision.suggestions, vec![SUGGEST_RESTRUCTURE]);
    }

    #[test]
    fn test_outcome_is_capped() {
        fn greedy(_: &UnitEvidence) -> Option<RuleOutcome> {
            Some(RuleOutcome { units: 7, confidence: Confidence::High, suggestion: None })
        }
        let rules = [UnitRule { name: "greedy", evaluate: greedy }];
        assert_eq!(decide_with(&rules, &evidence()).units, MAX_UNITS);
    }
}
