// WHY: LLM feedback quotes fragments loosely; every point is re-anchored to a real
// sentence of the submission or dropped, so learners never see invented text

pub mod coverage;

use std::collections::HashSet;
use std::ops::Range;

use regex_automata::meta::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};

use crate::normalization::InputNormalizer;
use crate::sentence_detector::{escape_pattern, Sentence, SentenceSegmenter};

/// One correction record as returned by the LLM; every field may be missing or null
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPoint {
    /// A null or missing value reads as empty and is rejected at alignment
    #[serde(default, deserialize_with = "null_as_empty")]
    pub before: String,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl RawPoint {
    pub fn new(before: impl Into<String>) -> Self {
        Self {
            before: before.into(),
            ..Self::default()
        }
    }

    pub fn with_after(mut self, after: impl Into<String>) -> Self {
        self.after = Some(after.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }
}

/// Classification of a correction point; display labels belong to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Level {
    Error,
    Correct,
    ContentEvaluation,
}

impl Level {
    /// Coerce a free-form LLM label to `Error` or `Correct`
    ///
    /// Only an explicit error label ("error", or one carrying the ❌ mark) stays an error;
    /// suggestions, unknown labels and missing labels all become `Correct`.
    pub fn classify(label: Option<&str>) -> Level {
        let Some(label) = label.map(str::trim) else {
            return Level::Correct;
        };
        if label.contains('\u{274C}') || label.eq_ignore_ascii_case("error") {
            Level::Error
        } else {
            Level::Correct
        }
    }
}

/// A validated piece of feedback tied to one sentence of the submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionPoint {
    /// Full sentence as submitted (after normalization)
    pub before: String,
    /// Full sentence after the fix; equal to `before` unless `level` is `Error`
    pub after: String,
    pub reason: String,
    pub level: Level,
    /// 1-based sentence position in the submission
    pub sentence_number: usize,
    /// The normalized fragment the LLM quoted
    pub fragment: String,
    /// Reference (source) sentence at the same position, when one exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_sentence: Option<String>,
    /// The learner's sentence before normalization, for display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_before: Option<String>,
    /// Set only on placeholders manufactured by [`coverage::fill_placeholders`]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub not_submitted: bool,
}

/// Why a raw point was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyBefore,
    NotFound,
}

impl Rejection {
    pub fn describe(&self) -> &'static str {
        match self {
            Rejection::EmptyBefore => "empty before",
            Rejection::NotFound => "fragment not found in submission",
        }
    }
}

/// Aligns raw LLM points against a segmented submission
#[derive(Debug, Clone)]
pub struct PointAligner {
    segmenter: SentenceSegmenter,
    normalizer: InputNormalizer,
}

impl PointAligner {
    /// Aligner with the default segmentation rules
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self::from_parts(
            SentenceSegmenter::with_default_rules()?,
            InputNormalizer::new()?,
        ))
    }

    /// Aligner sharing already compiled pieces
    pub fn from_parts(segmenter: SentenceSegmenter, normalizer: InputNormalizer) -> Self {
        Self { segmenter, normalizer }
    }

    pub fn segmenter(&self) -> &SentenceSegmenter {
        &self.segmenter
    }

    /// Validate, expand, deduplicate and number `raw_points` against the submission
    ///
    /// The result holds at most one point per `(before, after)` pair, sorted by
    /// `sentence_number`, each number within `1..=sentence count`.
    pub fn align(
        &self,
        raw_points: &[RawPoint],
        normalized_submission: &str,
        reference_sentences: &[String],
    ) -> Vec<CorrectionPoint> {
        let sentences = self.segmenter.segment(normalized_submission);
        info!(
            "Aligning {} points against {} submission sentences",
            raw_points.len(),
            sentences.len()
        );
        self.align_sentences(raw_points, &sentences, reference_sentences)
    }

    /// Like [`PointAligner::align`], also attaching the pre-normalization sentence at the
    /// same position as `original_before`
    pub fn align_with_original(
        &self,
        raw_points: &[RawPoint],
        normalized_submission: &str,
        reference_sentences: &[String],
        original_submission: &str,
    ) -> Vec<CorrectionPoint> {
        let original_sentences = self.segmenter.segment(original_submission);
        let mut points = self.align(raw_points, normalized_submission, reference_sentences);
        for point in &mut points {
            point.original_before = original_sentences
                .get(point.sentence_number - 1)
                .map(|s| s.content.clone());
        }
        points
    }

    /// Alignment against already-segmented sentences
    pub fn align_sentences(
        &self,
        raw_points: &[RawPoint],
        sentences: &[Sentence],
        reference_sentences: &[String],
    ) -> Vec<CorrectionPoint> {
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut accepted = Vec::new();

        for (i, raw) in raw_points.iter().enumerate() {
            let point = match self.align_one(raw, sentences, reference_sentences) {
                Ok(point) => point,
                Err(rejection) => {
                    warn!(
                        "Point {}: {}, skipping: '{}'",
                        i + 1,
                        rejection.describe(),
                        preview(&raw.before)
                    );
                    continue;
                }
            };

            if !seen.insert((point.before.clone(), point.after.clone())) {
                debug!("Point {}: duplicate of an accepted point, skipping", i + 1);
                continue;
            }
            accepted.push(point);
        }

        accepted.sort_by_key(|p| p.sentence_number);
        info!("Alignment complete: {} of {} points accepted", accepted.len(), raw_points.len());
        accepted
    }

    fn align_one(
        &self,
        raw: &RawPoint,
        sentences: &[Sentence],
        reference_sentences: &[String],
    ) -> Result<CorrectionPoint, Rejection> {
        let fragment = self.normalizer.normalize_fragment(&raw.before);
        if fragment.is_empty() {
            return Err(Rejection::EmptyBefore);
        }

        let matcher = fragment_matcher(&fragment).ok_or(Rejection::NotFound)?;
        let (sentence, range) = sentences
            .iter()
            .find_map(|s| matcher.find(s.content.as_str()).map(|m| (s, m.range())))
            .ok_or(Rejection::NotFound)?;

        let before = sentence.content.clone();
        let replacement = raw
            .after
            .as_deref()
            .map(|after| self.normalizer.normalize_fragment(after))
            .filter(|after| !after.is_empty())
            .unwrap_or_else(|| fragment.clone());

        let level = Level::classify(raw.level.as_deref());
        let after = if level == Level::Error && replacement != fragment {
            let mut corrected = before.clone();
            corrected.replace_range(range, &replacement);
            self.normalizer.normalize(&corrected)
        } else {
            before.clone()
        };

        Ok(CorrectionPoint {
            before,
            after,
            reason: raw.reason.clone().unwrap_or_default(),
            level,
            sentence_number: sentence.number(),
            fragment,
            source_sentence: reference_sentences.get(sentence.index).cloned(),
            original_before: None,
            not_submitted: false,
        })
    }
}

/// Case-insensitive literal matcher for a quoted fragment
fn fragment_matcher(fragment: &str) -> Option<Regex> {
    match Regex::new(&format!("(?i){}", escape_pattern(fragment))) {
        Ok(matcher) => Some(matcher),
        Err(e) => {
            warn!("Cannot search for fragment '{}': {}", preview(fragment), e);
            None
        }
    }
}

/// Byte range of the first case-insensitive occurrence of `needle` in `haystack`
pub fn find_ignore_case(haystack: &str, needle: &str) -> Option<Range<usize>> {
    if needle.is_empty() {
        return None;
    }
    fragment_matcher(needle)?.find(haystack).map(|m| m.range())
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBMISSION: &str = "I like apple very much. She go to school every day. We are happy.";

    fn align(points: &[RawPoint]) -> Vec<CorrectionPoint> {
        PointAligner::new().unwrap().align(points, SUBMISSION, &[])
    }

    #[test]
    fn test_fragment_expanded_and_replaced() {
        let points = align(&[RawPoint::new("she go")
            .with_after("she goes")
            .with_reason("third person singular")
            .with_level("\u{274C}grammar")]);
        assert_eq!(points.len(), 1);
        let point = &points[0];
        assert_eq!(point.before, "She go to school every day.");
        assert_eq!(point.after, "She goes to school every day.");
        assert_eq!(point.level, Level::Error);
        assert_eq!(point.sentence_number, 2);
        assert_eq!(point.fragment, "she go");
        assert_eq!(point.reason, "third person singular");
    }

    #[test]
    fn test_unlocatable_and_empty_rejected() {
        let points = align(&[
            RawPoint::new("I love bananas").with_level("error"),
            RawPoint::new("   "),
            RawPoint::new("We are happy").with_level("error").with_after("We were happy"),
        ]);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].sentence_number, 3);
        assert_eq!(points[0].after, "We were happy.");
    }

    #[test]
    fn test_duplicates_merged() {
        let point = RawPoint::new("apple very").with_after("apples very").with_level("error");
        let points = align(&[point.clone(), point]);
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_non_error_levels_become_correct() {
        let points = align(&[
            RawPoint::new("We are happy").with_after("We are very happy").with_level("\u{1F4A1}suggestion"),
            RawPoint::new("I like apple").with_after("I love apples"),
        ]);
        assert_eq!(points.len(), 2);
        for point in &points {
            assert_eq!(point.level, Level::Correct);
            assert_eq!(point.before, point.after);
        }
        assert_eq!(points[0].sentence_number, 1);
        assert_eq!(points[1].sentence_number, 3);
    }

    #[test]
    fn test_error_with_identical_replacement_keeps_sentence() {
        let points = align(&[RawPoint::new("We are happy").with_after("we are happy").with_level("error")]);
        assert_eq!(points[0].level, Level::Error);
        assert_ne!(points[0].after, "");
        // case differs, so the substitution still runs and re-capitalizes
        assert_eq!(points[0].after, "We are happy.");
    }

    #[test]
    fn test_reference_and_original_attached() {
        let reference = vec!["私はリンゴが好きです。".to_string(), "彼女は学校に行く。".to_string()];
        let original = "I like apple very much. She go to school every day. we are happy";
        let points = PointAligner::new().unwrap().align_with_original(
            &[RawPoint::new("She go"), RawPoint::new("We are")],
            SUBMISSION,
            &reference,
            original,
        );
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].source_sentence.as_deref(), Some("彼女は学校に行く。"));
        assert_eq!(points[1].source_sentence, None);
        assert_eq!(
            points[0].original_before.as_deref(),
            Some("She go to school every day. we are happy")
        );
        assert_eq!(points[1].original_before, None);
    }

    #[test]
    fn test_level_classify() {
        assert_eq!(Level::classify(Some("\u{274C} grammar mistake")), Level::Error);
        assert_eq!(Level::classify(Some(" Error ")), Level::Error);
        assert_eq!(Level::classify(Some("suggestion")), Level::Correct);
        assert_eq!(Level::classify(Some("\u{2705} correct")), Level::Correct);
        assert_eq!(Level::classify(None), Level::Correct);
    }

    #[test]
    fn test_find_ignore_case() {
        assert_eq!(find_ignore_case("She Go to school", "she go"), Some(0..6));
        assert_eq!(find_ignore_case("a café here", "CAFÉ"), Some(2..7));
        assert_eq!(find_ignore_case("abc", "abcd"), None);
        assert_eq!(find_ignore_case("abc", ""), None);
        assert_eq!(find_ignore_case("Is it (really) 5$?", "(REALLY) 5$?"), Some(6..18));
        assert_eq!(find_ignore_case("a+b", "a.b"), None);
    }

    #[test]
    fn test_null_before_rejected_without_losing_other_points() {
        let raw: Vec<RawPoint> = serde_json::from_str(
            r#"[{"before":"I like","after":"I love","level":"error"},{"before":null,"after":"x"}]"#,
        )
        .unwrap();
        assert_eq!(raw[1].before, "");

        let points = align(&raw);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].after, "I love apple very much.");
    }

    #[test]
    fn test_level_serializes_kebab_case() {
        let json = serde_json::to_string(&Level::ContentEvaluation).unwrap();
        assert_eq!(json, "\"content-evaluation\"");
    }
}
