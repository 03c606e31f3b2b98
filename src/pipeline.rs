// One-call processing of a raw submission: normalize, segment, count

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::alignment::{CorrectionPoint, PointAligner, RawPoint};
use crate::constraints::{ConstraintChecker, ConstraintReport, WordRange};
use crate::normalization::InputNormalizer;
use crate::sentence_detector::{Sentence, SentenceSegmenter};

/// A submission after the deterministic pre-LLM stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedSubmission {
    pub original: String,
    pub normalized: String,
    pub sentences: Vec<Sentence>,
    pub word_count: usize,
}

impl ProcessedSubmission {
    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }
}

/// Holds the compiled pieces so many submissions can share them
#[derive(Debug, Clone)]
pub struct SubmissionPipeline {
    normalizer: InputNormalizer,
    segmenter: SentenceSegmenter,
    checker: ConstraintChecker,
}

impl SubmissionPipeline {
    pub fn new() -> Result<Self> {
        Ok(Self {
            normalizer: InputNormalizer::new()?,
            segmenter: SentenceSegmenter::with_default_rules()?,
            checker: ConstraintChecker::new()?,
        })
    }

    pub fn normalizer(&self) -> &InputNormalizer {
        &self.normalizer
    }

    pub fn segmenter(&self) -> &SentenceSegmenter {
        &self.segmenter
    }

    pub fn checker(&self) -> &ConstraintChecker {
        &self.checker
    }

    pub fn process(&self, raw: &str) -> ProcessedSubmission {
        let normalized = self.normalizer.normalize_submission(raw);
        let sentences = self.segmenter.segment(&normalized);
        let word_count = self.checker.count_words(raw);
        debug!(
            "Processed submission: {} sentences, {} words",
            sentences.len(),
            word_count
        );
        ProcessedSubmission {
            original: raw.to_string(),
            normalized,
            sentences,
            word_count,
        }
    }

    pub fn check(&self, raw: &str, range: WordRange, required_units: u8) -> ConstraintReport {
        self.checker.validate_constraints(raw, range, required_units)
    }

    /// Aligner sharing this pipeline's compiled patterns
    pub fn aligner(&self) -> PointAligner {
        PointAligner::from_parts(self.segmenter.clone(), self.normalizer.clone())
    }

    /// Align LLM points against an already processed submission
    pub fn align(
        &self,
        submission: &ProcessedSubmission,
        raw_points: &[RawPoint],
        reference_sentences: &[String],
    ) -> Vec<CorrectionPoint> {
        let mut points = self.aligner().align_sentences(raw_points, &submission.sentences, reference_sentences);
        let originals = self.segmenter.segment(&submission.original);
        for point in &mut points {
            point.original_before = originals
                .get(point.sentence_number - 1)
                .map(|s| s.content.clone());
        }
        points
    }
}
