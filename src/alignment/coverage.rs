// Shortfall handling around the aligner: how many points a submission needs, merging a
// re-prompted supplement, and placeholder points for slots still uncovered

use std::collections::HashSet;

use tracing::{debug, info};

use super::{CorrectionPoint, Level, PointAligner, RawPoint};
use crate::sentence_detector::{split_japanese_sentences, SentenceSegmenter};

/// Points expected when neither the source nor the submission yields any sentence
pub const DEFAULT_REQUIRED_POINTS: usize = 3;

/// One point per source sentence; falls back to submission sentences, then to a constant
pub fn required_points(source_text: &str, submission: &str, segmenter: &SentenceSegmenter) -> usize {
    let source_count = split_japanese_sentences(source_text).len();
    if source_count > 0 {
        return source_count;
    }
    let submission_count = segmenter.segment(submission).len();
    if submission_count > 0 {
        return submission_count;
    }
    DEFAULT_REQUIRED_POINTS
}

/// Points that count toward coverage (content evaluations do not)
pub fn non_evaluation_count(points: &[CorrectionPoint]) -> usize {
    points
        .iter()
        .filter(|p| p.level != Level::ContentEvaluation)
        .count()
}

/// `before` values already used, for excluding them from a re-prompt
pub fn used_befores(points: &[CorrectionPoint]) -> Vec<String> {
    points.iter().map(|p| p.before.clone()).collect()
}

/// Merge a supplementary batch of raw points into `accepted`
///
/// The supplement goes through the same alignment as the first batch. Records that
/// repeat an existing `before` or `(before, after)` pair are dropped, and merging stops
/// once `required` non-evaluation points exist.
pub fn merge_supplement(
    aligner: &PointAligner,
    accepted: &mut Vec<CorrectionPoint>,
    supplement: &[RawPoint],
    normalized_submission: &str,
    reference_sentences: &[String],
    required: usize,
) -> usize {
    let used: HashSet<String> = accepted.iter().map(|p| p.before.trim().to_string()).collect();
    let fresh: Vec<RawPoint> = supplement
        .iter()
        .filter(|raw| !used.contains(raw.before.trim()))
        .cloned()
        .collect();
    debug!(
        "Supplement: {} of {} records not previously used",
        fresh.len(),
        supplement.len()
    );

    let aligned = aligner.align(&fresh, normalized_submission, reference_sentences);

    let mut befores: HashSet<String> = accepted.iter().map(|p| p.before.clone()).collect();
    let mut pairs: HashSet<(String, String)> = accepted
        .iter()
        .map(|p| (p.before.clone(), p.after.clone()))
        .collect();

    let mut added = 0;
    for point in aligned {
        if non_evaluation_count(accepted) >= required {
            break;
        }
        if befores.contains(&point.before) || pairs.contains(&(point.before.clone(), point.after.clone())) {
            continue;
        }
        befores.insert(point.before.clone());
        pairs.insert((point.before.clone(), point.after.clone()));
        accepted.push(point);
        added += 1;
    }

    accepted.sort_by_key(|p| p.sentence_number);
    info!("Merged {} supplementary points ({} total)", added, accepted.len());
    added
}

/// Placeholder text shown for a slot the learner left uncovered
pub fn placeholder_text(slot: usize) -> String {
    format!("(not submitted: source sentence {slot})")
}

/// Append a placeholder for every slot in `1..=required` with no point, then re-sort
///
/// Placeholders are only ever created here, after alignment, and are marked
/// `not_submitted` so callers can tell them from learner text.
pub fn fill_placeholders(points: &mut Vec<CorrectionPoint>, required: usize, reference_sentences: &[String]) -> usize {
    let covered: HashSet<usize> = points.iter().map(|p| p.sentence_number).collect();
    let shortage = required.saturating_sub(non_evaluation_count(points));
    if shortage == 0 {
        return 0;
    }

    let mut added = 0;
    for slot in (1..=required).filter(|slot| !covered.contains(slot)) {
        if added == shortage {
            break;
        }
        let source_sentence = reference_sentences.get(slot - 1).cloned();
        let reason = match &source_sentence {
            Some(source) => format!("No translation was found for source sentence {slot}: {source}"),
            None => format!("No translation was found for source sentence {slot}"),
        };
        let text = placeholder_text(slot);
        points.push(CorrectionPoint {
            before: text.clone(),
            after: text.clone(),
            reason,
            level: Level::Correct,
            sentence_number: slot,
            fragment: text,
            source_sentence,
            original_before: None,
            not_submitted: true,
        });
        added += 1;
    }

    points.sort_by_key(|p| p.sentence_number);
    if added > 0 {
        info!("Filled {} placeholder points up to {} required", added, required);
    }
    added
}
