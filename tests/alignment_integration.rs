// Alignment of LLM correction points against normalized submissions, including the
// shortfall flow (supplement merge and placeholders)

mod integration;

use integration::{SAMPLE_ESSAY, SAMPLE_SOURCE};
use tensaku::alignment::coverage::{fill_placeholders, merge_supplement, non_evaluation_count, required_points};
use tensaku::reader::parse_points;
use tensaku::{split_japanese_sentences, CorrectionPoint, Level, PointAligner, RawPoint, SubmissionPipeline};

fn assert_invariants(points: &[CorrectionPoint], sentence_count: usize) {
    assert!(points.windows(2).all(|w| w[0].sentence_number <= w[1].sentence_number));
    for point in points {
        assert!((1..=sentence_count).contains(&point.sentence_number));
        if point.level == Level::Correct {
            assert_eq!(point.before, point.after);
        }
    }
    let mut pairs: Vec<(&str, &str)> = points.iter().map(|p| (p.before.as_str(), p.after.as_str())).collect();
    pairs.sort();
    pairs.dedup();
    assert_eq!(pairs.len(), points.len(), "duplicate (before, after) pair");
}

#[test]
fn test_llm_payload_aligned_in_document_order() {
    let pipeline = SubmissionPipeline::new().unwrap();
    let processed = pipeline.process(SAMPLE_ESSAY);
    let reference = split_japanese_sentences(SAMPLE_SOURCE);

    let raw_points = parse_points(
        r#"{"points": [
            {"before": "Second, they meet people", "after": "Second, they can meet people", "reason": "modal adds nuance", "level": "❌ error"},
            {"before": "First,they", "after": "First, they", "reason": "space after comma", "level": "error"},
            {"before": "They speak French fluently", "after": "They speak French", "level": "error"},
            {"before": "", "after": "nothing"},
            {"before": "first,they", "after": "First, they", "reason": "space after comma", "level": "error"},
            {"before": "study abroad", "after": "study overseas", "level": "💡 suggestion"}
        ]}"#,
    )
    .unwrap();

    let points = pipeline.align(&processed, &raw_points, &reference);
    assert_invariants(&points, processed.sentence_count());

    assert_eq!(points.len(), 3);
    assert_eq!(points.iter().map(|p| p.sentence_number).collect::<Vec<_>>(), vec![1, 2, 3]);

    assert_eq!(points[0].level, Level::Correct);
    assert_eq!(points[0].before, "I think students should study abroad.");

    assert_eq!(points[1].before, "First,they can learn a new language quickly.");
    assert_eq!(points[1].after, "First, they can learn a new language quickly.");
    assert_eq!(points[1].source_sentence.as_deref(), Some("第一に、新しい言語をすぐに学べる。"));

    assert_eq!(
        points[2].after,
        "Second, they can meet people from many countries because they live with them!"
    );
    assert_eq!(points[2].reason, "modal adds nuance");
}

#[test]
fn test_fragments_with_full_width_punctuation_match() {
    let pipeline = SubmissionPipeline::new().unwrap();
    let processed = pipeline.process(SAMPLE_ESSAY);

    let points = pipeline.align(
        &processed,
        &[RawPoint::new("First\u{FF0C}they").with_after("First\u{FF0C} they").with_level("error")],
        &[],
    );
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].fragment, "First,they");
    assert_eq!(points[0].after, "First, they can learn a new language quickly.");
}

#[test]
fn test_all_points_rejected_is_empty_not_error() {
    let aligner = PointAligner::new().unwrap();
    let points = aligner.align(
        &[RawPoint::new("invented text"), RawPoint::new("   ")],
        "I like apples.",
        &[],
    );
    assert!(points.is_empty());
    assert!(aligner.align(&[RawPoint::new("apples")], "", &[]).is_empty());
}

#[test]
fn test_shortfall_flow() {
    let pipeline = SubmissionPipeline::new().unwrap();
    let processed = pipeline.process(SAMPLE_ESSAY);
    let reference = split_japanese_sentences(SAMPLE_SOURCE);
    let aligner = pipeline.aligner();

    let required = required_points(SAMPLE_SOURCE, &processed.normalized, pipeline.segmenter());
    assert_eq!(required, 3);

    let mut points = aligner.align(&[RawPoint::new("study abroad")], &processed.normalized, &reference);
    assert_eq!(non_evaluation_count(&points), 1);

    // supplement repeats the used sentence and adds one new point
    let supplement = vec![
        RawPoint::new("I think students should study abroad."),
        RawPoint::new("they meet people").with_after("they met people").with_level("error"),
    ];
    let added = merge_supplement(&aligner, &mut points, &supplement, &processed.normalized, &reference, required);
    assert_eq!(added, 1);

    let filled = fill_placeholders(&mut points, required, &reference);
    assert_eq!(filled, 1);
    assert_invariants(&points, 3);

    let placeholder = points.iter().find(|p| p.not_submitted).unwrap();
    assert_eq!(placeholder.sentence_number, 2);
    assert_eq!(placeholder.source_sentence.as_deref(), Some("第一に、新しい言語をすぐに学べる。"));
    assert_eq!(points.iter().filter(|p| !p.not_submitted).count(), 2);
}

#[test]
fn test_points_serialize_for_presentation() {
    let pipeline = SubmissionPipeline::new().unwrap();
    let processed = pipeline.process("i like apple");
    let points = pipeline.align(
        &processed,
        &[RawPoint::new("like apple").with_after("like apples").with_level("error")],
        &[],
    );

    let json = serde_json::to_value(&points).unwrap();
    assert_eq!(json[0]["level"], "error");
    assert_eq!(json[0]["sentence_number"], 1);
    assert_eq!(json[0]["before"], "I like apple.");
    assert_eq!(json[0]["after"], "I like apples.");
    assert_eq!(json[0]["original_before"], "i like apple");
    assert!(json[0].get("not_submitted").is_none());
    assert!(json[0].get("source_sentence").is_none());
}

#[test]
fn test_malformed_records_do_not_sink_the_payload() {
    let pipeline = SubmissionPipeline::new().unwrap();
    let processed = pipeline.process(SAMPLE_ESSAY);

    let raw_points = parse_points(
        r#"[
            {"before": "First,they", "after": "First, they", "level": "error"},
            {"before": null, "after": "x", "level": "error"},
            {"before": ["not", "text"]},
            {"before": "Second, they meet", "reason": null, "level": null}
        ]"#,
    )
    .unwrap();
    assert_eq!(raw_points.len(), 3);

    let points = pipeline.align(&processed, &raw_points, &[]);
    assert_invariants(&points, processed.sentence_count());
    assert_eq!(points.iter().map(|p| p.sentence_number).collect::<Vec<_>>(), vec![2, 3]);
    assert_eq!(points[0].after, "First, they can learn a new language quickly.");
    assert_eq!(points[1].level, Level::Correct);
}
