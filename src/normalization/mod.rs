// WHY: normalization runs before segmentation and is kept apart from it so each
// stage can be applied (and tested) on its own

pub mod input;
pub mod punctuation;

pub use input::{collapse_whitespace, InputNormalizer};
pub use punctuation::{half_width, normalize_punctuation, normalize_punctuation_into};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_submission_pipeline() {
        let normalizer = InputNormalizer::new().unwrap();
        let raw = "First\u{FF0C}I like apples\u{FF0E}Second\u{FF0C}I prefer oranges\u{FF01}";
        assert_eq!(normalize_punctuation(raw), "First,I like apples.Second,I prefer oranges!");
        assert_eq!(
            normalizer.normalize_submission(raw),
            "First,I like apples. Second,I prefer oranges!"
        );
    }

    #[test]
    fn test_normalize_submission_idempotent() {
        let normalizer = InputNormalizer::new().unwrap();
        let raw = "according to a recent survey\u{3002}japan is aging\n so care is short";
        let once = normalizer.normalize_submission(raw);
        assert_eq!(normalizer.normalize_submission(&once), once);
        assert_eq!(once, "According to a recent survey. Japan is aging so care is short.");
    }
}
