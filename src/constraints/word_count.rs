// WHY: deterministic counts the LLM is never trusted to produce

use anyhow::Result;
use regex_automata::meta::Regex;

use crate::normalization::normalize_punctuation;

/// Word and sentence-boundary counting over punctuation-normalized text
#[derive(Debug, Clone)]
pub struct WordCounter {
    /// Runs of word characters, apostrophes and hyphens between word boundaries
    token: Regex,
    /// Runs of terminal marks followed by whitespace
    boundary: Regex,
}

impl WordCounter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            token: Regex::new(r"\b[\w'-]+\b")?,
            boundary: Regex::new(r"[.!?]+\s+")?,
        })
    }

    /// Count English words: tokens containing at least one ASCII letter
    ///
    /// "don't" and "well-known" count once; pure Japanese or numeric tokens do not count.
    pub fn count_words(&self, text: &str) -> usize {
        if text.trim().is_empty() {
            return 0;
        }
        let normalized = normalize_punctuation(text);
        self.token
            .find_iter(&normalized)
            .filter(|m| normalized[m.range()].bytes().any(|b| b.is_ascii_alphabetic()))
            .count()
    }

    /// Count fragments separated by runs of `.`/`!`/`?` followed by whitespace
    ///
    /// Cruder than [`crate::sentence_detector::SentenceSegmenter`]: no abbreviation handling.
    pub fn count_sentence_boundaries(&self, text: &str) -> usize {
        let normalized = normalize_punctuation(text);
        let trimmed = normalized.trim();

        let mut count = 0;
        let mut last = 0;
        for m in self.boundary.find_iter(trimmed) {
            if !trimmed[last..m.start()].trim().is_empty() {
                count += 1;
            }
            last = m.end();
        }
        if !trimmed[last..].trim().is_empty() {
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> WordCounter {
        WordCounter::new().unwrap()
    }

    #[test]
    fn test_empty_and_punctuation_only() {
        let counter = counter();
        assert_eq!(counter.count_words(""), 0);
        assert_eq!(counter.count_words("   "), 0);
        assert_eq!(counter.count_words("... !!! ???"), 0);
    }

    #[test]
    fn test_compounds_and_contractions() {
        let counter = counter();
        assert_eq!(counter.count_words("This is a well-known fact about long-term effects."), 8);
        assert_eq!(counter.count_words("I don't think it's a problem."), 6);
    }

    #[test]
    fn test_full_width_input() {
        let counter = counter();
        let text = "First\u{FF0C}I like apples\u{FF0E}Second\u{FF0C}I prefer oranges\u{FF01}";
        assert_eq!(counter.count_words(text), 8);
    }

    #[test]
    fn test_japanese_and_numbers_excluded() {
        let counter = counter();
        assert_eq!(counter.count_words("日本語 text 123 and 42nd"), 3);
    }

    #[test]
    fn test_ascii_property() {
        let counter = counter();
        let text = "the quick brown fox jumps over 2 lazy dogs.";
        let expected = text
            .split_whitespace()
            .filter(|t| t.chars().any(|c| c.is_ascii_alphabetic()))
            .count();
        assert_eq!(counter.count_words(text), expected);
    }

    #[test]
    fn test_sentence_boundaries() {
        let counter = counter();
        assert_eq!(counter.count_sentence_boundaries(""), 0);
        assert_eq!(counter.count_sentence_boundaries("One. Two! Three?"), 3);
        assert_eq!(counter.count_sentence_boundaries("Wait... what?! Really"), 3);
        assert_eq!(counter.count_sentence_boundaries("No space.after period."), 1);
        assert_eq!(
            counter.count_sentence_boundaries("I like apples\u{FF0E} However\u{FF0C} I don't\u{FF1F}"),
            2
        );
    }
}
