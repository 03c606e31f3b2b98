// WHY: Segments normalized submissions into sentences for alignment with LLM feedback
// Boundary rule: terminal mark, whitespace, then a sentence opener

pub mod abbreviations;
pub mod japanese;

use anyhow::Result;
use regex_automata::meta::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use abbreviations::{escape_pattern, AbbreviationSet, DOT_PLACEHOLDER};
pub use japanese::split_japanese_sentences;

/// Configuration for sentence boundary detection rules
#[derive(Debug, Clone)]
pub struct SentenceBoundaryRules {
    /// End punctuation characters that can terminate a sentence
    pub end_punctuation: Vec<char>,
    /// Characters considered opening quotes
    pub opening_quotes: Vec<char>,
    /// Characters considered opening parentheticals
    pub opening_parentheticals: Vec<char>,
}

impl Default for SentenceBoundaryRules {
    fn default() -> Self {
        Self {
            end_punctuation: vec!['.', '?', '!'],
            opening_quotes: vec!['"', '\''],
            opening_parentheticals: vec!['('],
        }
    }
}

impl SentenceBoundaryRules {
    /// `[.!?]\s+[A-Z"'(]` for the default rules
    ///
    /// A sentence may open with an ASCII capital, an opening quote or an opening parenthetical.
    /// Lowercase continuations ("... apples. so does she") never start a new sentence.
    pub fn boundary_pattern(&self) -> String {
        let terminals: String = self.end_punctuation.iter().map(|c| escape_pattern(&c.to_string())).collect();
        let openers: String = self
            .opening_quotes
            .iter()
            .chain(&self.opening_parentheticals)
            .map(|c| escape_pattern(&c.to_string()))
            .collect();
        format!(r"[{terminals}]\s+[A-Z{openers}]")
    }
}

/// One sentence of a submission, indexed from 0 in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub index: usize,
    pub content: String,
}

impl Sentence {
    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// 1-based position as shown to learners
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// Abbreviation-aware sentence segmenter
///
/// Known limitation: a single-period abbreviation ("Dr.", "etc.") that really does end a
/// sentence is never treated as a boundary, so "I met the Dr. He was kind." stays one
/// sentence. Dotted abbreviations such as "U.S." keep their final period as a boundary
/// candidate when a capital letter follows.
#[derive(Debug, Clone)]
pub struct SentenceSegmenter {
    boundary: Regex,
    abbreviations: &'static AbbreviationSet,
}

impl SentenceSegmenter {
    /// Compile the boundary pattern for `rules` and attach the process-wide abbreviation set
    pub fn new(rules: SentenceBoundaryRules) -> Result<Self> {
        let pattern = rules.boundary_pattern();
        let boundary = Regex::new(&pattern)?;
        debug!("Compiled sentence boundary pattern: {}", pattern);

        Ok(Self {
            boundary,
            abbreviations: AbbreviationSet::global()?,
        })
    }

    /// Create a segmenter with default rules
    pub fn with_default_rules() -> Result<Self> {
        Self::new(SentenceBoundaryRules::default())
    }

    /// Split text into sentences. Empty or whitespace-only input yields no sentences.
    pub fn segment(&self, text: &str) -> Vec<Sentence> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        let protected = self.abbreviations.protect(trimmed);
        let mut sentences = Vec::new();
        let mut start = 0;

        for m in self.boundary.find_iter(&protected) {
            // Match spans terminal..=opener; the sentence keeps the terminal, the opener starts the next
            let terminal_end = m.start() + char_len_at(&protected, m.start());
            let opener_start = m.end() - last_char_len(&protected[..m.end()]);
            push_sentence(&mut sentences, &protected[start..terminal_end]);
            start = opener_start;
        }
        push_sentence(&mut sentences, &protected[start..]);

        debug!("Segmented {} characters into {} sentences", trimmed.len(), sentences.len());
        sentences
    }

    /// Convenience form returning only sentence text
    pub fn segment_strings(&self, text: &str) -> Vec<String> {
        self.segment(text).into_iter().map(|s| s.content).collect()
    }

    /// Format a sentence for line-oriented output: `index<TAB>content`
    pub fn format_sentence_output(&self, sentence: &Sentence) -> String {
        format!("{}\t{}", sentence.index, sentence.content)
    }
}

fn char_len_at(text: &str, at: usize) -> usize {
    text[at..].chars().next().map_or(1, char::len_utf8)
}

fn last_char_len(text: &str) -> usize {
    text.chars().next_back().map_or(0, char::len_utf8)
}

/// Drop the restore artifact, restore placeholders and keep the sentence if non-empty
fn push_sentence(sentences: &mut Vec<Sentence>, protected: &str) {
    let restored = AbbreviationSet::restore(&collapse_periods(protected));
    let content = restored.trim();
    if content.is_empty() {
        return;
    }
    sentences.push(Sentence {
        index: sentences.len(),
        content: content.to_string(),
    });
}

/// "U.S.." -> "U.S.": a period right after a protected abbreviation period is dropped
///
/// Only placeholder-then-period pairs collapse, so learner ellipses ("Wait...") survive.
fn collapse_periods(protected: &str) -> String {
    protected.replace(&format!("{DOT_PLACEHOLDER}."), &DOT_PLACEHOLDER.to_string())
}
