// WHY: raw learner typing (missing spaces, stray newlines, no final period) defeats
// punctuation-based segmentation; this repairs layout without touching spelling or grammar

use anyhow::Result;
use regex_automata::meta::Regex;
use tracing::debug;

use super::punctuation::normalize_punctuation;
use crate::sentence_detector::abbreviations::{is_initialism, AbbreviationSet};

const TERMINALS: [char; 3] = ['.', '?', '!'];
const TIGHT_PUNCTUATION: [char; 6] = ['.', ',', '?', '!', ';', ':'];

/// Terminal glued to the next word: "word.Next"
const GLUED_TERMINAL_PATTERN: &str = r"[.?!][A-Za-z]";
/// Lowercase sentence start after a terminal and whitespace
const LOWERCASE_START_PATTERN: &str = r"[.!?]\s+[a-z]";

/// Layout repair for learner submissions, with its patterns compiled once
#[derive(Debug, Clone)]
pub struct InputNormalizer {
    glued_terminal: Regex,
    lowercase_start: Regex,
    abbreviations: &'static AbbreviationSet,
}

impl InputNormalizer {
    pub fn new() -> Result<Self> {
        let normalizer = Self {
            glued_terminal: Regex::new(GLUED_TERMINAL_PATTERN)?,
            lowercase_start: Regex::new(LOWERCASE_START_PATTERN)?,
            abbreviations: AbbreviationSet::global()?,
        };
        debug!("Compiled input normalization patterns");
        Ok(normalizer)
    }

    /// Normalize a learner submission before segmentation
    ///
    /// Steps, in order: trim; full-width spaces and newline runs become single spaces; a space
    /// is inserted between `.`/`?`/`!` and a directly following letter; whitespace runs
    /// collapse; whitespace before punctuation is removed; a final `.` is appended when the
    /// text has no terminal mark; the first character and every lowercase letter after
    /// `[.!?]` + whitespace are capitalized, except after a known abbreviation.
    ///
    /// The result is idempotent: normalizing the output again returns it unchanged.
    /// Empty or whitespace-only input yields an empty string.
    pub fn normalize(&self, text: &str) -> String {
        let mut normalized = self.repair_whitespace(text);
        if normalized.is_empty() {
            return normalized;
        }

        if !normalized.ends_with(TERMINALS) {
            normalized.push('.');
        }

        let capitalized = capitalize_first(&normalized);
        self.capitalize_sentence_starts(&capitalized)
    }

    /// Full submission normalization: punctuation first, then layout repair
    pub fn normalize_submission(&self, text: &str) -> String {
        self.normalize(&normalize_punctuation(text))
    }

    /// Whitespace and punctuation-spacing repair only (no final period, no capitalization)
    ///
    /// Used on fragments quoted back by the LLM, which must still match mid-sentence text.
    pub fn repair_whitespace(&self, text: &str) -> String {
        let collapsed = collapse_whitespace(text);
        if collapsed.is_empty() {
            return collapsed;
        }
        let spaced = self.space_after_terminals(&collapsed);
        tighten_punctuation(&spaced)
    }

    /// Punctuation and whitespace repair for a quoted fragment, so it still matches
    /// mid-sentence text of a normalized submission
    pub fn normalize_fragment(&self, text: &str) -> String {
        self.repair_whitespace(&normalize_punctuation(text))
    }

    /// "word.Next" -> "word. Next", likewise after `?` and `!`
    ///
    /// Dotted forms such as "p.m." or "U.S." are left intact.
    fn space_after_terminals(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len() + 8);
        let mut last = 0;

        for m in self.glued_terminal.find_iter(text) {
            let terminal = m.start();
            if text.as_bytes()[terminal] == b'.' && inside_dotted_form(text, terminal) {
                continue;
            }
            result.push_str(&text[last..=terminal]);
            result.push(' ');
            last = terminal + 1;
        }
        result.push_str(&text[last..]);
        result
    }

    /// Uppercase a lowercase ASCII letter that follows `[.!?]` and whitespace
    fn capitalize_sentence_starts(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        let mut last = 0;

        for m in self.lowercase_start.find_iter(text) {
            let terminal = m.start();
            result.push_str(&text[last..=terminal]);
            last = terminal + 1;
            // WHY: checked against the output so far, which already carries earlier capitals
            if text.as_bytes()[terminal] == b'.' && ends_with_protected_token(&result, self.abbreviations) {
                continue;
            }
            let letter = m.end() - 1;
            result.push_str(&text[last..letter]);
            result.push(char::from(text.as_bytes()[letter].to_ascii_uppercase()));
            last = m.end();
        }
        result.push_str(&text[last..]);
        result
    }
}

/// Collapse every whitespace run (full-width spaces, `\r\n`, newlines, tabs) to one space and trim
pub fn collapse_whitespace(text: &str) -> String {
    let mut buffer = String::with_capacity(text.len());
    let mut prev_was_space = false;

    for ch in text.chars() {
        if ch.is_whitespace() {
            // WHY: a line wrap inside a sentence is not a boundary
            if !prev_was_space {
                buffer.push(' ');
                prev_was_space = true;
            }
        } else {
            buffer.push(ch);
            prev_was_space = false;
        }
    }

    buffer.trim().to_string()
}

/// True for the period in `x.y.` patterns: a lone letter before it and `letter.` after it
fn inside_dotted_form(text: &str, period: usize) -> bool {
    let mut before = text[..period].chars().rev();
    let lone_letter_before = before.next().is_some_and(|c| c.is_ascii_alphabetic())
        && !before.next().is_some_and(char::is_alphanumeric);
    let mut after = text[period + 1..].chars();
    let dotted_after = after.next().is_some_and(|c| c.is_ascii_alphabetic()) && after.next() == Some('.');
    lone_letter_before && dotted_after
}

/// "word ." -> "word.", "word , next" -> "word, next"
fn tighten_punctuation(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        if TIGHT_PUNCTUATION.contains(&ch) {
            while result.ends_with(' ') {
                result.pop();
            }
        }
        result.push(ch);
    }
    result.trim().to_string()
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_lowercase() => first.to_uppercase().chain(chars).collect(),
        _ => text.to_string(),
    }
}

fn ends_with_protected_token(text: &str, abbreviations: &AbbreviationSet) -> bool {
    if abbreviations.ends_with_abbreviation(text) {
        return true;
    }
    text.split_whitespace()
        .last()
        .is_some_and(|word| is_initialism(word.trim_start_matches(['"', '\'', '('])))
}
