// WHY: Centralized abbreviation handling for sentence boundary detection
// Periods inside these spans are swapped for a placeholder before splitting and restored after

use anyhow::Result;
use regex_automata::{meta::Regex, Input};
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::debug;

/// Private-use character standing in for a protected period during segmentation
pub const DOT_PLACEHOLDER: char = '\u{E000}';

/// Abbreviations whose periods must never end a sentence
///
/// Entries starting with a capital letter (titles, months, days, "U.S.") match only in that
/// exact case, so ordinary words such as "sun." or "sat." are not mistaken for day names.
/// Lowercase entries match in any case ("P.M.", "E.g.").
pub const ABBREVIATIONS: &[&str] = &[
    "a.m.", "p.m.", "e.g.", "i.e.", "etc.",
    "Mr.", "Mrs.", "Ms.", "Dr.", "Prof.",
    "U.S.", "U.K.", "vs.", "vol.", "fig.",
    "Jan.", "Feb.", "Mar.", "Apr.", "Aug.", "Sep.", "Oct.", "Nov.", "Dec.",
    "Mon.", "Tue.", "Wed.", "Thu.", "Fri.", "Sat.", "Sun.",
];

/// "A. B." initials; only the first period is protected per match
const INITIALS_PATTERN: &str = r"\b[A-Z]\.\s*[A-Z]\.";
const DECIMAL_PATTERN: &str = r"[0-9]\.[0-9]";

/// Characters stripped from a token before it is compared against the set
const TOKEN_WRAPPERS: &[char] = &['"', '\'', '(', '[', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}'];

static GLOBAL: OnceLock<AbbreviationSet> = OnceLock::new();

/// Read-only abbreviation lookup shared by the input normalizer and the segmenter
#[derive(Debug, Clone)]
pub struct AbbreviationSet {
    /// Alternation of every entry, longest first so "Mrs." wins over "Mr."
    entry_pattern: Regex,
    initials: Regex,
    decimals: Regex,
    /// Capitalized entries, compared exactly
    exact: HashSet<String>,
    /// Lowercase entries, compared after ASCII lowercasing
    folded: HashSet<String>,
}

impl AbbreviationSet {
    /// Create a set from the built-in abbreviation list
    pub fn new() -> Result<Self> {
        Self::from_entries(ABBREVIATIONS.iter().copied())
    }

    /// Create a set from custom entries; every entry is expected to end with a period
    pub fn from_entries<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut exact = HashSet::new();
        let mut folded = HashSet::new();
        let mut ordered: Vec<&str> = Vec::new();
        for entry in entries {
            let inserted = if is_case_sensitive(entry) {
                exact.insert(entry.to_string())
            } else {
                folded.insert(entry.to_ascii_lowercase())
            };
            if inserted {
                ordered.push(entry);
            }
        }
        ordered.sort_by(|a, b| b.len().cmp(&a.len()));

        let alternation = ordered
            .iter()
            .map(|entry| {
                if is_case_sensitive(entry) {
                    escape_pattern(entry)
                } else {
                    format!("(?i:{})", escape_pattern(entry))
                }
            })
            .collect::<Vec<_>>()
            .join("|");
        // WHY: an empty alternation would match everywhere
        let entry_pattern = if alternation.is_empty() {
            Regex::new_many::<&str>(&[])?
        } else {
            Regex::new(&format!(r"\b(?:{alternation})"))?
        };

        debug!("Compiled abbreviation pattern with {} entries", ordered.len());

        Ok(Self {
            entry_pattern,
            initials: Regex::new(INITIALS_PATTERN)?,
            decimals: Regex::new(DECIMAL_PATTERN)?,
            exact,
            folded,
        })
    }

    /// Process-wide default set, compiled on first use
    pub fn global() -> Result<&'static AbbreviationSet> {
        if let Some(set) = GLOBAL.get() {
            return Ok(set);
        }
        let set = Self::new()?;
        Ok(GLOBAL.get_or_init(|| set))
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.folded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if a word is a known abbreviation
    pub fn is_abbreviation(&self, word: &str) -> bool {
        self.exact.contains(word) || self.folded.contains(&word.to_ascii_lowercase())
    }

    /// Check if text ends with a token whose final period belongs to an abbreviation
    /// or to a dotted initialism such as "U.S.A." or "x.y."
    pub fn ends_with_abbreviation(&self, text: &str) -> bool {
        let Some(last_word) = text.split_whitespace().last() else {
            return false;
        };
        let clean_word = last_word.trim_start_matches(TOKEN_WRAPPERS);
        self.is_abbreviation(clean_word) || is_initialism(clean_word)
    }

    /// Replace protected periods with [`DOT_PLACEHOLDER`]
    ///
    /// Order matters: known abbreviations first, then single-letter initials, then decimals.
    pub fn protect(&self, text: &str) -> String {
        let text = self.protect_abbreviations(text);
        let text = protect_first_period(&self.initials, &text);
        protect_first_period(&self.decimals, &text)
    }

    /// Undo [`AbbreviationSet::protect`]
    pub fn restore(text: &str) -> String {
        text.replace(DOT_PLACEHOLDER, ".")
    }

    fn protect_abbreviations(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len() + 16);
        let mut last = 0;

        for m in self.entry_pattern.find_iter(text) {
            let span = &text[m.range()];
            // WHY: "U.S. It" keeps its final period as a boundary candidate; single-period
            // titles like "Dr. Smith" are always protected
            let keep_final = span.matches('.').count() > 1 && followed_by_space_and_uppercase(&text[m.end()..]);

            result.push_str(&text[last..m.start()]);
            let (body, tail) = if keep_final {
                span.split_at(span.len() - 1)
            } else {
                (span, "")
            };
            result.extend(body.chars().map(|c| if c == '.' { DOT_PLACEHOLDER } else { c }));
            result.push_str(tail);
            last = m.end();
        }
        result.push_str(&text[last..]);
        result
    }
}

/// Escape regex metacharacters so `text` matches literally
pub fn escape_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        if matches!(
            ch,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$' | '#' | '&' | '-' | '~'
        ) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// A token made only of single letters each followed by a period, at least two of them
pub fn is_initialism(token: &str) -> bool {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() < 4 || chars.len() % 2 != 0 {
        return false;
    }
    chars
        .chunks(2)
        .all(|pair| pair[0].is_ascii_alphabetic() && pair[1] == '.')
}

fn is_case_sensitive(entry: &str) -> bool {
    entry.starts_with(|c: char| c.is_ascii_uppercase())
}

fn followed_by_space_and_uppercase(rest: &str) -> bool {
    let after_space = rest.trim_start();
    after_space.len() < rest.len() && after_space.starts_with(|c: char| c.is_ascii_uppercase())
}

/// Protect the first period of every match of `pattern`, where each match starts with one
/// ASCII character followed by that period
///
/// Matches may overlap ("J. K. R.", "1.2.3"), so the search resumes right after the
/// protected period instead of at the match end.
fn protect_first_period(pattern: &Regex, text: &str) -> String {
    let mut periods = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let Some(m) = pattern.search(&Input::new(text).span(start..text.len())) else {
            break;
        };
        periods.push(m.start() + 1);
        start = m.start() + 2;
    }
    if periods.is_empty() {
        return text.to_string();
    }

    let mut result = String::with_capacity(text.len() + 2 * periods.len());
    let mut last = 0;
    for period in periods {
        result.push_str(&text[last..period]);
        result.push(DOT_PLACEHOLDER);
        last = period + 1;
    }
    result.push_str(&text[last..]);
    result
}
