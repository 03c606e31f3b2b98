// WHY: learners typing through a Japanese IME produce full-width punctuation that
// breaks every ASCII-based rule downstream, so this runs before anything else

/// Map a full-width (or typographic) punctuation character to its half-width ASCII form
///
/// Every output is plain ASCII and never itself a key, so the mapping is idempotent and
/// the order in which substitutions are applied does not matter.
pub fn half_width(ch: char) -> Option<char> {
    let mapped = match ch {
        '\u{3002}' | '\u{FF0E}' => '.',             // 。 ．
        '\u{FF0C}' | '\u{3001}' => ',',             // ， 、
        '\u{FF1F}' => '?',                          // ？
        '\u{FF01}' => '!',                          // ！
        '\u{FF1A}' => ':',                          // ：
        '\u{FF1B}' => ';',                          // ；
        '\u{201C}' | '\u{201D}' | '\u{FF02}' => '"',  // “ ” ＂
        '\u{2018}' | '\u{2019}' | '\u{FF07}' => '\'', // ‘ ’ ＇
        '\u{FF08}' => '(',                          // （
        '\u{FF09}' => ')',                          // ）
        '\u{3000}' => ' ',                          // ideographic space
        '\u{30FC}' | '\u{FF0D}' | '\u{2014}' | '\u{2013}' => '-', // ー － — –
        _ => return None,
    };
    Some(mapped)
}

/// Replace full-width punctuation and spacing with half-width equivalents
pub fn normalize_punctuation(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    normalize_punctuation_into(text, &mut result);
    result
}

/// Normalize punctuation into a supplied buffer
/// WHY: batch callers reuse one buffer across many submissions
pub fn normalize_punctuation_into(text: &str, buffer: &mut String) {
    buffer.clear();
    buffer.reserve(text.len());
    buffer.extend(text.chars().map(|ch| half_width(ch).unwrap_or(ch)));
}
