// Source-side (Japanese) sentence split, used as alignment reference and for coverage counts

const JAPANESE_TERMINALS: [char; 3] = ['\u{3002}', '\u{FF01}', '\u{FF1F}']; // 。！？

/// Split Japanese source text on 。, ！ and ？, keeping the mark with its sentence
///
/// An unterminated final sentence gets a closing 。 so every entry reads as a full sentence.
pub fn split_japanese_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        current.push(ch);
        if JAPANESE_TERMINALS.contains(&ch) {
            let sentence = current.trim();
            // WHY: a bare mark (e.g. "！！" runs) belongs to nothing and is dropped
            if sentence.chars().any(|c| !JAPANESE_TERMINALS.contains(&c)) {
                sentences.push(sentence.to_string());
            }
            current.clear();
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(format!("{tail}\u{3002}"));
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_keeps_marks() {
        let sentences = split_japanese_sentences("日本は高齢化している。介護が足りない！どうするべきか？");
        assert_eq!(
            sentences,
            vec!["日本は高齢化している。", "介護が足りない！", "どうするべきか？"]
        );
    }

    #[test]
    fn test_unterminated_tail_gets_period() {
        let sentences = split_japanese_sentences("最初の文。 二番目の文");
        assert_eq!(sentences, vec!["最初の文。", "二番目の文。"]);
    }

    #[test]
    fn test_empty_and_bare_marks() {
        assert!(split_japanese_sentences("").is_empty());
        assert!(split_japanese_sentences("  ").is_empty());
        assert_eq!(split_japanese_sentences("本当に！！"), vec!["本当に！"]);
    }
}
