//! Script-aware word wrapping.
//!
//! Text is split into runs of non-CJK characters (words, separated by
//! whitespace) and single CJK code points. Words are joined with one space;
//! CJK tokens attach to their neighbours directly and may end a line anywhere.

/// True for Han, kana, Hangul and the CJK punctuation/fullwidth blocks.
pub fn is_cjk(c: char) -> bool {
    matches!(
        c as u32,
        0x1100..=0x11FF       // Hangul Jamo
        | 0x2E80..=0x2FDF     // CJK radicals, Kangxi radicals
        | 0x3000..=0x303F     // CJK symbols and punctuation
        | 0x3040..=0x309F     // Hiragana
        | 0x30A0..=0x30FF     // Katakana
        | 0x3130..=0x318F     // Hangul compatibility Jamo
        | 0x31F0..=0x31FF     // Katakana phonetic extensions
        | 0x3400..=0x4DBF     // CJK extension A
        | 0x4E00..=0x9FFF     // CJK unified ideographs
        | 0xAC00..=0xD7AF     // Hangul syllables
        | 0xF900..=0xFAFF     // CJK compatibility ideographs
        | 0xFF00..=0xFFEF     // Halfwidth and fullwidth forms
        | 0x20000..=0x2FA1F // CJK extensions B..F, compatibility supplement
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Word(&'a str),
    Cjk(&'a str),
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut word_start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() || is_cjk(c) {
            if let Some(start) = word_start.take() {
                tokens.push(Token::Word(&text[start..i]));
            }
            if !c.is_whitespace() {
                tokens.push(Token::Cjk(&text[i..i + c.len_utf8()]));
            }
        } else if word_start.is_none() {
            word_start = Some(i);
        }
    }
    if let Some(start) = word_start {
        tokens.push(Token::Word(&text[start..]));
    }
    tokens
}

/// Wrap `text` into lines no wider than `max_width` as reported by `measure`.
///
/// Explicit newlines start a new line; blank lines inside the text are kept.
/// A word wider than the line is hyphenated at the longest prefix that fits
/// together with `-`. A single character that does not fit on its own is
/// emitted alone.
pub fn wrap_text<M>(text: &str, max_width: u32, measure: M) -> Vec<String>
where
    M: Fn(&str) -> u32,
{
    let mut lines = Vec::new();
    if text.trim().is_empty() {
        return lines;
    }
    for paragraph in text.trim().lines() {
        let before = lines.len();
        wrap_paragraph(paragraph, max_width, &measure, &mut lines);
        if lines.len() == before {
            lines.push(String::new());
        }
    }
    lines
}

fn wrap_paragraph<M>(paragraph: &str, max_width: u32, measure: &M, lines: &mut Vec<String>)
where
    M: Fn(&str) -> u32,
{
    let mut current = String::new();
    let mut after_word = false;

    for token in tokenize(paragraph) {
        match token {
            Token::Cjk(c) => {
                let candidate = format!("{current}{c}");
                if !current.is_empty() && measure(&candidate) > max_width {
                    lines.push(core::mem::take(&mut current));
                    current.push_str(c);
                } else {
                    current = candidate;
                }
                after_word = false;
            }
            Token::Word(word) => {
                let candidate = if current.is_empty() {
                    word.to_owned()
                } else if after_word {
                    format!("{current} {word}")
                } else {
                    format!("{current}{word}")
                };

                if measure(&candidate) <= max_width {
                    current = candidate;
                } else {
                    if !current.is_empty() {
                        lines.push(core::mem::take(&mut current));
                    }
                    current = hyphenate(word, max_width, measure, lines).to_owned();
                }
                after_word = true;
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
}

/// Emit hyphenated fragments of `word` until the rest fits; returns the rest.
fn hyphenate<'a, M>(word: &'a str, max_width: u32, measure: &M, lines: &mut Vec<String>) -> &'a str
where
    M: Fn(&str) -> u32,
{
    let mut rest = word;
    while measure(rest) > max_width {
        let boundaries: Vec<usize> = rest.char_indices().map(|(i, _)| i).skip(1).collect();
        if boundaries.is_empty() {
            // One character wider than the line.
            break;
        }

        // Largest prefix whose hyphenated form fits; at least one character.
        let fits = |end: usize| measure(&format!("{}-", &rest[..end])) <= max_width;
        let (mut lo, mut hi) = (0usize, boundaries.len());
        while lo < hi {
            let mid = (lo + hi) / 2;
            if fits(boundaries[mid]) {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        let cut = boundaries[lo.saturating_sub(1)];

        lines.push(format!("{}-", &rest[..cut]));
        rest = &rest[cut..];
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Six pixels per character, like the 6x10 mono font.
    fn cells(text: &str) -> u32 {
        text.chars().count() as u32 * 6
    }

    #[test]
    fn classifies_scripts() {
        for c in ['中', '文', 'ひ', 'カ', '한', '。', '！'] {
            assert!(is_cjk(c), "{c:?} should be CJK");
        }
        for c in ['a', 'Z', '0', '!', '-', ' ', 'é'] {
            assert!(!is_cjk(c), "{c:?} should not be CJK");
        }
    }

    #[test]
    fn tokenizer_splits_cjk_per_code_point() {
        assert_eq!(
            tokenize("hi 你好 there"),
            vec![
                Token::Word("hi"),
                Token::Cjk("你"),
                Token::Cjk("好"),
                Token::Word("there"),
            ]
        );
    }

    #[test]
    fn greedy_latin_wrap() {
        let lines = wrap_text("the quick brown fox jumps", 60, cells);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn cjk_breaks_anywhere_without_spaces() {
        let lines = wrap_text("今天天气很好我们去公园", 30, cells);
        assert_eq!(lines, vec!["今天天气很", "好我们去公", "园"]);
    }

    #[test]
    fn mixed_scripts_do_not_gain_spaces() {
        let lines = wrap_text("OK收到 thanks", 120, cells);
        assert_eq!(lines, vec!["OK收到thanks"]);
    }

    #[test]
    fn long_word_is_hyphenated() {
        let lines = wrap_text("abcdefghijkl", 36, cells);
        assert_eq!(lines, vec!["abcde-", "fghij-", "kl"]);
    }

    #[test]
    fn newlines_start_new_lines() {
        let lines = wrap_text("line one\n\nline two", 300, cells);
        assert_eq!(lines, vec!["line one", "", "line two"]);
        assert!(wrap_text("   \n ", 300, cells).is_empty());
    }

    #[test]
    fn single_character_wider_than_line_is_kept() {
        let lines = wrap_text("a 中 b", 4, cells);
        assert_eq!(lines, vec!["a", "中", "b"]);
    }
}
