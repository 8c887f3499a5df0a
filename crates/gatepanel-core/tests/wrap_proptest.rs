//! Property-based tests for text wrapping and the transition curve.

use gatepanel_core::graphics::easing::{ease_out_quart, transition_offset};
use gatepanel_core::messages::wrap_text;

/// Six pixels per character, like the 6x10 mono font.
fn cells(text: &str) -> u32 {
    text.chars().count() as u32 * 6
}

/// Non-whitespace characters of `lines` with wrap hyphens removed.
fn rejoined(lines: &[String]) -> String {
    lines
        .iter()
        .map(|l| l.strip_suffix('-').unwrap_or(l))
        .flat_map(|l| l.chars())
        .filter(|c| !c.is_whitespace())
        .collect()
}

proptest::proptest! {
    /// No line is wider than the limit once the limit fits a hyphenated
    /// character.
    #[test]
    fn latin_lines_fit(text in "[a-z]{1,30}( [a-z]{1,30}){0,12}", cols in 2u32..40) {
        let max = cols * 6;
        for line in wrap_text(&text, max, cells) {
            assert!(cells(&line) <= max, "{line:?} wider than {max}");
        }
    }

    /// Wrapping only moves text between lines; hyphens are the only
    /// additions.
    #[test]
    fn latin_content_is_preserved(text in "[a-z]{1,30}( [a-z]{1,30}){0,12}", cols in 2u32..40) {
        let lines = wrap_text(&text, cols * 6, cells);
        let expected: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        assert_eq!(rejoined(&lines), expected);
    }

    /// CJK text breaks between any two code points and never hyphenates.
    #[test]
    fn cjk_lines_fit_and_keep_order(text in "[\u{4e00}-\u{4e40}]{1,60}", cols in 1u32..20) {
        let max = cols * 6;
        let lines = wrap_text(&text, max, cells);
        for line in &lines {
            assert!(cells(line) <= max);
            assert!(!line.ends_with('-'));
        }
        assert_eq!(lines.concat(), text);
    }

    /// Words, ideographs and newlines interleaved: every line fits and the
    /// text comes back in order.
    #[test]
    fn mixed_script_lines_fit_and_keep_content(
        text in "([a-z]{1,12}|[\u{4e00}-\u{4e40}]{1,6}| |\n){1,30}",
        cols in 2u32..30,
    ) {
        let max = cols * 6;
        let lines = wrap_text(&text, max, cells);
        for line in &lines {
            assert!(cells(line) <= max, "{line:?} wider than {max}");
        }
        let expected: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        assert_eq!(rejoined(&lines), expected);
        let paragraphs = text.trim().lines().count();
        assert!(lines.len() >= paragraphs);
    }

    /// Transition offsets never move backwards and stay inside the width.
    #[test]
    fn transition_offsets_are_monotone(steps in 1u32..64, width in 1u32..1024) {
        let offsets: Vec<u32> = (0..steps).map(|i| transition_offset(i, steps, width)).collect();
        assert_eq!(offsets[0], 0);
        assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
        assert!(offsets.iter().all(|o| *o <= width));
    }

    #[test]
    fn ease_stays_in_unit_interval(t in -2.0f32..3.0) {
        let v = ease_out_quart(t);
        assert!((0.0..=1.0).contains(&v));
    }
}
