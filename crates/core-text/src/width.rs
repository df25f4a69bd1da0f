//! Grapheme cluster display width model.
//!
//! A single authoritative function, [`egc_width`], returns the number of
//! terminal columns a grapheme cluster (EGC) occupies: 0, 1 or 2. Every
//! width decision in the fold engine flows through it.
//!
//! A cluster made only of invisible code points is 0 wide. Anything carrying
//! an emoji or regional indicator is 2 wide, so emoji composites are never
//! under-counted: an extra blank column is harmless, a missing one shifts
//! the right column. Otherwise East Asian Wide decides.

use unicode_width::UnicodeWidthChar;

const ZWJ: char = '\u{200D}';
const KEYCAP: char = '\u{20E3}';

/// Emoji blocks plus misc symbols and dingbats; skin tone modifiers fall
/// inside the first range.
fn pictographic(c: char) -> bool {
    matches!(c, '\u{1F300}'..='\u{1FAFF}' | '\u{2600}'..='\u{27BF}')
}

fn regional(c: char) -> bool {
    matches!(c, '\u{1F1E6}'..='\u{1F1FF}')
}

fn combining(c: char) -> bool {
    matches!(
        c,
        '\u{0300}'..='\u{036F}'
            | '\u{1AB0}'..='\u{1AFF}'
            | '\u{1DC0}'..='\u{1DFF}'
            | '\u{20D0}'..='\u{20FF}'
            | '\u{FE20}'..='\u{FE2F}'
    )
}

/// Never occupies a column on its own: marks, joiners, selectors.
fn invisible(c: char) -> bool {
    combining(c) || c == ZWJ || matches!(c, '\u{FE00}'..='\u{FE0F}') || c.width() == Some(0)
}

fn east_asian_wide(c: char) -> bool {
    c.width() == Some(2)
}

fn emoji_like(c: char) -> bool {
    pictographic(c) || regional(c)
}

/// Width of a cluster that is a single code point.
fn scalar_columns(c: char) -> usize {
    if c.is_ascii() {
        1
    } else if invisible(c) {
        0
    } else if emoji_like(c) || east_asian_wide(c) {
        2
    } else {
        1
    }
}

/// Width of a multi code point cluster.
fn cluster_columns(egc: &str) -> usize {
    let Some(base) = egc.chars().find(|&c| !invisible(c)) else {
        return 0;
    };
    let keycap = egc.ends_with(KEYCAP)
        && egc.starts_with(|c: char| c.is_ascii_digit() || c == '#' || c == '*');
    // Flags, ZWJ sequences, skin tones and VS16 presentations all carry a
    // pictographic or regional code point.
    if keycap || egc.chars().any(emoji_like) {
        return 2;
    }
    if egc.chars().any(combining) {
        return if east_asian_wide(base) { 2 } else { 1 };
    }
    if egc.chars().any(east_asian_wide) { 2 } else { 1 }
}

/// Return the display column width for a single grapheme cluster.
///
/// Precondition: `egc` holds exactly one grapheme cluster and no escape
/// sequences (the tokenizer strips those first). Empty input returns 0.
#[inline]
pub fn egc_width(egc: &str) -> usize {
    let mut chars = egc.chars();
    match (chars.next(), chars.next()) {
        (None, _) => 0,
        (Some(c), None) => scalar_columns(c),
        _ => cluster_columns(egc),
    }
}

/// Display width of arbitrary plain text (no escape sequences).
pub fn str_width(s: &str) -> usize {
    use unicode_segmentation::UnicodeSegmentation;
    s.graphemes(true).map(egc_width).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii() {
        assert_eq!(egc_width("a"), 1);
    }

    #[test]
    fn wide_cjk() {
        assert_eq!(egc_width("全"), 2);
        assert_eq!(egc_width("界"), 2);
    }

    #[test]
    fn fullwidth_latin() {
        assert_eq!(egc_width("Ａ"), 2);
    }

    #[test]
    fn emoji_basic() {
        assert_eq!(egc_width("😀"), 2);
    }

    #[test]
    fn combining_acute_keeps_base_width() {
        assert_eq!(egc_width("e\u{0301}"), 1);
    }

    #[test]
    fn lone_combining_mark_is_zero() {
        assert_eq!(egc_width("\u{0301}"), 0);
        assert_eq!(egc_width("\u{200D}"), 0);
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(egc_width(""), 0);
    }

    #[test]
    fn emoji_flag() {
        assert_eq!(egc_width("🇯🇵"), 2);
    }

    #[test]
    fn emoji_keycap_without_vs16() {
        assert_eq!(egc_width("2\u{20E3}"), 2);
    }

    #[test]
    fn emoji_zwj_family() {
        assert_eq!(egc_width("👨‍👩‍👧‍👦"), 2);
    }

    #[test]
    fn emoji_skin_tone() {
        assert_eq!(egc_width("👍🏻"), 2);
    }

    #[test]
    fn wide_base_with_combining_mark() {
        assert_eq!(egc_width("界\u{0301}"), 2);
    }

    #[test]
    fn single_regional_indicator_widened() {
        assert_eq!(egc_width("🇺"), 2);
    }

    #[test]
    fn str_width_mixed() {
        assert_eq!(str_width("A全B"), 4);
        assert_eq!(str_width("e\u{0301}x"), 2);
    }
}
