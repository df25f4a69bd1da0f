//! Width-aware folding of styled text into fixed-width cells.
//!
//! `fold` consumes as many grapheme clusters as fit into `width` columns and
//! returns the rendered segment plus the remainder that continues on the next
//! row. Escape sequences are copied through with zero width.
//!
//! Invariants:
//! - A cluster is never split; a wide cluster that does not fit in the
//!   remaining room moves to the remainder.
//! - Rendered width never exceeds `width`, except for a single cluster wider
//!   than the whole cell (consumed alone so continuation always advances).
//! - The style stack is balanced: when SGR runs are open at the end of the
//!   rendered segment a reset is appended, and the open sequences are
//!   replayed at the start of the remainder.
//! - A non-empty remainder always holds at least one printable cluster.

use crate::ansi::{RESET, Token, TokenKind, sgr_starts_with_reset, tokenize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FoldOptions {
    /// Avoid breaking inside an alphanumeric word when the word fits the next cell.
    pub onword: bool,
    /// Right-pad the rendered segment with spaces to exactly `width` columns.
    pub pad: bool,
}

impl FoldOptions {
    pub const fn new(onword: bool, pad: bool) -> Self {
        Self { onword, pad }
    }
}

/// Output of one fold call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Folded {
    pub rendered: String,
    pub remainder: String,
    /// Visible columns of `rendered`, padding included.
    pub width: usize,
}

fn is_word_cluster(tok: &Token, src: &str) -> bool {
    tok.kind == TokenKind::Cluster
        && tok.width == 1
        && tok
            .text(src)
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
}

/// Move `idx` left over style-opening sequences so they travel with the text
/// they precede.
fn back_over_style_starts(tokens: &[Token], mut idx: usize) -> usize {
    while idx > 0 && tokens[idx - 1].kind == TokenKind::Sgr {
        idx -= 1;
    }
    idx
}

/// Index of the first token left for the remainder under greedy filling.
fn greedy_cut(tokens: &[Token], width: usize) -> usize {
    let mut room = width;
    for (i, tok) in tokens.iter().enumerate() {
        if tok.kind != TokenKind::Cluster {
            continue;
        }
        if tok.width > room {
            if room == width && tok.width > width {
                // Oversized cluster in an empty cell.
                room = 0;
                continue;
            }
            return back_over_style_starts(tokens, i);
        }
        room -= tok.width;
    }
    tokens.len()
}

/// Pull a word split by the greedy cut back into the remainder when the whole
/// word then fits the next cell.
fn word_cut(tokens: &[Token], src: &str, cut: usize, width: usize) -> usize {
    let Some(first_left) = tokens[cut..].iter().find(|t| t.kind == TokenKind::Cluster) else {
        return cut;
    };
    if !is_word_cluster(first_left, src) {
        return cut;
    }
    let next_w: usize = tokens[cut..]
        .iter()
        .filter(|t| t.kind == TokenKind::Cluster)
        .take_while(|t| is_word_cluster(t, src))
        .map(|t| t.width)
        .sum();

    let mut start = cut;
    let mut deferred_w = 0usize;
    for i in (0..cut).rev() {
        let tok = &tokens[i];
        match tok.kind {
            TokenKind::Cluster if is_word_cluster(tok, src) => {
                start = i;
                deferred_w += tok.width;
            }
            TokenKind::Cluster => break,
            _ => {}
        }
    }
    if deferred_w == 0 {
        return cut;
    }
    let consumed_w: usize = tokens[..cut].iter().map(|t| t.width).sum();
    if deferred_w < consumed_w && deferred_w + next_w <= width {
        back_over_style_starts(tokens, start)
    } else {
        cut
    }
}

/// Fold one line of styled text into a cell of `width` columns.
///
/// Precondition: `width > 0`. Callers validate the layout before rendering.
pub fn fold(text: &str, width: usize, opts: FoldOptions) -> Folded {
    debug_assert!(width > 0, "fold width must be positive");
    let tokens = tokenize(text);
    let mut cut = greedy_cut(&tokens, width);
    if opts.onword && cut < tokens.len() {
        cut = word_cut(&tokens, text, cut, width);
    }

    let mut rendered = String::with_capacity(text.len().min(width * 4) + 8);
    let mut open: Vec<&str> = Vec::new();
    let mut visible = 0usize;
    for tok in &tokens[..cut] {
        let piece = tok.text(text);
        rendered.push_str(piece);
        visible += tok.width;
        match tok.kind {
            TokenKind::Reset => open.clear(),
            TokenKind::Sgr => {
                if sgr_starts_with_reset(piece) {
                    open.clear();
                }
                open.push(piece);
            }
            TokenKind::Control | TokenKind::Cluster => {}
        }
    }

    let mut remainder = String::new();
    if !open.is_empty() {
        rendered.push_str(RESET);
        if cut < tokens.len() {
            for seq in &open {
                remainder.push_str(seq);
            }
        }
    }
    if let Some(tok) = tokens.get(cut) {
        remainder.push_str(&text[tok.start..]);
    }

    if opts.pad && visible < width {
        rendered.extend(std::iter::repeat_n(' ', width - visible));
        visible = width;
    }

    Folded {
        rendered,
        remainder,
        width: visible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi::strip;
    use pretty_assertions::assert_eq;

    const PAD: FoldOptions = FoldOptions::new(false, true);
    const WORD: FoldOptions = FoldOptions::new(true, false);

    fn cells(text: &str, width: usize, opts: FoldOptions) -> Vec<String> {
        let mut out = Vec::new();
        let mut rest = text.to_string();
        loop {
            let f = fold(&rest, width, opts);
            out.push(f.rendered);
            if f.remainder.is_empty() {
                break;
            }
            rest = f.remainder;
        }
        out
    }

    #[test]
    fn fits_entirely() {
        let f = fold("abc", 5, FoldOptions::default());
        assert_eq!(f.rendered, "abc");
        assert_eq!(f.remainder, "");
        assert_eq!(f.width, 3);
    }

    #[test]
    fn wide_cluster_never_split() {
        assert_eq!(cells("A全B", 2, PAD), vec!["A ", "全", "B "]);
    }

    #[test]
    fn exact_fit_leaves_no_remainder() {
        let f = fold("全全", 4, FoldOptions::default());
        assert_eq!(f.rendered, "全全");
        assert!(f.remainder.is_empty());
    }

    #[test]
    fn combining_mark_travels_with_base() {
        let f = fold("ae\u{0301}b", 2, FoldOptions::default());
        assert_eq!(f.rendered, "ae\u{0301}");
        assert_eq!(f.remainder, "b");
    }

    #[test]
    fn open_color_reset_and_replayed() {
        let f = fold("\u{1b}[31mabcdef\u{1b}[m", 3, FoldOptions::default());
        assert_eq!(f.rendered, "\u{1b}[31mabc\u{1b}[m");
        assert_eq!(f.remainder, "\u{1b}[31mdef\u{1b}[m");
        let g = fold(&f.remainder, 3, FoldOptions::default());
        assert_eq!(g.rendered, "\u{1b}[31mdef\u{1b}[m");
        assert!(g.remainder.is_empty());
    }

    #[test]
    fn nested_styles_replayed_in_order() {
        let f = fold("\u{1b}[1m\u{1b}[31mabcd", 2, FoldOptions::default());
        assert_eq!(f.remainder, "\u{1b}[1m\u{1b}[31mcd");
    }

    #[test]
    fn color_start_at_cut_moves_to_remainder() {
        let f = fold("ab\u{1b}[32mcd\u{1b}[m", 2, FoldOptions::default());
        assert_eq!(f.rendered, "ab");
        assert_eq!(f.remainder, "\u{1b}[32mcd\u{1b}[m");
    }

    #[test]
    fn trailing_reset_absorbed() {
        let f = fold("\u{1b}[31mab\u{1b}[mcd", 2, FoldOptions::default());
        assert_eq!(f.rendered, "\u{1b}[31mab\u{1b}[m");
        assert_eq!(f.remainder, "cd");
    }

    #[test]
    fn unclosed_style_is_balanced() {
        let f = fold("\u{1b}[31mab", 5, FoldOptions::default());
        assert_eq!(f.rendered, "\u{1b}[31mab\u{1b}[m");
        assert!(f.remainder.is_empty());
    }

    #[test]
    fn control_sequences_are_zero_width() {
        let f = fold("ab\u{1b}[Kcd", 4, FoldOptions::default());
        assert_eq!(f.width, 4);
        assert!(f.remainder.is_empty());
    }

    #[test]
    fn oversized_cluster_in_narrow_cell_still_progresses() {
        assert_eq!(cells("全x", 1, FoldOptions::default()), vec!["全", "x"]);
    }

    #[test]
    fn padding_fills_cell() {
        let f = fold("ab", 5, PAD);
        assert_eq!(f.rendered, "ab   ");
        assert_eq!(f.width, 5);
    }

    #[test]
    fn padding_after_reset() {
        let f = fold("\u{1b}[31mab", 4, PAD);
        assert_eq!(f.rendered, "\u{1b}[31mab\u{1b}[m  ");
    }

    #[test]
    fn onword_defers_split_word() {
        assert_eq!(cells("foo barbaz", 8, WORD), vec!["foo ", "barbaz"]);
        assert_eq!(
            cells("foo barbaz", 8, FoldOptions::default()),
            vec!["foo barb", "az"]
        );
    }

    #[test]
    fn onword_keeps_greedy_split_for_long_word() {
        assert_eq!(cells("ab abcdefghij", 6, WORD), vec!["ab abc", "defghi", "j"]);
    }

    #[test]
    fn onword_never_empties_the_row() {
        assert_eq!(cells("abcdef", 4, WORD), vec!["abcd", "ef"]);
    }

    #[test]
    fn onword_carries_color_with_word() {
        let f = fold("ab \u{1b}[31mcdef\u{1b}[m", 5, WORD);
        assert_eq!(f.rendered, "ab ");
        assert_eq!(f.remainder, "\u{1b}[31mcdef\u{1b}[m");
    }

    #[test]
    fn onword_ignores_punctuation_boundary() {
        assert_eq!(cells("abc, def", 5, WORD), vec!["abc, ", "def"]);
    }

    #[test]
    fn visible_text_preserved_across_rows() {
        let src = "\u{1b}[33mhello\u{1b}[m 世界 wide\tend";
        let joined: String = cells(src, 3, FoldOptions::default())
            .iter()
            .map(|c| strip(c))
            .collect();
        assert_eq!(joined, strip(src));
    }
}
