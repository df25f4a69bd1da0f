//! Escape-aware tokenizer for styled terminal text.
//!
//! Contract:
//! - Input: one line of text that may carry SGR color sequences, other
//!   zero-width control sequences, and printable grapheme clusters.
//! - Output: ordered, non-overlapping tokens whose byte ranges cover the whole
//!   input when concatenated.
//! - Printable clusters carry their display width from [`crate::egc_width`];
//!   every other token has width 0.
//!
//! Escape sequences are recognized by feeding their bytes to a [`vte::Parser`];
//! a sequence ends on the byte that makes the parser dispatch it.

use crate::egc_width;
use unicode_segmentation::UnicodeSegmentation;
use vte::{Params, Parser, Perform};

pub const ESC: char = '\u{1b}';
/// Canonical SGR reset emitted at fold boundaries and by the colorizer.
pub const RESET: &str = "\u{1b}[m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// SGR sequence that opens (or adds to) a style run.
    Sgr,
    /// SGR sequence whose parameters are all zero / empty.
    Reset,
    /// Any other escape sequence or C0 control character.
    Control,
    /// One printable grapheme cluster.
    Cluster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize, // byte offset (inclusive)
    pub end: usize,   // byte offset (exclusive)
    pub width: usize,
}

impl Token {
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.start..self.end]
    }
}

/// True when an SGR sequence starts by clearing attributes (e.g. `ESC[0;31m`).
pub fn sgr_starts_with_reset(seq: &str) -> bool {
    seq.strip_prefix("\u{1b}[")
        .and_then(|s| s.strip_suffix('m'))
        .and_then(|p| p.split(';').next())
        .is_some_and(|first| first.chars().all(|c| c == '0'))
}

/// What the parser reported for the byte just fed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    /// The sequence completed on this byte.
    Done(TokenKind),
    /// A string sequence (OSC, DCS) closed, possibly on the ESC of an `ESC \\` terminator.
    StringEnd,
}

/// Records the first dispatch of one escape sequence.
#[derive(Debug, Default)]
struct SequenceRecorder {
    event: Option<Event>,
}

impl SequenceRecorder {
    fn finish(&mut self, event: Event) {
        self.event.get_or_insert(event);
    }
}

impl Perform for SequenceRecorder {
    fn execute(&mut self, _byte: u8) {
        self.finish(Event::Done(TokenKind::Control));
    }

    fn unhook(&mut self) {
        self.finish(Event::StringEnd);
    }

    fn osc_dispatch(&mut self, _params: &[&[u8]], bell_terminated: bool) {
        if bell_terminated {
            self.finish(Event::Done(TokenKind::Control));
        } else {
            self.finish(Event::StringEnd);
        }
    }

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], ignore: bool, action: char) {
        let kind = if action != 'm' || ignore || !intermediates.is_empty() {
            TokenKind::Control
        } else if params.iter().all(|p| p.iter().all(|&v| v == 0)) {
            TokenKind::Reset
        } else {
            TokenKind::Sgr
        };
        self.finish(Event::Done(kind));
    }

    fn esc_dispatch(&mut self, _intermediates: &[u8], _ignore: bool, _byte: u8) {
        self.finish(Event::Done(TokenKind::Control));
    }
}

/// Byte length and kind of the escape sequence at the start of `s`, which begins with ESC.
/// A sequence cut short by the end of input, or by another ESC, is a `Control` token
/// covering what was seen.
fn scan_escape(s: &str) -> (usize, TokenKind) {
    let bytes = s.as_bytes();
    let mut parser = Parser::new();
    let mut recorder = SequenceRecorder::default();
    for (i, &byte) in bytes.iter().enumerate() {
        // Outside strings, another ESC or a non-ASCII character cuts the sequence short.
        if i > 0 && (byte == 0x1b || !byte.is_ascii()) && !in_string(s, i) {
            return (i, TokenKind::Control);
        }
        parser.advance(&mut recorder, &[byte]);
        match recorder.event {
            None => {}
            Some(Event::Done(kind)) => return (char_end(s, i + 1), kind),
            Some(Event::StringEnd) => {
                let end = match (byte, bytes.get(i + 1)) {
                    (0x1b, Some(b'\\')) => i + 2,
                    // A bare ESC opens the next sequence.
                    (0x1b, _) => i,
                    _ => i + 1,
                };
                return (char_end(s, end), TokenKind::Control);
            }
        }
    }
    (bytes.len(), TokenKind::Control)
}

/// True when byte `i` sits inside an OSC or DCS string opened at the start of `s`,
/// where an ESC closes the string instead of aborting it.
fn in_string(s: &str, i: usize) -> bool {
    matches!(s.as_bytes().get(1), Some(b']' | b'P')) && i > 1
}

/// First char boundary at or after `at`.
fn char_end(s: &str, mut at: usize) -> usize {
    while !s.is_char_boundary(at) {
        at += 1;
    }
    at
}

fn push_run(run: &str, base: usize, out: &mut Vec<Token>) {
    let mut offset = base;
    for g in run.graphemes(true) {
        let is_control = g.chars().next().is_some_and(char::is_control);
        let (kind, width) = if is_control {
            (TokenKind::Control, 0)
        } else {
            (TokenKind::Cluster, egc_width(g))
        };
        out.push(Token {
            kind,
            start: offset,
            end: offset + g.len(),
            width,
        });
        offset += g.len();
    }
}

/// Split `text` into escape, control and printable-cluster tokens.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let mut run_start = 0usize;
    let mut i = 0usize;
    while let Some(rel) = text[i..].find(ESC) {
        let at = i + rel;
        if at > run_start {
            push_run(&text[run_start..at], run_start, &mut out);
        }
        let (len, kind) = scan_escape(&text[at..]);
        out.push(Token {
            kind,
            start: at,
            end: at + len,
            width: 0,
        });
        i = at + len;
        run_start = i;
    }
    if run_start < text.len() {
        push_run(&text[run_start..], run_start, &mut out);
    }
    out
}

/// Remove every escape sequence, keeping the printable text.
pub fn strip(text: &str) -> String {
    strip_ansi_escapes::strip_str(text)
}

/// Display width of styled text (escape sequences count as zero).
pub fn visible_width(text: &str) -> usize {
    tokenize(text).iter().map(|t| t.width).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(s: &str) -> Vec<TokenKind> {
        tokenize(s).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn plain_text_clusters() {
        let toks = tokenize("ab全");
        assert_eq!(toks.len(), 3);
        assert_eq!(toks[2].width, 2);
        assert_eq!(toks[2].start, 2);
        assert_eq!(toks[2].end, 5);
    }

    #[test]
    fn sgr_and_reset_classified() {
        use TokenKind::*;
        assert_eq!(
            kinds("\u{1b}[31ma\u{1b}[m\u{1b}[0mb"),
            vec![Sgr, Cluster, Reset, Reset, Cluster]
        );
    }

    #[test]
    fn erase_line_is_control() {
        assert_eq!(
            kinds("x\u{1b}[K"),
            vec![TokenKind::Cluster, TokenKind::Control]
        );
    }

    #[test]
    fn osc_terminated_by_bel() {
        let s = "\u{1b}]8;;http://x\u{7}link";
        let toks = tokenize(s);
        assert_eq!(toks[0].kind, TokenKind::Control);
        assert_eq!(toks[0].text(s), "\u{1b}]8;;http://x\u{7}");
        assert_eq!(strip(s), "link");
    }

    #[test]
    fn osc_terminated_by_string_terminator() {
        let s = "\u{1b}]8;;http://x\u{1b}\\link\u{1b}]8;;\u{1b}\\";
        let toks = tokenize(s);
        assert_eq!(toks[0].text(s), "\u{1b}]8;;http://x\u{1b}\\");
        assert_eq!(toks[1].text(s), "l");
        assert_eq!(toks.last().map(|t| t.kind), Some(TokenKind::Control));
        assert_eq!(strip(s), "link");
    }

    #[test]
    fn private_and_intermediate_csi_are_control() {
        use TokenKind::*;
        let s = "\u{1b}[?25l\u{1b}[1 qa";
        let toks = tokenize(s);
        assert_eq!(toks[0].text(s), "\u{1b}[?25l");
        assert_eq!(toks[1].text(s), "\u{1b}[1 q");
        assert_eq!(kinds(s), vec![Control, Control, Cluster]);
    }

    #[test]
    fn interrupted_sequence_ends_before_next_escape() {
        use TokenKind::*;
        let s = "\u{1b}[31\u{1b}[0m全";
        let toks = tokenize(s);
        assert_eq!(toks[0].text(s), "\u{1b}[31");
        assert_eq!(kinds(s), vec![Control, Reset, Cluster]);
        assert_eq!(visible_width(s), 2);
    }

    #[test]
    fn wide_character_after_lone_escape_keeps_its_width() {
        let s = "\u{1b}全";
        assert_eq!(tokenize(s)[0].text(s), "\u{1b}");
        assert_eq!(visible_width(s), 2);
    }

    #[test]
    fn sgr_with_subparameters_is_styled() {
        assert_eq!(kinds("\u{1b}[4:3m"), vec![TokenKind::Sgr]);
        assert_eq!(kinds("\u{1b}[0;0m"), vec![TokenKind::Reset]);
    }

    #[test]
    fn tab_is_control_token() {
        assert_eq!(kinds("a\tb")[1], TokenKind::Control);
    }

    #[test]
    fn tokens_cover_input() {
        let s = "\u{1b}[1;31mfoo\u{1b}[m bar\u{1b}[K\u{1b}";
        let toks = tokenize(s);
        let joined: String = toks.iter().map(|t| t.text(s)).collect();
        assert_eq!(joined, s);
    }

    #[test]
    fn reset_prefix_detection() {
        assert!(sgr_starts_with_reset("\u{1b}[0;31m"));
        assert!(!sgr_starts_with_reset("\u{1b}[31m"));
    }

    #[test]
    fn width_ignores_escapes() {
        assert_eq!(visible_width("\u{1b}[31m全\u{1b}[mA"), 3);
    }
}
