//! Tab expansion by display column.

use crate::ansi::{TokenKind, tokenize};

/// Replace every tab with spaces up to the next multiple of `tabstop`.
///
/// Columns are counted in display width, so wide clusters and escape
/// sequences are accounted for. A `tabstop` of 0 leaves the text unchanged.
pub fn expand_tabs(text: &str, tabstop: usize) -> String {
    if tabstop == 0 || !text.contains('\t') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + tabstop);
    let mut col = 0usize;
    for tok in tokenize(text) {
        let piece = tok.text(text);
        if tok.kind == TokenKind::Control && piece == "\t" {
            let fill = tabstop - col % tabstop;
            out.extend(std::iter::repeat_n(' ', fill));
            col += fill;
        } else {
            out.push_str(piece);
            col += tok.width;
        }
    }
    out
}
