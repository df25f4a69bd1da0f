//! Field-based colorizer for the side-by-side view.
//!
//! A [`Colormap`] resolves each [`FieldName`] to a [`ColorSpec`]; the
//! [`Colorizer`] compiles every field into start/end SGR sequences once and
//! caches them for the rest of the run.

use std::cell::OnceCell;

use core_text::ansi::{TokenKind, tokenize};
use thiserror::Error;

pub mod colormap;
pub mod field;
pub mod spec;

pub use colormap::{Colormap, Override, glob_match};
pub use field::FieldName;
pub use spec::{Color, ColorSpec, Compiled, Effects, Palette, cube_index, quantize};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("unknown color code '{code}' in \"{spec}\"")]
    UnknownCode { spec: String, code: char },
    #[error("invalid color spec \"{spec}\": {reason}")]
    BadSpec { spec: String, reason: &'static str },
    #[error("colormap entry \"{0}\" must look like PATTERN=SPEC")]
    BadOverride(String),
    #[error("unknown color field \"{0}\"")]
    UnknownField(String),
}

/// Compiled-color cache, write-once per field.
#[derive(Debug)]
pub struct Colorizer {
    colormap: Colormap,
    palette: Palette,
    enabled: bool,
    cache: [OnceCell<Compiled>; FieldName::COUNT],
}

impl Colorizer {
    pub fn new(colormap: Colormap, palette: Palette, enabled: bool) -> Self {
        Self {
            colormap,
            palette,
            enabled,
            cache: std::array::from_fn(|_| OnceCell::new()),
        }
    }

    /// Colorizer that never emits escape sequences.
    pub fn disabled() -> Self {
        Self::new(Colormap::default(), Palette::default(), false)
    }

    /// Start/end sequences for `field`, compiled on first use.
    pub fn compiled(&self, field: FieldName) -> &Compiled {
        self.cache[field.index()].get_or_init(|| {
            let spec = self.colormap.resolve(field);
            if self.enabled {
                spec.compile(self.palette)
            } else {
                Compiled {
                    expand: spec.expand,
                    ..Compiled::default()
                }
            }
        })
    }

    /// Whether `field` asks for its color run to cover the full cell width.
    pub fn expand(&self, field: FieldName) -> bool {
        self.compiled(field).expand
    }

    /// Wrap every non-empty run of `text` in the field's sequences.
    ///
    /// Runs are split at embedded resets and newlines so the field color is
    /// restored after any reset carried by the input text.
    pub fn colorize(&self, field: FieldName, text: &str) -> String {
        let compiled = self.compiled(field);
        if compiled.is_plain() || text.is_empty() {
            return text.to_string();
        }
        let mut out = String::with_capacity(text.len() + 16);
        let mut run_start: Option<usize> = None;
        let flush = |out: &mut String, run: &str| {
            if !run.is_empty() {
                out.push_str(&compiled.start);
                out.push_str(run);
                out.push_str(&compiled.end);
            }
        };
        for tok in tokenize(text) {
            let piece = tok.text(text);
            let boundary = tok.kind == TokenKind::Reset
                || (tok.kind == TokenKind::Control && piece.contains('\n'));
            if boundary {
                if let Some(start) = run_start.take() {
                    flush(&mut out, &text[start..tok.start]);
                }
                if tok.kind == TokenKind::Control {
                    out.push_str(piece);
                }
            } else if run_start.is_none() {
                run_start = Some(tok.start);
            }
        }
        if let Some(start) = run_start {
            flush(&mut out, &text[start..]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn colorizer(overrides: &[&str]) -> Colorizer {
        Colorizer::new(
            Colormap::with_overrides(overrides).unwrap(),
            Palette::Ansi256,
            true,
        )
    }

    #[test]
    fn compile_is_cached_and_deterministic() {
        let c = colorizer(&[]);
        let first = c.compiled(FieldName::OldText).clone();
        let second = c.compiled(FieldName::OldText);
        assert_eq!(&first, second);
        assert!(std::ptr::eq(
            c.compiled(FieldName::OldText),
            c.compiled(FieldName::OldText)
        ));
    }

    #[test]
    fn cube_corner_fields() {
        let c = colorizer(&["OTEXT=000", "NTEXT=555"]);
        assert_eq!(c.compiled(FieldName::OldText).start, "\u{1b}[38;5;16m");
        assert_eq!(c.compiled(FieldName::NewText).start, "\u{1b}[38;5;231m");
    }

    #[test]
    fn wraps_plain_text() {
        let c = colorizer(&["OTEXT=R"]);
        assert_eq!(
            c.colorize(FieldName::OldText, "abc"),
            "\u{1b}[31mabc\u{1b}[m"
        );
    }

    #[test]
    fn restarts_after_embedded_reset() {
        let c = colorizer(&["OTEXT=R"]);
        let text = "ab\u{1b}[7mcd\u{1b}[mef";
        assert_eq!(
            c.colorize(FieldName::OldText, text),
            "\u{1b}[31mab\u{1b}[7mcd\u{1b}[m\u{1b}[31mef\u{1b}[m"
        );
    }

    #[test]
    fn skips_empty_runs() {
        let c = colorizer(&["OTEXT=R"]);
        assert_eq!(c.colorize(FieldName::OldText, "\u{1b}[m"), "");
        assert_eq!(c.colorize(FieldName::OldText, ""), "");
    }

    #[test]
    fn newline_kept_outside_color() {
        let c = colorizer(&["OTEXT=R"]);
        assert_eq!(
            c.colorize(FieldName::OldText, "a\nb"),
            "\u{1b}[31ma\u{1b}[m\n\u{1b}[31mb\u{1b}[m"
        );
    }

    #[test]
    fn disabled_is_identity_but_keeps_expand() {
        let c = Colorizer::new(
            Colormap::with_overrides(["OTEXT=RE"]).unwrap(),
            Palette::Ansi256,
            false,
        );
        assert_eq!(c.colorize(FieldName::OldText, "abc"), "abc");
        assert!(c.expand(FieldName::OldText));
    }

    #[test]
    fn plain_field_leaves_embedded_escapes() {
        let c = colorizer(&[]);
        let text = "a\u{1b}[31mb\u{1b}[m";
        assert_eq!(c.colorize(FieldName::UnchangedText, text), text);
    }
}
