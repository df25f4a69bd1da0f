//! Column composer: logical rows to printed lines.
//!
//! Each side of a row is laid out as mark, optional line number, then the
//! folded text cell (or number, cell, mark when the mark sits on the right).
//! A row keeps printing continuation lines until both sides' remainders are
//! empty; continuation lines carry the continuation glyph and no number.
//!
//! The old cell is always padded to its full width so the new column lines
//! up. Padding falls inside the color run only for `expand` fields.

use core_color::{Colorizer, FieldName};
use core_config::{MarkPosition, RenderConfig};
use core_text::{FoldOptions, expand_tabs, fold};
use tracing::debug;

use crate::RenderError;
use crate::rows::{Cell, Row};

/// Narrowest usable cell: one double-width cluster.
const MIN_CELL: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Old,
    New,
}

/// Color roles of one side of one row kind.
#[derive(Debug, Clone, Copy)]
struct Roles {
    mark: Option<FieldName>,
    line: Option<FieldName>,
    text: FieldName,
}

const OLD_LINE: Roles = Roles {
    mark: Some(FieldName::OldMark),
    line: Some(FieldName::OldLine),
    text: FieldName::OldText,
};
const NEW_LINE: Roles = Roles {
    mark: Some(FieldName::NewMark),
    line: Some(FieldName::NewLine),
    text: FieldName::NewText,
};
const SAME_LINE: Roles = Roles {
    mark: Some(FieldName::UnchangedMark),
    line: Some(FieldName::UnchangedLine),
    text: FieldName::UnchangedText,
};

const fn header(text: FieldName) -> Roles {
    Roles {
        mark: None,
        line: None,
        text,
    }
}

/// One side's content for a logical row.
struct Part<'r> {
    text: &'r str,
    number: Option<usize>,
    glyph: char,
    roles: Roles,
}

impl<'r> Part<'r> {
    fn header(text: &'r str, field: FieldName) -> Self {
        Self {
            text,
            number: None,
            glyph: ' ',
            roles: header(field),
        }
    }

    fn line(cell: &'r Cell, glyph: char, roles: Roles) -> Self {
        Self {
            text: &cell.text,
            number: Some(cell.number),
            glyph,
            roles,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Composer {
    config: RenderConfig,
    old_cell: usize,
    new_cell: usize,
}

impl Composer {
    /// Compute cell widths; fails when either cell cannot hold a wide cluster.
    pub fn new(config: &RenderConfig) -> Result<Self, RenderError> {
        let half = config.width / 2;
        let number = if config.number { config.digit + 1 } else { 0 };
        let cell = |mark: MarkPosition| half.saturating_sub(mark.width() + number);
        let old_cell = cell(config.old_mark);
        let new_cell = cell(config.new_mark);
        if old_cell < MIN_CELL || new_cell < MIN_CELL {
            let widest = config.old_mark.width().max(config.new_mark.width());
            return Err(RenderError::WidthTooSmall {
                width: config.width,
                needed: 2 * (MIN_CELL + widest + number),
            });
        }
        debug!(target: "render.compose", width = config.width, old_cell, new_cell, "cell_widths");
        Ok(Self {
            config: config.clone(),
            old_cell,
            new_cell,
        })
    }

    pub fn cell_widths(&self) -> (usize, usize) {
        (self.old_cell, self.new_cell)
    }

    /// Printed lines for one logical row, without line terminators.
    pub fn compose(&self, colorizer: &Colorizer, row: &Row) -> Vec<String> {
        let glyphs = self.config.glyphs;
        let (old_glyph, new_glyph) = if self.config.view {
            (' ', ' ')
        } else {
            (glyphs.old, glyphs.new)
        };
        match row {
            Row::Passthrough(line) => vec![line.clone()],
            Row::Command { old, new } => self.columns(
                colorizer,
                Some(Part::header(old, FieldName::OldCommand)),
                Some(Part::header(new, FieldName::NewCommand)),
            ),
            Row::File { old, new } => self.columns(
                colorizer,
                Some(Part::header(old, FieldName::OldFile)),
                Some(Part::header(new, FieldName::NewFile)),
            ),
            Row::Unchanged { old, new } => self.columns(
                colorizer,
                Some(Part::line(old, glyphs.same, SAME_LINE)),
                Some(Part::line(new, glyphs.same, SAME_LINE)),
            ),
            Row::Changed { old, new } => self.columns(
                colorizer,
                old.as_ref().map(|c| Part::line(c, old_glyph, OLD_LINE)),
                new.as_ref().map(|c| Part::line(c, new_glyph, NEW_LINE)),
            ),
        }
    }

    fn columns(&self, colorizer: &Colorizer, old: Option<Part<'_>>, new: Option<Part<'_>>) -> Vec<String> {
        let tabstop = self.config.tabstop;
        let mut old_rem = old.as_ref().map(|p| expand_tabs(p.text, tabstop));
        let mut new_rem = new.as_ref().map(|p| expand_tabs(p.text, tabstop));
        let pending = |r: &Option<String>| r.as_ref().is_some_and(|s| !s.is_empty());

        let mut lines = Vec::new();
        let mut first = true;
        loop {
            let mut line = self.side(colorizer, Side::Old, old.as_ref(), &mut old_rem, first);
            line.push_str(&self.side(colorizer, Side::New, new.as_ref(), &mut new_rem, first));
            lines.push(line);
            if self.config.truncate || (!pending(&old_rem) && !pending(&new_rem)) {
                break;
            }
            first = false;
        }
        lines
    }

    fn side(
        &self,
        colorizer: &Colorizer,
        side: Side,
        part: Option<&Part<'_>>,
        rem: &mut Option<String>,
        first: bool,
    ) -> String {
        let (cell, position) = match side {
            Side::Old => (self.old_cell, self.config.old_mark),
            Side::New => (self.new_cell, self.config.new_mark),
        };
        let opts = FoldOptions::new(self.config.onword, false);
        let content = match (part, rem.as_mut()) {
            (Some(part), Some(text)) if first || !text.is_empty() => {
                let folded = fold(text, cell, opts);
                *text = folded.remainder.clone();
                Some((part, folded))
            }
            _ => None,
        };
        let pad_cell = side == Side::Old || position == MarkPosition::Right;
        if content.is_none() && !pad_cell {
            return String::new();
        }

        let mark = match &content {
            Some((part, _)) => {
                let glyph = if first {
                    part.glyph
                } else {
                    self.config.glyphs.continuation
                };
                match part.roles.mark {
                    Some(field) if glyph != ' ' => colorizer.colorize(field, &glyph.to_string()),
                    _ => " ".to_string(),
                }
            }
            None => " ".to_string(),
        };

        let mut number = String::new();
        if self.config.number {
            let digit = self.config.digit;
            match &content {
                Some((Part { number: Some(n), roles, .. }, _)) if first => {
                    let digits = format!("{n:>digit$}");
                    number.push_str(&match roles.line {
                        Some(field) => colorizer.colorize(field, &digits),
                        None => digits,
                    });
                    number.push(' ');
                }
                _ => number.push_str(&" ".repeat(digit + 1)),
            }
        }

        let text = match &content {
            Some((part, folded)) => {
                let fill = " ".repeat(cell.saturating_sub(folded.width));
                if colorizer.expand(part.roles.text) {
                    colorizer.colorize(part.roles.text, &(folded.rendered.clone() + &fill))
                } else if pad_cell {
                    colorizer.colorize(part.roles.text, &folded.rendered) + &fill
                } else {
                    colorizer.colorize(part.roles.text, &folded.rendered)
                }
            }
            None if pad_cell => " ".repeat(cell),
            None => String::new(),
        };

        match position {
            MarkPosition::Left => mark + &number + &text,
            MarkPosition::Right => number + &text + &mark,
            MarkPosition::None => number + &text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_color::{Colormap, Palette};
    use pretty_assertions::assert_eq;

    fn config(width: usize) -> RenderConfig {
        RenderConfig {
            width,
            ..RenderConfig::default()
        }
    }

    fn changed(old: Option<(usize, &str)>, new: Option<(usize, &str)>) -> Row {
        Row::Changed {
            old: old.map(|(n, t)| Cell::new(n, t)),
            new: new.map(|(n, t)| Cell::new(n, t)),
        }
    }

    #[test]
    fn plain_changed_row() {
        let c = Composer::new(&config(20)).unwrap();
        assert_eq!(c.cell_widths(), (9, 9));
        let lines = c.compose(&Colorizer::disabled(), &changed(Some((1, "foo")), Some((1, "bar"))));
        assert_eq!(lines, vec!["-foo      +bar"]);
    }

    #[test]
    fn missing_side_is_blank_without_mark() {
        let c = Composer::new(&config(20)).unwrap();
        let lines = c.compose(&Colorizer::disabled(), &changed(None, Some((2, "baz"))));
        assert_eq!(lines, vec!["          +baz"]);
    }

    #[test]
    fn wraps_with_continuation_mark() {
        let c = Composer::new(&config(12)).unwrap();
        let lines = c.compose(&Colorizer::disabled(), &changed(Some((1, "abcdefgh")), Some((1, "x"))));
        assert_eq!(lines, vec!["-abcde+x", ".fgh  "]);
    }

    #[test]
    fn truncate_prints_first_line_only() {
        let cfg = RenderConfig {
            truncate: true,
            ..config(12)
        };
        let c = Composer::new(&cfg).unwrap();
        let lines = c.compose(&Colorizer::disabled(), &changed(Some((1, "abcdefgh")), None));
        assert_eq!(lines, vec!["-abcde"]);
    }

    #[test]
    fn numbers_on_first_line_only() {
        let cfg = RenderConfig {
            number: true,
            digit: 2,
            ..config(16)
        };
        let c = Composer::new(&cfg).unwrap();
        assert_eq!(c.cell_widths(), (4, 4));
        let row = Row::Unchanged {
            old: Cell::new(7, "abcdef"),
            new: Cell::new(9, "ab"),
        };
        let lines = c.compose(&Colorizer::disabled(), &row);
        assert_eq!(lines, vec!["  7 abcd  9 ab", ".   ef  "]);
    }

    #[test]
    fn marks_on_the_right_pad_both_cells() {
        let cfg = RenderConfig {
            old_mark: MarkPosition::Right,
            new_mark: MarkPosition::Right,
            ..config(10)
        };
        let c = Composer::new(&cfg).unwrap();
        let lines = c.compose(&Colorizer::disabled(), &changed(Some((1, "a")), Some((1, "b"))));
        assert_eq!(lines, vec!["a   -b   +"]);
    }

    #[test]
    fn view_mode_hides_change_marks() {
        let cfg = RenderConfig {
            view: true,
            ..config(10)
        };
        let c = Composer::new(&cfg).unwrap();
        let lines = c.compose(&Colorizer::disabled(), &changed(Some((1, "a")), Some((1, "b"))));
        assert_eq!(lines, vec![" a    b"]);
    }

    #[test]
    fn wide_cluster_moves_to_next_line() {
        let c = Composer::new(&config(6)).unwrap();
        let lines = c.compose(&Colorizer::disabled(), &changed(Some((1, "A全B")), None));
        assert_eq!(lines, vec!["-A ", ".全", ".B "]);
    }

    #[test]
    fn tabs_expand_before_folding() {
        let cfg = RenderConfig {
            tabstop: 4,
            ..config(20)
        };
        let c = Composer::new(&cfg).unwrap();
        let lines = c.compose(&Colorizer::disabled(), &changed(Some((1, "a\tb")), None));
        assert_eq!(lines, vec!["-a   b    "]);
    }

    #[test]
    fn expand_field_pads_inside_color() {
        let colorizer = Colorizer::new(
            Colormap::with_overrides(["OTEXT=RE", "OMARK="]).unwrap(),
            Palette::Ansi256,
            true,
        );
        let c = Composer::new(&config(10)).unwrap();
        let lines = c.compose(&colorizer, &changed(Some((1, "ab")), None));
        assert_eq!(lines, vec!["-\u{1b}[31mab  \u{1b}[m"]);
    }

    #[test]
    fn plain_padding_outside_color() {
        let colorizer = Colorizer::new(
            Colormap::with_overrides(["OTEXT=R", "OMARK="]).unwrap(),
            Palette::Ansi256,
            true,
        );
        let c = Composer::new(&config(10)).unwrap();
        let lines = c.compose(&colorizer, &changed(Some((1, "ab")), None));
        assert_eq!(lines, vec!["-\u{1b}[31mab\u{1b}[m  "]);
    }

    #[test]
    fn command_and_passthrough_rows() {
        let c = Composer::new(&config(20)).unwrap();
        let cmd = Row::Command {
            old: "1c1".into(),
            new: "1c1".into(),
        };
        assert_eq!(c.compose(&Colorizer::disabled(), &cmd), vec![" 1c1       1c1"]);
        let pass = Row::Passthrough("Only in a: x".into());
        assert_eq!(c.compose(&Colorizer::disabled(), &pass), vec!["Only in a: x"]);
    }

    #[test]
    fn rejects_width_without_room() {
        let cfg = RenderConfig {
            number: true,
            digit: 4,
            ..config(12)
        };
        assert!(matches!(
            Composer::new(&cfg),
            Err(RenderError::WidthTooSmall { width: 12, needed: 16 })
        ));
        assert!(Composer::new(&config(6)).is_ok());
        assert!(matches!(
            Composer::new(&config(5)),
            Err(RenderError::WidthTooSmall { width: 5, needed: 6 })
        ));
    }

    #[test]
    fn single_column_cells_are_rejected() {
        assert!(matches!(
            Composer::new(&config(4)),
            Err(RenderError::WidthTooSmall { width: 4, needed: 6 })
        ));
        let c = Composer::new(&config(6)).unwrap();
        let lines = c.compose(&Colorizer::disabled(), &changed(Some((1, "全全")), Some((1, "x"))));
        assert_eq!(lines, vec!["-全+x", ".全"]);
        for line in &lines {
            assert!(core_text::visible_width(line) <= 6, "{line:?}");
        }
    }
}
