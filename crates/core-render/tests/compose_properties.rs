//! Property tests for composed line geometry.

use core_color::{Colorizer, Colormap, Palette};
use core_config::RenderConfig;
use core_render::{Cell, Composer, Row};
use core_text::{strip, visible_width};
use proptest::prelude::*;

fn piece() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("a"),
        Just("Q"),
        Just(" "),
        Just("-"),
        Just("全"),
        Just("e\u{0301}"),
        Just("\u{1b}[32m"),
        Just("\u{1b}[m"),
        Just("\t"),
    ]
}

fn text() -> impl Strategy<Value = String> {
    prop::collection::vec(piece(), 0..80).prop_map(|v| v.concat())
}

fn colorizer(enabled: bool) -> Colorizer {
    Colorizer::new(Colormap::default(), Palette::Ansi256, enabled)
}

proptest! {
    #[test]
    fn lines_fit_the_width(
        old in text(),
        new in text(),
        width in 12usize..80,
        number in any::<bool>(),
        onword in any::<bool>(),
        color in any::<bool>(),
    ) {
        let cfg = RenderConfig { width, number, digit: 2, onword, ..RenderConfig::default() };
        let composer = Composer::new(&cfg).unwrap();
        let row = Row::Changed {
            old: Some(Cell::new(1, old)),
            new: Some(Cell::new(1, new)),
        };
        let lines = composer.compose(&colorizer(color), &row);
        prop_assert!(!lines.is_empty());
        for line in &lines {
            prop_assert!(visible_width(line) <= width, "{line:?} wider than {width}");
        }
    }

    #[test]
    fn truncate_prints_one_line(old in text(), width in 12usize..80) {
        let cfg = RenderConfig { width, truncate: true, ..RenderConfig::default() };
        let composer = Composer::new(&cfg).unwrap();
        let row = Row::Changed { old: Some(Cell::new(1, old)), new: None };
        prop_assert_eq!(composer.compose(&colorizer(false), &row).len(), 1);
    }

    #[test]
    fn color_changes_no_visible_text(old in text(), width in 12usize..80) {
        let cfg = RenderConfig { width, ..RenderConfig::default() };
        let composer = Composer::new(&cfg).unwrap();
        let row = Row::Changed {
            old: Some(Cell::new(3, old.clone())),
            new: Some(Cell::new(3, old)),
        };
        let plain = composer.compose(&colorizer(false), &row);
        let colored = composer.compose(&colorizer(true), &row);
        prop_assert_eq!(plain.len(), colored.len());
        for (p, c) in plain.iter().zip(&colored) {
            prop_assert_eq!(strip(p), strip(c));
        }
    }
}
