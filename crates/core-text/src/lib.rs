//! Terminal text primitives: grapheme width, escape tokenizing, folding.
//!
//! Everything here operates on one line of styled text at a time. Widths are
//! display columns as decided by [`width::egc_width`]; escape sequences are
//! carried through untouched and never counted.

pub mod ansi;
pub mod fold;
pub mod tabs;
pub mod width;

pub use ansi::{RESET, strip, visible_width};
pub use fold::{FoldOptions, Folded, fold};
pub use tabs::expand_tabs;
pub use width::{egc_width, str_width};
