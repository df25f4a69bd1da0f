//! Semantic output roles that carry their own color.

use std::fmt;
use std::str::FromStr;

use crate::ColorError;

/// One of the thirteen colorable roles of the side-by-side view.
///
/// `O*` roles style the old (left) column, `N*` the new (right) column and
/// `U*` unchanged content on either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldName {
    OldCommand,
    NewCommand,
    OldFile,
    NewFile,
    OldMark,
    NewMark,
    UnchangedMark,
    OldLine,
    NewLine,
    UnchangedLine,
    OldText,
    NewText,
    UnchangedText,
}

impl FieldName {
    pub const COUNT: usize = 13;

    pub const ALL: [FieldName; Self::COUNT] = [
        FieldName::OldCommand,
        FieldName::NewCommand,
        FieldName::OldFile,
        FieldName::NewFile,
        FieldName::OldMark,
        FieldName::NewMark,
        FieldName::UnchangedMark,
        FieldName::OldLine,
        FieldName::NewLine,
        FieldName::UnchangedLine,
        FieldName::OldText,
        FieldName::NewText,
        FieldName::UnchangedText,
    ];

    /// Position in [`FieldName::ALL`]; used to index per-field tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Colormap key, e.g. `OTEXT`.
    pub const fn name(self) -> &'static str {
        match self {
            FieldName::OldCommand => "OCOMMAND",
            FieldName::NewCommand => "NCOMMAND",
            FieldName::OldFile => "OFILE",
            FieldName::NewFile => "NFILE",
            FieldName::OldMark => "OMARK",
            FieldName::NewMark => "NMARK",
            FieldName::UnchangedMark => "UMARK",
            FieldName::OldLine => "OLINE",
            FieldName::NewLine => "NLINE",
            FieldName::UnchangedLine => "ULINE",
            FieldName::OldText => "OTEXT",
            FieldName::NewText => "NTEXT",
            FieldName::UnchangedText => "UTEXT",
        }
    }

    /// Changed-side role an unset unchanged role borrows its color from.
    pub const fn fallback(self) -> Option<FieldName> {
        match self {
            FieldName::UnchangedMark => Some(FieldName::OldMark),
            FieldName::UnchangedLine => Some(FieldName::OldLine),
            FieldName::UnchangedText => Some(FieldName::OldText),
            _ => None,
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldName {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        FieldName::ALL
            .into_iter()
            .find(|f| f.name() == upper)
            .ok_or_else(|| ColorError::UnknownField(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_table_position() {
        for (i, f) in FieldName::ALL.iter().enumerate() {
            assert_eq!(f.index(), i);
        }
    }

    #[test]
    fn names_round_trip() {
        for f in FieldName::ALL {
            assert_eq!(f.name().parse::<FieldName>().unwrap(), f);
        }
        assert_eq!("otext".parse::<FieldName>().unwrap(), FieldName::OldText);
        assert!("XTEXT".parse::<FieldName>().is_err());
    }

    #[test]
    fn only_unchanged_roles_fall_back() {
        let with_fallback: Vec<_> = FieldName::ALL
            .into_iter()
            .filter(|f| f.fallback().is_some())
            .collect();
        assert_eq!(
            with_fallback,
            vec![
                FieldName::UnchangedMark,
                FieldName::UnchangedLine,
                FieldName::UnchangedText
            ]
        );
    }
}
