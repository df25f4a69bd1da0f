//! Field -> color resolution: built-in defaults plus ordered glob overrides.
//!
//! Overrides are applied in declared order and the last matching one wins,
//! so `*TEXT=W` followed by `OTEXT=R` leaves OTEXT red and the other text
//! fields white.

use tracing::warn;

use crate::{ColorError, ColorSpec, FieldName};

/// Built-in table. `None` means "unset": the field falls back to its
/// changed-side counterpart (see [`FieldName::fallback`]).
const DEFAULTS: [(FieldName, Option<&str>); FieldName::COUNT] = [
    (FieldName::OldCommand, Some("GS")),
    (FieldName::NewCommand, Some("GS")),
    (FieldName::OldFile, Some("GDU")),
    (FieldName::NewFile, Some("GDU")),
    (FieldName::OldMark, Some("CS")),
    (FieldName::NewMark, Some("MS")),
    (FieldName::UnchangedMark, Some("")),
    (FieldName::OldLine, Some("Y")),
    (FieldName::NewLine, Some("Y")),
    (FieldName::UnchangedLine, None),
    (FieldName::OldText, Some("C")),
    (FieldName::NewText, Some("M")),
    (FieldName::UnchangedText, Some("")),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    pub pattern: String,
    pub spec: ColorSpec,
}

impl Override {
    /// Parse `PATTERN=SPEC`, e.g. `*MARK=DS` or `OTEXT=#ff0000`.
    pub fn parse(entry: &str) -> Result<Self, ColorError> {
        let (pattern, spec) = entry
            .split_once('=')
            .ok_or_else(|| ColorError::BadOverride(entry.to_string()))?;
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(ColorError::BadOverride(entry.to_string()));
        }
        Ok(Self {
            pattern: pattern.to_ascii_uppercase(),
            spec: spec.trim().parse()?,
        })
    }

    pub fn matches(&self, field: FieldName) -> bool {
        glob_match(&self.pattern, field.name())
    }
}

/// Shell-style glob over ASCII field names: `*` any run, `?` one character.
pub fn glob_match(pattern: &str, name: &str) -> bool {
    let p = pattern.as_bytes();
    let n = name.as_bytes();
    let (mut pi, mut ni) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;
    while ni < n.len() {
        if pi < p.len() && (p[pi] == b'?' || p[pi].eq_ignore_ascii_case(&n[ni])) {
            pi += 1;
            ni += 1;
        } else if pi < p.len() && p[pi] == b'*' {
            star = Some((pi, ni));
            pi += 1;
        } else if let Some((sp, sn)) = star {
            pi = sp + 1;
            ni = sn + 1;
            star = Some((sp, sn + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == b'*')
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Colormap {
    defaults: [Option<ColorSpec>; FieldName::COUNT],
    overrides: Vec<Override>,
}

impl Default for Colormap {
    fn default() -> Self {
        let mut defaults: [Option<ColorSpec>; FieldName::COUNT] = [None; FieldName::COUNT];
        for (field, spec) in DEFAULTS {
            defaults[field.index()] = spec.map(|s| s.parse().unwrap_or_default());
        }
        Self {
            defaults,
            overrides: Vec::new(),
        }
    }
}

impl Colormap {
    /// Default table extended with `PATTERN=SPEC` entries in precedence order.
    pub fn with_overrides<I, S>(entries: I) -> Result<Self, ColorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = Self::default();
        for entry in entries {
            map.push(Override::parse(entry.as_ref())?);
        }
        Ok(map)
    }

    pub fn push(&mut self, ov: Override) {
        if !FieldName::ALL.iter().any(|f| ov.matches(*f)) {
            warn!(target: "color", pattern = ov.pattern.as_str(), "override_matches_no_field");
        }
        self.overrides.push(ov);
    }

    pub fn overrides(&self) -> &[Override] {
        &self.overrides
    }

    /// Spec for `field` before fallback: default, then the last matching override.
    fn lookup(&self, field: FieldName) -> Option<ColorSpec> {
        self.overrides
            .iter()
            .rev()
            .find(|ov| ov.matches(field))
            .map(|ov| ov.spec)
            .or(self.defaults[field.index()])
    }

    /// Effective spec for `field`, applying the unchanged -> changed fallback.
    pub fn resolve(&self, field: FieldName) -> ColorSpec {
        self.lookup(field)
            .or_else(|| field.fallback().and_then(|f| self.lookup(f)))
            .unwrap_or_default()
    }
}
