//! Configuration loading and render-option resolution.
//!
//! Parses `sdif.toml` (or an override path provided by the binary) into a
//! [`ConfigFile`], then merges command-line overrides and terminal facts
//! into the [`RenderConfig`] value the renderer consumes. Precedence is
//! command line, then file, then built-in defaults. Unknown fields are
//! ignored so older binaries keep reading newer files.

use std::fmt;
use std::str::FromStr;
use std::{fs, path::PathBuf};

use anyhow::Result;
use core_color::Palette;
use serde::Deserialize;
use tracing::{info, warn};

pub const FILE_NAME: &str = "sdif.toml";
pub const DEFAULT_WIDTH: usize = 80;

/// Where a side's change mark is drawn relative to its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkPosition {
    #[default]
    Left,
    Right,
    None,
}

impl MarkPosition {
    /// Columns taken by the mark.
    pub const fn width(self) -> usize {
        match self {
            MarkPosition::None => 0,
            MarkPosition::Left | MarkPosition::Right => 1,
        }
    }
}

impl FromStr for MarkPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(MarkPosition::Left),
            "right" => Ok(MarkPosition::Right),
            "none" | "no" => Ok(MarkPosition::None),
            other => Err(format!("unknown mark position \"{other}\" (left|right|none)")),
        }
    }
}

impl fmt::Display for MarkPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MarkPosition::Left => "left",
            MarkPosition::Right => "right",
            MarkPosition::None => "none",
        })
    }
}

/// `--color` choice; `Auto` colors only when stdout is a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    Always,
    Never,
    #[default]
    Auto,
}

impl FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            "auto" => Ok(ColorChoice::Auto),
            other => Err(format!("unknown color choice \"{other}\" (always|never|auto)")),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RenderSection {
    #[serde(default)]
    pub width: Option<usize>,
    #[serde(default)]
    pub number: bool,
    #[serde(default = "RenderSection::default_digit")]
    pub digit: usize,
    #[serde(default)]
    pub truncate: bool,
    #[serde(default)]
    pub onword: bool,
    #[serde(default)]
    pub view: bool,
    #[serde(default = "RenderSection::default_tabstop")]
    pub tabstop: usize,
    #[serde(default)]
    pub old_mark: MarkPosition,
    #[serde(default)]
    pub new_mark: MarkPosition,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            width: None,
            number: false,
            digit: Self::default_digit(),
            truncate: false,
            onword: false,
            view: false,
            tabstop: Self::default_tabstop(),
            old_mark: MarkPosition::default(),
            new_mark: MarkPosition::default(),
        }
    }
}

impl RenderSection {
    const fn default_digit() -> usize {
        4
    }
    const fn default_tabstop() -> usize {
        8
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ColorSection {
    /// `None` leaves the decision to terminal detection.
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default = "ColorSection::default_palette")]
    pub palette: u16,
}

impl Default for ColorSection {
    fn default() -> Self {
        Self {
            enabled: None,
            palette: Self::default_palette(),
        }
    }
}

impl ColorSection {
    const fn default_palette() -> u16 {
        256
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ColormapSection {
    /// `PATTERN=SPEC` entries, later entries take precedence.
    #[serde(default)]
    pub overrides: Vec<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub render: RenderSection,
    #[serde(default)]
    pub color: ColorSection,
    #[serde(default)]
    pub colormap: ColormapSection,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub path: Option<PathBuf>,
    pub file: ConfigFile, // parsed (or default) data
}

/// Values given on the command line; `None` defers to the file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub width: Option<usize>,
    pub number: Option<bool>,
    pub digit: Option<usize>,
    pub truncate: Option<bool>,
    pub onword: Option<bool>,
    pub view: Option<bool>,
    pub tabstop: Option<usize>,
    pub old_mark: Option<MarkPosition>,
    pub new_mark: Option<MarkPosition>,
    pub color: Option<ColorChoice>,
    pub palette: Option<Palette>,
    pub colormap: Vec<String>,
}

/// Facts about the output terminal supplied by the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigContext {
    pub terminal_columns: Option<u16>,
    pub stdout_is_tty: bool,
}

impl ConfigContext {
    pub const fn new(terminal_columns: Option<u16>, stdout_is_tty: bool) -> Self {
        Self {
            terminal_columns,
            stdout_is_tty,
        }
    }
}

/// Glyphs drawn in the mark column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkGlyphs {
    pub old: char,
    pub new: char,
    pub same: char,
    pub continuation: char,
}

impl Default for MarkGlyphs {
    fn default() -> Self {
        Self {
            old: '-',
            new: '+',
            same: ' ',
            continuation: '.',
        }
    }
}

/// Fully resolved rendering options; the renderer reads nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub width: usize,
    pub number: bool,
    pub digit: usize,
    pub truncate: bool,
    pub onword: bool,
    pub view: bool,
    pub tabstop: usize,
    pub old_mark: MarkPosition,
    pub new_mark: MarkPosition,
    pub glyphs: MarkGlyphs,
    pub color: bool,
    pub palette: Palette,
    pub colormap: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let render = RenderSection::default();
        Self {
            width: DEFAULT_WIDTH,
            number: render.number,
            digit: render.digit,
            truncate: render.truncate,
            onword: render.onword,
            view: render.view,
            tabstop: render.tabstop,
            old_mark: render.old_mark,
            new_mark: render.new_mark,
            glyphs: MarkGlyphs::default(),
            color: false,
            palette: Palette::default(),
            colormap: Vec::new(),
        }
    }
}

/// Best-effort config path: working directory first, then the platform
/// config dir (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("sdif").join(FILE_NAME);
    }
    PathBuf::from(FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(target: "config", path = %path.display(), "config_loaded");
            Ok(Config {
                raw: Some(content),
                path: Some(path),
                file,
            })
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(Config::default())
        }
    }
}

fn palette_from_depth(depth: u16) -> Palette {
    match depth {
        8 => Palette::Ansi8,
        256 => Palette::Ansi256,
        other => {
            warn!(target: "config", depth = other, "palette_depth_unsupported");
            Palette::Ansi256
        }
    }
}

impl Config {
    /// Merge file values, command-line overrides and terminal facts.
    pub fn resolve(&self, cli: &CliOverrides, ctx: ConfigContext) -> RenderConfig {
        let render = &self.file.render;
        let width = cli
            .width
            .or(render.width)
            .or(ctx.terminal_columns.map(usize::from))
            .unwrap_or(DEFAULT_WIDTH);
        let color = match cli.color.unwrap_or_default() {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.file.color.enabled.unwrap_or(ctx.stdout_is_tty),
        };
        let palette = cli
            .palette
            .unwrap_or_else(|| palette_from_depth(self.file.color.palette));
        let colormap = self
            .file
            .colormap
            .overrides
            .iter()
            .chain(&cli.colormap)
            .cloned()
            .collect();

        let resolved = RenderConfig {
            width,
            number: cli.number.unwrap_or(render.number),
            digit: cli.digit.unwrap_or(render.digit),
            truncate: cli.truncate.unwrap_or(render.truncate),
            onword: cli.onword.unwrap_or(render.onword),
            view: cli.view.unwrap_or(render.view),
            tabstop: cli.tabstop.unwrap_or(render.tabstop),
            old_mark: cli.old_mark.unwrap_or(render.old_mark),
            new_mark: cli.new_mark.unwrap_or(render.new_mark),
            glyphs: MarkGlyphs::default(),
            color,
            palette,
            colormap,
        };
        info!(
            target: "config",
            width = resolved.width,
            terminal_columns = ctx.terminal_columns,
            number = resolved.number,
            view = resolved.view,
            color = resolved.color,
            palette = ?resolved.palette,
            overrides = resolved.colormap.len(),
            "render_config_resolved"
        );
        resolved
    }
}
