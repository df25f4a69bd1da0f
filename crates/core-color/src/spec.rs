//! Color specification grammar and SGR compilation.
//!
//! Grammar (one spec is a run of codes, e.g. `CS`, `555/100`, `#ff8000D`):
//! * `K R G Y B M C W` foreground, `k r g y b m c w` background.
//! * `D` bold, `U` underline, `F` blink, `S` reverse (standout).
//! * `E` expand: pad the cell to full width inside the color run.
//! * `NNN` three digits 0-5: one entry of the 6x6x6 cube.
//! * `#rrggbb`: 24-bit color quantized onto the cube. The `#` may be left
//!   out when the six hex digits start with a digit and their first three
//!   are not a cube code (`908070`); `ff8000` still needs it.
//! * `/` makes every following color a background color.

use std::str::FromStr;

use bitflags::bitflags;
use core_text::RESET;

use crate::ColorError;

const BASIC: &str = "KRGYBMCW";

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Effects: u8 {
        const BOLD = 0b0001;
        const UNDERLINE = 0b0010;
        const BLINK = 0b0100;
        const REVERSE = 0b1000;
    }
}

/// Number of colors the output terminal is assumed to support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Palette {
    Ansi8,
    #[default]
    Ansi256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// Index into `K R G Y B M C W` (0..8).
    Basic(u8),
    /// Cube coordinates, each 0..=5.
    Cube { r: u8, g: u8, b: u8 },
}

/// 256-color palette index of a cube entry: `16 + 36r + 6g + b`.
pub const fn cube_index(r: u8, g: u8, b: u8) -> u8 {
    16 + 36 * r + 6 * g + b
}

/// Linear quantization of an 8-bit channel onto the 0..=5 cube axis.
pub const fn quantize(v: u8) -> u8 {
    ((v as u16 * 6) / 256) as u8
}

impl Color {
    fn sgr(self, background: bool, palette: Palette) -> String {
        let base = if background { 40 } else { 30 };
        match (self, palette) {
            (Color::Basic(i), _) => (base + u16::from(i)).to_string(),
            (Color::Cube { r, g, b }, Palette::Ansi256) => {
                format!("{};5;{}", base + 8, cube_index(r, g, b))
            }
            (Color::Cube { r, g, b }, Palette::Ansi8) => {
                let bit = |c: u8| u16::from(c >= 3);
                (base + bit(r) + 2 * bit(g) + 4 * bit(b)).to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ColorSpec {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub effects: Effects,
    pub expand: bool,
}

/// Start/end sequences for one field, ready to wrap text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Compiled {
    pub start: String,
    pub end: String,
    pub expand: bool,
}

impl Compiled {
    pub fn is_plain(&self) -> bool {
        self.start.is_empty()
    }
}

impl ColorSpec {
    pub fn is_empty(&self) -> bool {
        self.fg.is_none() && self.bg.is_none() && self.effects.is_empty()
    }

    pub fn compile(&self, palette: Palette) -> Compiled {
        let mut codes: Vec<String> = Vec::new();
        for (flag, code) in [
            (Effects::BOLD, "1"),
            (Effects::UNDERLINE, "4"),
            (Effects::BLINK, "5"),
            (Effects::REVERSE, "7"),
        ] {
            if self.effects.contains(flag) {
                codes.push(code.to_string());
            }
        }
        if let Some(fg) = self.fg {
            codes.push(fg.sgr(false, palette));
        }
        if let Some(bg) = self.bg {
            codes.push(bg.sgr(true, palette));
        }
        if codes.is_empty() {
            return Compiled {
                expand: self.expand,
                ..Compiled::default()
            };
        }
        Compiled {
            start: format!("\u{1b}[{}m", codes.join(";")),
            end: RESET.to_string(),
            expand: self.expand,
        }
    }

    fn set(&mut self, color: Color, background: bool) {
        if background {
            self.bg = Some(color);
        } else {
            self.fg = Some(color);
        }
    }
}

fn bad(spec: &str, reason: &'static str) -> ColorError {
    ColorError::BadSpec {
        spec: spec.to_string(),
        reason,
    }
}

/// Cube color quantized from the six hex digits leading `chars`.
fn hex_color(chars: &[char]) -> Option<Color> {
    let hex: String = chars.iter().take(6).collect();
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let [_, r, g, b] = u32::from_str_radix(&hex, 16).ok()?.to_be_bytes();
    Some(Color::Cube {
        r: quantize(r),
        g: quantize(g),
        b: quantize(b),
    })
}

impl FromStr for ColorSpec {
    type Err = ColorError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut out = ColorSpec::default();
        let mut background = false;
        let chars: Vec<char> = spec.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            match c {
                '/' => background = true,
                'D' => out.effects |= Effects::BOLD,
                'U' => out.effects |= Effects::UNDERLINE,
                'F' => out.effects |= Effects::BLINK,
                'S' => out.effects |= Effects::REVERSE,
                'E' => out.expand = true,
                '0'..='9' => {
                    let digits: Vec<u8> = chars[i..]
                        .iter()
                        .take(3)
                        .map_while(|d| d.to_digit(10).map(|v| v as u8))
                        .collect();
                    if digits.len() == 3 && digits.iter().all(|&d| d <= 5) {
                        out.set(
                            Color::Cube {
                                r: digits[0],
                                g: digits[1],
                                b: digits[2],
                            },
                            background,
                        );
                        i += 3;
                        continue;
                    }
                    let color = hex_color(&chars[i..])
                        .ok_or_else(|| bad(spec, "cube color needs three digits 0-5"))?;
                    out.set(color, background);
                    i += 6;
                    continue;
                }
                '#' => {
                    let color = hex_color(&chars[i + 1..])
                        .ok_or_else(|| bad(spec, "expected six hex digits after '#'"))?;
                    out.set(color, background);
                    i += 7;
                    continue;
                }
                _ => {
                    if let Some(idx) = BASIC.find(c) {
                        out.set(Color::Basic(idx as u8), background);
                    } else if let Some(idx) = BASIC.find(c.to_ascii_uppercase()) {
                        out.set(Color::Basic(idx as u8), true);
                    } else {
                        return Err(ColorError::UnknownCode {
                            spec: spec.to_string(),
                            code: c,
                        });
                    }
                }
            }
            i += 1;
        }
        Ok(out)
    }
}
