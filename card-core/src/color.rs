//! CSS color parsing for the fill and shadow pickers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Opacity from 0 to 1.
    pub a: f64,
}

impl Default for Rgba {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Rgba {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// Opaque color from channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#rrggbb`, `#rgb`, `rgb(r,g,b)`, `rgb(r g b)`, `rgba(r,g,b,a)`,
    /// or one of the keywords `transparent`, `black`, `white`.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Some(hex) = input.strip_prefix('#') {
            return parse_hex(hex);
        }
        match input.to_ascii_lowercase().as_str() {
            "transparent" => return Some(Self { a: 0.0, ..Self::BLACK }),
            "black" => return Some(Self::BLACK),
            "white" => return Some(Self::rgb(255, 255, 255)),
            _ => {}
        }

        let body = input
            .strip_prefix("rgba(")
            .or_else(|| input.strip_prefix("rgb("))?
            .strip_suffix(')')?;
        let parts: Vec<f64> = body
            .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(str::parse::<f64>)
            .collect::<Result<_, _>>()
            .ok()?;

        match parts.as_slice() {
            [r, g, b] => Some(Self::rgb(channel(*r), channel(*g), channel(*b))),
            [r, g, b, a] => Some(Self {
                a: a.clamp(0.0, 1.0),
                ..Self::rgb(channel(*r), channel(*g), channel(*b))
            }),
            _ => None,
        }
    }

    /// CSS `rgba(r,g,b,a)` text.
    #[must_use]
    pub fn to_css(&self) -> String {
        format!("rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }

    /// `#rrggbb` text, without alpha.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// Replace the color channels of `fill` with `hex`, keeping its alpha.
///
/// An unparseable `fill` starts from opaque black; an unparseable `hex`
/// leaves `fill` as it was.
#[must_use]
pub fn with_hex(fill: &str, hex: &str) -> String {
    let Some(picked) = Rgba::parse(hex) else {
        tracing::debug!("Ignoring unparseable color {hex}");
        return fill.to_string();
    };
    let base = Rgba::parse(fill).unwrap_or_default();
    Rgba { a: base.a, ..picked }.to_css()
}

/// Replace the alpha of `fill`, keeping its color channels.
#[must_use]
pub fn with_alpha(fill: &str, alpha: f64) -> String {
    let base = Rgba::parse(fill).unwrap_or_default();
    let a = if alpha.is_finite() { alpha.clamp(0.0, 1.0) } else { base.a };
    Rgba { a, ..base }.to_css()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    let digit = |i: usize| u8::from_str_radix(hex.get(i..=i)?, 16).ok();
    let pair = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => Some(Rgba::rgb(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17)),
        6 => Some(Rgba::rgb(pair(0)?, pair(2)?, pair(4)?)),
        _ => None,
    }
}
