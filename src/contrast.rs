// SPDX-License-Identifier: PMPL-1.0-or-later
//! Color contrast engine - WCAG 1.4.3 Contrast (Minimum), Level AA
//!
//! Computes relative luminance and contrast ratios using the WCAG 2.x
//! algorithm and classifies a foreground/background pair against the AA
//! thresholds:
//! - 4.5:1 for normal text
//! - 3:1 for large text (>= 18pt, or >= 14pt bold)

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// AA minimum for normal text
pub const AA_NORMAL_THRESHOLD: f64 = 4.5;

/// AA minimum for large or bold text
pub const AA_LARGE_THRESHOLD: f64 = 3.0;

/// 18pt expressed in CSS pixels
const LARGE_TEXT_PX: f64 = 24.0;

/// 14pt expressed in CSS pixels
const LARGE_BOLD_TEXT_PX: f64 = 18.66;

/// A color value could not be turned into an sRGB triple.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidColorError {
    #[error("{channel} channel value {value} is outside 0-255")]
    ChannelOutOfRange { channel: &'static str, value: i64 },

    #[error("unrecognised color value \"{0}\"")]
    Unparseable(String),
}

/// An sRGB color with 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };

    /// Build a color from unchecked channel values.
    pub fn new(r: i64, g: i64, b: i64) -> Result<Self, InvalidColorError> {
        Ok(Self {
            r: channel("red", r)?,
            g: channel("green", g)?,
            b: channel("blue", b)?,
        })
    }

    /// Relative luminance of this color
    pub fn luminance(&self) -> f64 {
        relative_luminance(*self)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

fn channel(name: &'static str, value: i64) -> Result<u8, InvalidColorError> {
    u8::try_from(value).map_err(|_| InvalidColorError::ChannelOutOfRange { channel: name, value })
}

/// Text size category used to pick the AA threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSize {
    /// Body text
    Normal,
    /// At least 18pt, or at least 14pt and bold
    Large,
}

impl TextSize {
    /// The minimum ratio required at Level AA
    pub fn threshold(&self) -> f64 {
        match self {
            TextSize::Normal => AA_NORMAL_THRESHOLD,
            TextSize::Large => AA_LARGE_THRESHOLD,
        }
    }

    /// Classify from a font size in CSS pixels and boldness.
    pub fn classify(font_size_px: Option<f64>, bold: bool) -> Self {
        match font_size_px {
            Some(px) if px >= LARGE_TEXT_PX => TextSize::Large,
            Some(px) if bold && px >= LARGE_BOLD_TEXT_PX => TextSize::Large,
            _ => TextSize::Normal,
        }
    }
}

impl fmt::Display for TextSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextSize::Normal => write!(f, "normal"),
            TextSize::Large => write!(f, "large"),
        }
    }
}

/// Outcome of checking one color pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContrastResult {
    /// Contrast ratio, always >= 1.0
    pub ratio: f64,
    /// The threshold that applied
    pub threshold: f64,
    /// Whether the pair meets the threshold
    pub passes: bool,
}

/// Calculate relative luminance per WCAG 2.x
/// <https://www.w3.org/TR/WCAG21/#dfn-relative-luminance>
pub fn relative_luminance(color: Rgb) -> f64 {
    let srgb = [color.r, color.g, color.b].map(|c| {
        let v = c as f64 / 255.0;
        if v <= 0.04045 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    });
    0.2126 * srgb[0] + 0.7152 * srgb[1] + 0.0722 * srgb[2]
}

/// Calculate contrast ratio between two colors
/// Returns a ratio >= 1.0 (e.g., 4.5, 7.0, 21.0)
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let l1 = relative_luminance(a);
    let l2 = relative_luminance(b);
    let (lighter, darker) = if l1 >= l2 { (l1, l2) } else { (l2, l1) };
    (lighter + 0.05) / (darker + 0.05)
}

/// Check a foreground/background pair against the AA threshold for `size`.
pub fn evaluate(foreground: Rgb, background: Rgb, size: TextSize) -> ContrastResult {
    let ratio = contrast_ratio(foreground, background);
    let threshold = size.threshold();
    ContrastResult {
        ratio,
        threshold,
        passes: ratio >= threshold,
    }
}

/// Parse a CSS hex color (#rgb, #rrggbb)
pub fn parse_hex_color(hex: &str) -> Result<Rgb, InvalidColorError> {
    let digits = hex.trim_start_matches('#');
    let bad = || InvalidColorError::Unparseable(hex.to_string());
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(bad());
    }
    let component = |s: &str| i64::from_str_radix(s, 16).map_err(|_| bad());
    match digits.len() {
        3 => Rgb::new(
            component(&digits[0..1].repeat(2))?,
            component(&digits[1..2].repeat(2))?,
            component(&digits[2..3].repeat(2))?,
        ),
        6 => Rgb::new(
            component(&digits[0..2])?,
            component(&digits[2..4])?,
            component(&digits[4..6])?,
        ),
        _ => Err(bad()),
    }
}

fn rgb_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^rgba?\(\s*(-?\d+)\s*,\s*(-?\d+)\s*,\s*(-?\d+)\s*(?:,\s*[\d.]+\s*)?\)$")
            .expect("valid regex")
    })
}

/// Parse an rgb() or rgba() color
pub fn parse_rgb_color(value: &str) -> Result<Rgb, InvalidColorError> {
    let caps = rgb_regex()
        .captures(value.trim())
        .ok_or_else(|| InvalidColorError::Unparseable(value.to_string()))?;
    let num = |i: usize| {
        caps[i]
            .parse::<i64>()
            .map_err(|_| InvalidColorError::Unparseable(value.to_string()))
    };
    Rgb::new(num(1)?, num(2)?, num(3)?)
}

/// Parse a named CSS color
pub fn parse_named_color(name: &str) -> Option<Rgb> {
    let (r, g, b) = match name {
        "white" => (255, 255, 255),
        "black" => (0, 0, 0),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "gray" | "grey" => (128, 128, 128),
        "silver" => (192, 192, 192),
        "maroon" => (128, 0, 0),
        "olive" => (128, 128, 0),
        "lime" => (0, 255, 0),
        "aqua" | "cyan" => (0, 255, 255),
        "teal" => (0, 128, 128),
        "navy" => (0, 0, 128),
        "fuchsia" | "magenta" => (255, 0, 255),
        "purple" => (128, 0, 128),
        "orange" => (255, 165, 0),
        _ => return None,
    };
    Some(Rgb { r, g, b })
}

/// Parse any supported CSS color value
pub fn parse_color(value: &str) -> Result<Rgb, InvalidColorError> {
    let trimmed = value.trim().trim_end_matches("!important").trim().to_lowercase();
    if trimmed.starts_with('#') {
        parse_hex_color(&trimmed)
    } else if trimmed.starts_with("rgb") {
        parse_rgb_color(&trimmed)
    } else {
        parse_named_color(&trimmed)
            .ok_or_else(|| InvalidColorError::Unparseable(value.trim().to_string()))
    }
}

/// Values that say nothing about the actual painted color. `none` is not a
/// color, but it is the usual way to reset a `background`.
pub fn is_indeterminate(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    matches!(
        value.trim_end_matches("!important").trim(),
        "" | "none" | "inherit" | "initial" | "unset" | "transparent" | "currentcolor"
    )
}

/// Parse a CSS font-size into pixels (px, pt, em/rem relative to 16px).
pub fn parse_font_size_px(value: &str) -> Option<f64> {
    let v = value.trim().to_lowercase();
    let parse = |n: &str| n.trim().parse::<f64>().ok();
    if let Some(n) = v.strip_suffix("px") {
        parse(n)
    } else if let Some(n) = v.strip_suffix("pt") {
        parse(n).map(|pt| pt * 4.0 / 3.0)
    } else if let Some(n) = v.strip_suffix("rem").or_else(|| v.strip_suffix("em")) {
        parse(n).map(|em| em * 16.0)
    } else {
        None
    }
}

/// Whether a CSS font-weight value is bold
pub fn is_bold_weight(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    match v.as_str() {
        "bold" | "bolder" => true,
        other => other.parse::<u32>().map(|w| w >= 700).unwrap_or(false),
    }
}
