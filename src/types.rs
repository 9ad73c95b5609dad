use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A 24-bit sRGB color as written into `<a:srgbClr val="RRGGBB"/>`.
///
/// The named constants follow the sixteen basic HTML colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    pub const SILVER: Color = Color::rgb(0xC0, 0xC0, 0xC0);
    pub const GRAY: Color = Color::rgb(0x80, 0x80, 0x80);
    pub const RED: Color = Color::rgb(0xFF, 0x00, 0x00);
    pub const MAROON: Color = Color::rgb(0x80, 0x00, 0x00);
    pub const YELLOW: Color = Color::rgb(0xFF, 0xFF, 0x00);
    pub const OLIVE: Color = Color::rgb(0x80, 0x80, 0x00);
    pub const LIME: Color = Color::rgb(0x00, 0xFF, 0x00);
    pub const GREEN: Color = Color::rgb(0x00, 0x80, 0x00);
    pub const AQUA: Color = Color::rgb(0x00, 0xFF, 0xFF);
    pub const TEAL: Color = Color::rgb(0x00, 0x80, 0x80);
    pub const BLUE: Color = Color::rgb(0x00, 0x00, 0xFF);
    pub const NAVY: Color = Color::rgb(0x00, 0x00, 0x80);
    pub const FUCHSIA: Color = Color::rgb(0xFF, 0x00, 0xFF);
    pub const PURPLE: Color = Color::rgb(0x80, 0x00, 0x80);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `RRGGBB` or `#RRGGBB`, case-insensitive.
    pub fn from_hex(value: &str) -> Result<Self> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(value.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| Error::InvalidColor(value.to_string()))
        };

        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Uppercase `RRGGBB`, the form OOXML writes.
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Color::from_hex(s)
    }
}

/// A text box on a slide.
///
/// Geometry is expressed in percent of the slide size so that a shape keeps its
/// place when the slide dimensions change. Every line of `text` becomes its own
/// paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct TextShape {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for TextShape {
    fn default() -> Self {
        Self {
            text: String::new(),
            x: 5.0,
            y: 5.0,
            width: 90.0,
            height: 15.0,
        }
    }
}

impl TextShape {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// A single `<Relationship>` entry of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    /// `TargetMode`, present only for external targets.
    pub target_mode: Option<String>,
}

impl Relationship {
    pub fn internal(id: impl Into<String>, rel_type: &str, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rel_type: rel_type.to_string(),
            target: target.into(),
            target_mode: None,
        }
    }

    pub fn is_external(&self) -> bool {
        self.target_mode.as_deref() == Some("External")
    }
}
