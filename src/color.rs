//! Canonical cell colours

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Palette offered to the user, in display order
pub const PALETTE: [Color; 16] = [
    Color::rgb(0xFF, 0xFF, 0xFF),
    Color::rgb(0xE4, 0xE4, 0xE4),
    Color::rgb(0x88, 0x88, 0x88),
    Color::rgb(0x22, 0x22, 0x22),
    Color::rgb(0xFF, 0xA7, 0xD1),
    Color::rgb(0xE5, 0x00, 0x00),
    Color::rgb(0xE5, 0x95, 0x00),
    Color::rgb(0xA0, 0x6A, 0x42),
    Color::rgb(0xE5, 0xD9, 0x00),
    Color::rgb(0x94, 0xE0, 0x44),
    Color::rgb(0x02, 0xBE, 0x01),
    Color::rgb(0x00, 0xD3, 0xDD),
    Color::rgb(0x00, 0x83, 0xC7),
    Color::rgb(0x00, 0x00, 0xEA),
    Color::rgb(0xCF, 0x6E, 0xE4),
    Color::rgb(0x82, 0x00, 0x80),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    #[error("colour must start with '#' (got {0:?})")]
    MissingHash(String),
    #[error("colour must have 3 or 6 hex digits (got {0:?})")]
    BadLength(String),
    #[error("invalid hex digit in colour {0:?}")]
    BadDigit(String),
}

/// Opaque RGB colour, displayed as upper-case `#RRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    pub const GRID: Color = Color::rgb(0xCC, 0xCC, 0xCC);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RGB` or `#RRGGBB`, case-insensitive
    pub fn from_hex(s: &str) -> Result<Self, ColorError> {
        let digits = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| ColorError::MissingHash(s.to_string()))?;

        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(ColorError::BadLength(s.to_string())),
        };

        let channel = |i: usize| {
            expanded
                .get(i..i + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| ColorError::BadDigit(s.to_string()))
        };

        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// RGBA8 texel with the given alpha
    #[inline]
    pub fn to_rgba(self, alpha: u8) -> [u8; 4] {
        [self.r, self.g, self.b, alpha]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::from_hex(s)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
