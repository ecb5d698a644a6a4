//! Validated color values with hex parsing and canonical serialization.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EngineError;

/// A validated six-hex-digit RGB color value.
///
/// Parsing accepts `#RRGGBB` or bare `RRGGBB` in any case, with surrounding
/// whitespace tolerated. The canonical form is always uppercase with a `#`
/// prefix, and that is the only form ever persisted or compared. A
/// `ColorValue` cannot be constructed from malformed input, so downstream
/// color math never revalidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColorValue {
    /// Red channel (0-255)
    r: u8,
    /// Green channel (0-255)
    g: u8,
    /// Blue channel (0-255)
    b: u8,
}

impl ColorValue {
    /// Creates a `ColorValue` from individual channel values.
    #[must_use]
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses a `ColorValue` from a hex string.
    ///
    /// Supports formats: "#RRGGBB", "RRGGBB", "#rrggbb", "rrggbb"
    ///
    /// # Examples
    ///
    /// ```
    /// use colorfacet::models::ColorValue;
    ///
    /// let color = ColorValue::parse("#ff0000").unwrap();
    /// assert_eq!(color.to_hex(), "#FF0000");
    ///
    /// assert!(ColorValue::parse("#F00").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidColorFormat`] if the string is not a
    /// valid six-digit hex color.
    pub fn parse(hex: &str) -> Result<Self, EngineError> {
        let trimmed = hex.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

        if digits.len() != 6 || !digits.is_ascii() {
            return Err(EngineError::InvalidColorFormat {
                value: hex.to_string(),
            });
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| EngineError::InvalidColorFormat {
                value: hex.to_string(),
            })
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Returns the canonical hex representation, "#RRGGBB" uppercase.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Returns the RGB channels as (r, g, b).
    #[must_use]
    pub const fn channels(&self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

impl fmt::Display for ColorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl TryFrom<String> for ColorValue {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ColorValue> for String {
    fn from(color: ColorValue) -> Self {
        color.to_hex()
    }
}

impl std::str::FromStr for ColorValue {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
