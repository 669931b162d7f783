use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ImportError;

/// An sRGB display color, persisted as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 3]);

impl Color {
    /// Creates a color from 8-bit channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl TryFrom<String> for Color {
    type Error = ImportError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let hex = value.strip_prefix('#').unwrap_or(&value);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ImportError::InvalidColor(value));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        match (channel(0), channel(2), channel(4)) {
            (Ok(r), Ok(g), Ok(b)) => Ok(Self([r, g, b])),
            _ => Err(ImportError::InvalidColor(value)),
        }
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Colors handed out round-robin to newly created groups.
pub const PALETTE: [Color; 12] = [
    Color::rgb(0xe6, 0x19, 0x4b),
    Color::rgb(0x3c, 0xb4, 0x4b),
    Color::rgb(0x43, 0x63, 0xd8),
    Color::rgb(0xf5, 0x82, 0x31),
    Color::rgb(0x91, 0x1e, 0xb4),
    Color::rgb(0x46, 0xf0, 0xf0),
    Color::rgb(0xf0, 0x32, 0xe6),
    Color::rgb(0xbc, 0xf6, 0x0c),
    Color::rgb(0xfa, 0xbe, 0xbe),
    Color::rgb(0x00, 0x80, 0x80),
    Color::rgb(0x9a, 0x63, 0x24),
    Color::rgb(0x80, 0x00, 0x00),
];

/// Palette entry for the `n`-th created group.
#[must_use]
pub fn palette_color(n: usize) -> Color {
    PALETTE[n % PALETTE.len()]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let c = Color::rgb(0x12, 0xab, 0xff);
        assert_eq!(c.to_string(), "#12abff");
        assert_eq!(Color::try_from("#12ABFF".to_string()).unwrap(), c);
        assert_eq!(Color::try_from("12abff".to_string()).unwrap(), c);
    }

    #[test]
    fn rejects_malformed_colors() {
        assert!(Color::try_from("#12ab".to_string()).is_err());
        assert!(Color::try_from("#zzzzzz".to_string()).is_err());
        assert!(Color::try_from("#ééé".to_string()).is_err());
    }

    #[test]
    fn palette_wraps_around() {
        assert_eq!(palette_color(0), palette_color(PALETTE.len()));
        assert_ne!(palette_color(0), palette_color(1));
    }
}
