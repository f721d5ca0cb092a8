use std::fmt;
use std::str::FromStr;

use crate::error::{C8Error, ErrorKind};

/// Background and foreground colors, as 24-bit `0xRRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub background: u32,
    pub foreground: u32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: 0x000000,
            foreground: 0xFFFFFF,
        }
    }
}

impl Palette {
    /// Red, green and blue channels of `color`.
    pub fn channels(color: u32) -> (u8, u8, u8) {
        let [_, r, g, b] = color.to_be_bytes();
        (r, g, b)
    }
}

/// Single `RRGGBB` color, optionally starting with `#`.
pub fn parse_color(string: &str) -> Option<u32> {
    let hex = string.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Parses `RRGGBB,RRGGBB`, background first. Each color may start with `#`.
impl FromStr for Palette {
    type Err = C8Error;
    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            C8Error::new(
                ErrorKind::InvalidColorPalette,
                format!("Invalid color palette '{}'", string.trim()),
            )
        };
        let (background, foreground) = string.trim().split_once(',').ok_or_else(invalid)?;
        Ok(Self {
            background: parse_color(background).ok_or_else(invalid)?,
            foreground: parse_color(foreground).ok_or_else(invalid)?,
        })
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06x},{:06x}", self.background, self.foreground)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_palettes() {
        let palette: Palette = "112233,#AABBCC".parse().unwrap();
        assert_eq!(palette.background, 0x112233);
        assert_eq!(palette.foreground, 0xAABBCC);
        assert_eq!(palette.to_string(), "112233,aabbcc");
        assert_eq!(" 000000,ffffff\n".parse::<Palette>().unwrap(), Palette::default());
    }

    #[test]
    fn rejects_bad_palettes() {
        for bad in ["", "000000", "00000,ffffff", "000000,fffffg", "000000,ffffff,0"] {
            let err = bad.parse::<Palette>().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidColorPalette, "{bad}");
        }
    }

    #[test]
    fn splits_channels() {
        assert_eq!(Palette::channels(0x123456), (0x12, 0x34, 0x56));
    }
}
