use std::fmt;
use std::str::FromStr;

use crate::error::{C8Error, ErrorKind};

/// Address of the first small glyph.
pub const SMALL_FONT_ADDR: u16 = 0x000;
/// Address of the first big glyph.
pub const BIG_FONT_ADDR: u16 = 0x050;
/// Bytes per small glyph.
pub const SMALL_GLYPH_LEN: u16 = 5;
/// Bytes per big glyph.
pub const BIG_GLYPH_LEN: u16 = 10;

const OCTO_SMALL: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

// COSMAC VIP character set
const VIP_SMALL: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x60, 0x20, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0xA0, 0xA0, 0xF0, 0x20, 0x20, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x10, 0x10, 0x10, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xF0, 0x50, 0x70, 0x50, 0xF0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xF0, 0x50, 0x50, 0x50, 0xF0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

const OCTO_BIG: [u8; 160] = [
    0xFF, 0xFF, 0xC3, 0xC3, 0xC3, 0xC3, 0xC3, 0xC3, 0xFF, 0xFF, // 0
    0x18, 0x78, 0x78, 0x18, 0x18, 0x18, 0x18, 0x18, 0xFF, 0xFF, // 1
    0xFF, 0xFF, 0x03, 0x03, 0xFF, 0xFF, 0xC0, 0xC0, 0xFF, 0xFF, // 2
    0xFF, 0xFF, 0x03, 0x03, 0xFF, 0xFF, 0x03, 0x03, 0xFF, 0xFF, // 3
    0xC3, 0xC3, 0xC3, 0xC3, 0xFF, 0xFF, 0x03, 0x03, 0x03, 0x03, // 4
    0xFF, 0xFF, 0xC0, 0xC0, 0xFF, 0xFF, 0x03, 0x03, 0xFF, 0xFF, // 5
    0xFF, 0xFF, 0xC0, 0xC0, 0xFF, 0xFF, 0xC3, 0xC3, 0xFF, 0xFF, // 6
    0xFF, 0xFF, 0x03, 0x03, 0x06, 0x0C, 0x18, 0x18, 0x18, 0x18, // 7
    0xFF, 0xFF, 0xC3, 0xC3, 0xFF, 0xFF, 0xC3, 0xC3, 0xFF, 0xFF, // 8
    0xFF, 0xFF, 0xC3, 0xC3, 0xFF, 0xFF, 0x03, 0x03, 0xFF, 0xFF, // 9
    0x7E, 0xFF, 0xC3, 0xC3, 0xC3, 0xFF, 0xFF, 0xC3, 0xC3, 0xC3, // A
    0xFC, 0xFC, 0xC3, 0xC3, 0xFC, 0xFC, 0xC3, 0xC3, 0xFC, 0xFC, // B
    0x3C, 0xFF, 0xC3, 0xC0, 0xC0, 0xC0, 0xC0, 0xC3, 0xFF, 0x3C, // C
    0xFC, 0xFE, 0xC3, 0xC3, 0xC3, 0xC3, 0xC3, 0xC3, 0xFE, 0xFC, // D
    0xFF, 0xFF, 0xC0, 0xC0, 0xFF, 0xFF, 0xC0, 0xC0, 0xFF, 0xFF, // E
    0xFF, 0xFF, 0xC0, 0xC0, 0xFF, 0xFF, 0xC0, 0xC0, 0xC0, 0xC0, // F
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SmallFont {
    #[default]
    Octo,
    Vip,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BigFont {
    #[default]
    Octo,
}

impl SmallFont {
    const ALL: [SmallFont; 2] = [Self::Octo, Self::Vip];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Octo => "octo",
            Self::Vip => "vip",
        }
    }

    pub fn glyphs(&self) -> &'static [u8] {
        match self {
            Self::Octo => &OCTO_SMALL,
            Self::Vip => &VIP_SMALL,
        }
    }

    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }
}

impl BigFont {
    const ALL: [BigFont; 1] = [Self::Octo];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Octo => "octo",
        }
    }

    pub fn glyphs(&self) -> &'static [u8] {
        match self {
            Self::Octo => &OCTO_BIG,
        }
    }

    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }
}

fn invalid_font(name: &str) -> C8Error {
    C8Error::new(ErrorKind::InvalidFont, format!("Unknown font '{name}'"))
}

impl FromStr for SmallFont {
    type Err = C8Error;
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|font| font.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| invalid_font(name))
    }
}

impl FromStr for BigFont {
    type Err = C8Error;
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|font| font.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| invalid_font(name))
    }
}

/// Selected small and big fonts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fonts {
    pub small: SmallFont,
    pub big: BigFont,
}

impl Fonts {
    /// Copy both fonts into the interpreter area of `mem`.
    pub fn load_into(&self, mem: &mut [u8]) {
        let small = SMALL_FONT_ADDR as usize;
        let big = BIG_FONT_ADDR as usize;
        mem[small..small + self.small.glyphs().len()].copy_from_slice(self.small.glyphs());
        mem[big..big + self.big.glyphs().len()].copy_from_slice(self.big.glyphs());
    }
}

/// Parses `small,big`. Either half may be left empty to keep the default.
impl FromStr for Fonts {
    type Err = C8Error;
    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let mut fonts = Self::default();
        let (small, big) = string.split_once(',').unwrap_or((string, ""));
        if !small.trim().is_empty() {
            fonts.small = small.parse()?;
        }
        if !big.trim().is_empty() {
            fonts.big = big.parse()?;
        }
        Ok(fonts)
    }
}

impl fmt::Display for Fonts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.small.name(), self.big.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs() {
        let fonts: Fonts = "vip,octo".parse().unwrap();
        assert_eq!(fonts.small, SmallFont::Vip);
        assert_eq!(fonts.big, BigFont::Octo);
        assert_eq!(fonts.to_string(), "vip,octo");

        let fonts: Fonts = "VIP".parse().unwrap();
        assert_eq!(fonts.small, SmallFont::Vip);
        assert_eq!(",".parse::<Fonts>().unwrap(), Fonts::default());
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "octo,vip".parse::<Fonts>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFont);
        assert!("comic".parse::<SmallFont>().is_err());
    }

    #[test]
    fn loads_at_fixed_addresses() {
        let mut mem = [0u8; 0x200];
        Fonts::default().load_into(&mut mem);
        assert_eq!(&mem[0..5], &[0xF0, 0x90, 0x90, 0x90, 0xF0]);
        // Big glyph 1
        assert_eq!(mem[BIG_FONT_ADDR as usize + 10], 0x18);
        assert_eq!(mem[BIG_FONT_ADDR as usize + 159], 0xC0);
        assert_eq!(mem[BIG_FONT_ADDR as usize + 160], 0x00);
    }

    #[test]
    fn ids_round_trip() {
        assert_eq!(SmallFont::from_id(SmallFont::Vip.id()), Some(SmallFont::Vip));
        assert_eq!(BigFont::from_id(7), None);
    }
}
