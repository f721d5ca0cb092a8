use std::fmt;
use std::str::FromStr;

use crate::error::{C8Error, ErrorKind};

/// Deviations from original CHIP-8 behaviour, each toggled by a single letter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Quirks {
    /// `b`: `AND`, `OR` and `XOR` reset VF.
    pub bitwise: bool,
    /// `d`: sprites wrap around screen edges instead of clipping.
    pub draw: bool,
    /// `j`: `Bxnn` jumps to `xnn + Vx` instead of `nnn + V0`.
    pub jump: bool,
    /// `l`: bulk register loads and stores leave I past the last register.
    pub load_store: bool,
    /// `s`: `SHR`/`SHL` shift Vx in place instead of shifting Vy into Vx.
    pub shift: bool,
}

impl Quirks {
    fn entries(&self) -> [(char, bool); 5] {
        [
            ('b', self.bitwise),
            ('d', self.draw),
            ('j', self.jump),
            ('l', self.load_store),
            ('s', self.shift),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.entries().iter().all(|(_, value)| !value)
    }

    /// Compact form for snapshots.
    pub fn bits(&self) -> u8 {
        self.entries()
            .iter()
            .enumerate()
            .fold(0, |bits, (i, (_, value))| bits | ((*value as u8) << i))
    }

    pub fn from_bits(bits: u8) -> Self {
        let bit = |i: u8| bits & (1 << i) != 0;
        Quirks {
            bitwise: bit(0),
            draw: bit(1),
            jump: bit(2),
            load_store: bit(3),
            shift: bit(4),
        }
    }
}

impl FromStr for Quirks {
    type Err = C8Error;
    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let mut quirks = Self::default();
        if string.eq_ignore_ascii_case("none") {
            return Ok(quirks);
        }
        for ch in string.chars() {
            let value = match ch {
                'b' => &mut quirks.bitwise,
                'd' => &mut quirks.draw,
                'j' => &mut quirks.jump,
                'l' => &mut quirks.load_store,
                's' => &mut quirks.shift,
                _ => {
                    return Err(C8Error::new(
                        ErrorKind::InvalidQuirk,
                        format!("Unknown quirk '{ch}'"),
                    ))
                }
            };
            *value = true;
        }
        Ok(quirks)
    }
}

impl fmt::Display for Quirks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "None");
        }
        for (name, value) in self.entries() {
            if value {
                write!(f, "{}", name)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_letters() {
        let quirks: Quirks = "sjb".parse().unwrap();
        assert!(quirks.shift && quirks.jump && quirks.bitwise);
        assert!(!quirks.draw && !quirks.load_store);
        assert_eq!(quirks.to_string(), "bjs");
        assert_eq!("".parse::<Quirks>().unwrap().to_string(), "None");
        assert_eq!("none".parse::<Quirks>().unwrap(), Quirks::default());
    }

    #[test]
    fn rejects_unknown_letters() {
        let err = "bx".parse::<Quirks>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidQuirk);
        assert_eq!(err.message(), "Unknown quirk 'x'");
    }

    #[test]
    fn bits_round_trip() {
        let quirks: Quirks = "dl".parse().unwrap();
        assert_eq!(Quirks::from_bits(quirks.bits()), quirks);
        assert_eq!(Quirks::default().bits(), 0);
    }
}
