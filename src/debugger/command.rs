use std::error::Error;
use std::fmt;

use crate::lexer::{hex_digit, parse_int};
use crate::MEMORY_SIZE;

#[derive(Debug, PartialEq)]
pub enum Command<'a> {
    /// Add a breakpoint at the given address, or at PC.
    BreakAdd { address: Option<u16> },
    /// Remove a breakpoint at the given address, or at PC.
    BreakRemove { address: Option<u16> },
    Continue,
    Next,
    Set { attribute: Attribute, value: &'a str },
    Load { path: &'a str },
    Save { path: &'a str },
    LoadFlags { path: &'a str },
    SaveFlags { path: &'a str },
    /// Print one attribute, or an overview of the machine.
    Print { attribute: Option<Attribute> },
    Help,
    Quit,
}

/// Part of the machine state which can be printed or set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attribute {
    Sp,
    Dt,
    St,
    Pc,
    I,
    Vk,
    Stack,
    Background,
    Foreground,
    SmallFont,
    BigFont,
    Quirks,
    /// One V register, or all of them.
    V(Option<u8>),
    /// One flag register, or all of them.
    R(Option<u8>),
    Address(u16),
}

/// Error parsing or running a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandError {
    InvalidCommand,
    NotEnoughArguments,
    InvalidArgument,
    InvalidFile,
}

impl Error for CommandError {}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCommand => write!(f, "Invalid command"),
            Self::NotEnoughArguments => write!(f, "Not enough arguments."),
            Self::InvalidArgument => write!(f, "Invalid argument"),
            Self::InvalidFile => write!(f, "Invalid file"),
        }
    }
}

const ATTRIBUTES: [(&str, Attribute); 13] = [
    ("SP", Attribute::Sp),
    ("DT", Attribute::Dt),
    ("ST", Attribute::St),
    ("PC", Attribute::Pc),
    ("I", Attribute::I),
    ("VK", Attribute::Vk),
    ("K", Attribute::Vk),
    ("STACK", Attribute::Stack),
    ("BG", Attribute::Background),
    ("FG", Attribute::Foreground),
    ("SFONT", Attribute::SmallFont),
    ("BFONT", Attribute::BigFont),
    ("QUIRKS", Attribute::Quirks),
];

/// Memory address, as `$200`, `0x200` or `512`.
pub fn parse_address(string: &str) -> Option<u16> {
    parse_int(string)
        .filter(|address| (*address as usize) < MEMORY_SIZE)
        .map(|address| address as u16)
}

impl Attribute {
    pub fn parse(string: &str) -> Result<Self, CommandError> {
        let upper = string.trim().to_ascii_uppercase();
        if let Some((_, attribute)) = ATTRIBUTES.iter().find(|(name, _)| *name == upper) {
            return Ok(*attribute);
        }

        let mut chars = upper.chars();
        match chars.next() {
            Some(kind @ ('V' | 'R')) => {
                let index = match chars.as_str() {
                    "" => None,
                    digit => {
                        let mut digits = digit.chars();
                        let index = digits
                            .next()
                            .and_then(hex_digit)
                            .filter(|_| digits.next().is_none())
                            .ok_or(CommandError::InvalidArgument)?;
                        Some(index)
                    }
                };
                if kind == 'V' {
                    Ok(Self::V(index))
                } else if index.map_or(true, |index| index < 8) {
                    Ok(Self::R(index))
                } else {
                    Err(CommandError::InvalidArgument)
                }
            }
            Some('$') => parse_address(&upper)
                .map(Self::Address)
                .ok_or(CommandError::InvalidArgument),
            _ => Err(CommandError::InvalidArgument),
        }
    }
}

impl<'a> Command<'a> {
    /// Parse one line of input. Blank lines are `Ok(None)`.
    pub fn parse(line: &'a str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (name, argument) = match line.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (line, ""),
        };

        let address = || -> Result<Option<u16>, CommandError> {
            if argument.is_empty() {
                return Ok(None);
            }
            parse_address(argument)
                .map(Some)
                .ok_or(CommandError::InvalidArgument)
        };
        let path = || -> Result<&'a str, CommandError> {
            if argument.is_empty() {
                return Err(CommandError::NotEnoughArguments);
            }
            Ok(argument)
        };

        let command = match name {
            "break" => Self::BreakAdd {
                address: address()?,
            },
            "rmbreak" => Self::BreakRemove {
                address: address()?,
            },
            "continue" => Self::Continue,
            "next" => Self::Next,
            "set" => {
                let (attribute, value) = argument
                    .split_once(char::is_whitespace)
                    .map(|(attribute, value)| (attribute, value.trim()))
                    .filter(|(_, value)| !value.is_empty())
                    .ok_or(CommandError::NotEnoughArguments)?;
                Self::Set {
                    attribute: Attribute::parse(attribute)?,
                    value,
                }
            }
            "load" => Self::Load { path: path()? },
            "save" => Self::Save { path: path()? },
            "loadflags" => Self::LoadFlags { path: path()? },
            "saveflags" => Self::SaveFlags { path: path()? },
            "print" => Self::Print {
                attribute: if argument.is_empty() {
                    None
                } else {
                    Some(Attribute::parse(argument)?)
                },
            },
            "help" => Self::Help,
            "quit" => Self::Quit,
            _ => return Err(CommandError::InvalidCommand),
        };
        Ok(Some(command))
    }
}
