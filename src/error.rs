use std::{error::Error, fmt};

use miette::{miette, Diagnostic, LabeledSpan, Report, Severity};

use crate::span::Span;

/// Every way the toolchain can fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInstruction,
    TooManyLabels,
    StackOverflow,
    StackUnderflow,
    InvalidArgument,
    DuplicateLabel,
    InvalidSymbol,
    MemoryAllocation,
    TooManySymbols,
    LoadFileFailure,
    FileTooBig,
    InvalidColorPalette,
    InvalidQuirk,
    GraphicsInitFailure,
    InvalidFont,
    InvalidClockSpeed,
    Unknown,
}

impl ErrorKind {
    /// One-line description shared by every error of this kind.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidInstruction => "An invalid instruction exists in the input file.",
            Self::TooManyLabels => "Too many labels exist in the input file.",
            Self::StackOverflow => "A stack overflow occurred during execution.",
            Self::StackUnderflow => "A stack underflow occurred during execution.",
            Self::InvalidArgument => "An invalid argument exists in the input file.",
            Self::DuplicateLabel => "A label was defined multiple times.",
            Self::InvalidSymbol => "An invalid symbol exists in the input file.",
            Self::MemoryAllocation => "Failed to allocate memory.",
            Self::TooManySymbols => "The program does not fit in memory.",
            Self::LoadFileFailure => "Failed to load the given file.",
            Self::FileTooBig => "The given file is too big to load.",
            Self::InvalidColorPalette => "The given color palette is invalid.",
            Self::InvalidQuirk => "An invalid quirk was given.",
            Self::GraphicsInitFailure => "Failed to initialize graphics.",
            Self::InvalidFont => "An invalid font was given.",
            Self::InvalidClockSpeed => "Clock speed cannot be less than 1.",
            Self::Unknown => "An unknown error occurred.",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::InvalidInstruction => "asm::instr",
            Self::TooManyLabels => "asm::label_count",
            Self::StackOverflow => "run::stack_overflow",
            Self::StackUnderflow => "run::stack_underflow",
            Self::InvalidArgument => "asm::arg",
            Self::DuplicateLabel => "asm::dup_label",
            Self::InvalidSymbol => "asm::symbol",
            Self::MemoryAllocation => "sys::alloc",
            Self::TooManySymbols => "asm::size",
            Self::LoadFileFailure => "io::load",
            Self::FileTooBig => "io::size",
            Self::InvalidColorPalette => "config::palette",
            Self::InvalidQuirk => "config::quirk",
            Self::GraphicsInitFailure => "sys::graphics",
            Self::InvalidFont => "config::font",
            Self::InvalidClockSpeed => "config::clock",
            Self::Unknown => "unknown",
        }
    }

    fn help(&self) -> Option<&'static str> {
        Some(match self {
            Self::InvalidInstruction => {
                "check the operands against the instruction table in the documentation."
            }
            Self::TooManyLabels => "a program may define at most 63 labels.",
            Self::StackOverflow => "subroutines may only be nested 16 levels deep.",
            Self::StackUnderflow => "`RET` was executed outside of any subroutine.",
            Self::InvalidArgument => "`.DB` values must fit in a single byte.",
            Self::DuplicateLabel => "rename or remove one of the definitions.",
            Self::InvalidSymbol => "labels must be defined with `name:` on their own line.",
            Self::TooManySymbols => "programs are limited to 3584 bytes.",
            Self::FileTooBig => "ROMs are limited to 3584 bytes.",
            Self::InvalidColorPalette => "palettes are given as `RRGGBB,RRGGBB` (background, foreground).",
            Self::InvalidQuirk => "available quirks are `b`, `d`, `j`, `l` and `s`.",
            Self::InvalidFont => "fonts are given as `small,big`, e.g. `octo,octo`.",
            Self::InvalidClockSpeed => "the clock speed is given in instructions per second.",
            _ => return None,
        })
    }

    fn label(&self) -> &'static str {
        match self {
            Self::InvalidInstruction => "invalid instruction",
            Self::TooManyLabels => "label over limit",
            Self::InvalidArgument => "invalid argument",
            Self::DuplicateLabel => "duplicate label",
            Self::InvalidSymbol => "invalid symbol",
            Self::TooManySymbols => "program exceeds memory",
            _ => "here",
        }
    }
}

/// Line of assembly source an error refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based.
    pub number: usize,
    /// Text of the line as written, before trimming or comment removal.
    pub text: String,
}

/// Error returned by every fallible operation of the library.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct C8Error {
    kind: ErrorKind,
    message: String,
    line: Option<SourceLine>,
}

impl C8Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
        }
    }

    /// Error attached to a line of assembly source.
    pub fn at_line(
        kind: ErrorKind,
        number: usize,
        text: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            line: Some(SourceLine {
                number,
                text: text.into(),
            }),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn line(&self) -> Option<&SourceLine> {
        self.line.as_ref()
    }

    /// Convert to a report which quotes the offending line of `src`, if there is one.
    pub fn into_report(self, src: &str) -> Report {
        let span = self
            .line
            .as_ref()
            .and_then(|line| Span::of_line(src, line.number));
        let Some(span) = span else {
            return Report::new(self);
        };
        let labels = vec![LabeledSpan::at(span, self.kind.label())];
        let report = match self.kind.help() {
            Some(help) => miette!(
                severity = Severity::Error,
                code = self.kind.code(),
                help = help,
                labels = labels,
                "{}",
                self,
            ),
            None => miette!(
                severity = Severity::Error,
                code = self.kind.code(),
                labels = labels,
                "{}",
                self,
            ),
        };
        report.with_source_code(src.to_string())
    }
}

impl Error for C8Error {}

impl fmt::Display for C8Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind.category())
        } else {
            write!(f, "{}\n{}", self.kind.category(), self.message)
        }
    }
}

impl Diagnostic for C8Error {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn severity(&self) -> Option<Severity> {
        Some(Severity::Error)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.kind
            .help()
            .map(|help| Box::new(help) as Box<dyn fmt::Display>)
    }
}

// Assembler errors

pub fn duplicate_label(number: usize, text: &str) -> C8Error {
    C8Error::at_line(
        ErrorKind::DuplicateLabel,
        number,
        text,
        format!("Line {number}: Duplicate label '{}'", text.trim()),
    )
}

pub fn too_many_labels(number: usize, text: &str, max: usize) -> C8Error {
    C8Error::at_line(
        ErrorKind::TooManyLabels,
        number,
        text,
        format!("Line {number}: Label count exceeds the maximum of {max}"),
    )
}

pub fn invalid_symbol(number: usize, text: &str, symbol: &str) -> C8Error {
    C8Error::at_line(
        ErrorKind::InvalidSymbol,
        number,
        text,
        format!("Line {number}: Invalid symbol '{symbol}'"),
    )
}

pub fn invalid_instruction(number: usize, text: &str, reason: &str) -> C8Error {
    C8Error::at_line(
        ErrorKind::InvalidInstruction,
        number,
        text,
        format!("Line {number}: {reason}: '{}'", text.trim()),
    )
}

pub fn invalid_argument(number: usize, text: &str, reason: &str) -> C8Error {
    C8Error::at_line(
        ErrorKind::InvalidArgument,
        number,
        text,
        format!("Line {number}: {reason}"),
    )
}

pub fn too_many_symbols(number: usize, text: &str) -> C8Error {
    C8Error::at_line(
        ErrorKind::TooManySymbols,
        number,
        text,
        format!("Line {number}: Program exceeds available memory"),
    )
}

// Runtime errors

pub fn stack_overflow(pc: u16) -> C8Error {
    C8Error::new(
        ErrorKind::StackOverflow,
        format!("Subroutine call at ${pc:03X} exceeds the stack depth"),
    )
}

pub fn stack_underflow(pc: u16) -> C8Error {
    C8Error::new(
        ErrorKind::StackUnderflow,
        format!("Return at ${pc:03X} with an empty stack"),
    )
}

pub fn unknown_opcode(pc: u16, opcode: u16) -> C8Error {
    C8Error::new(
        ErrorKind::InvalidInstruction,
        format!("Unknown opcode {opcode:04X} at ${pc:03X}"),
    )
}
