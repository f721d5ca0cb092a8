// Console output
#[macro_use]
mod output;
pub use output::Output;

// Assembling
mod assembler;
pub use assembler::{assemble, AssemblySession, PROGRAM_CAPACITY};
mod format;
mod instruction;
mod lexer;
mod span;
mod symbol;

// Decoding
mod decoder;
pub use decoder::{decode_instruction, decode_program, find_labels, DecodeOptions, LabelMap};

// Running
mod runtime;
pub use runtime::{Chip8, Mode, DEFAULT_CLOCK_SPEED, KEY_COUNT, STACK_SIZE};
mod display;
pub use display::Display;
mod font;
pub use font::{BigFont, Fonts, SmallFont};
mod palette;
pub use palette::Palette;
mod quirks;
pub use quirks::Quirks;
pub mod backend;
mod emulator;
pub use emulator::{Emulator, RunOptions};
mod debugger;
pub use debugger::{DebugState, Debugger, DebuggerOptions};

mod error;
pub use error::{C8Error, ErrorKind, SourceLine};

pub mod env;

/// Bytes of addressable memory.
pub const MEMORY_SIZE: usize = 0x1000;
/// Address programs are loaded at.
pub const PROGRAM_START: u16 = 0x200;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 8;
