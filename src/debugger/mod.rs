mod breakpoint;
mod command;
mod snapshot;
mod source;

use std::fs;

pub use self::breakpoint::Breakpoints;
use self::command::{parse_address, Attribute, Command, CommandError};
use self::source::{Source, SourceRead};
use crate::decoder::decode_instruction;
use crate::font::Fonts;
use crate::lexer::parse_int;
use crate::output::{Condition, Output};
use crate::palette::parse_color;
use crate::runtime::{Chip8, STACK_SIZE};

const HELP: &str = include_str!("help.txt");

/// Leave this as a struct, in case more options are added in the future. Plus it is more explicit.
#[derive(Debug, Default)]
pub struct DebuggerOptions {
    /// Commands to run instead of reading standard input.
    pub command: Option<String>,
}

/// How execution continues after the debugger returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugState {
    /// Leave debug mode until the next breakpoint.
    Continue,
    /// Execute one instruction, then return to the debugger.
    Step,
    /// Stop the program.
    Quit,
}

pub struct Debugger {
    command_source: Source,
}

impl Debugger {
    pub fn new(opts: DebuggerOptions) -> Self {
        Self {
            command_source: Source::from(opts.command),
        }
    }

    /// Read and run commands until one of them resumes or ends execution.
    ///
    /// Running out of commands ends execution.
    pub fn repl(&mut self, chip8: &mut Chip8) -> DebugState {
        loop {
            dprint!(Sometimes, "debug > ");
            let Some(line) = self.command_source.read() else {
                Output::Debugger(Condition::Sometimes).start_new_line();
                return DebugState::Quit;
            };
            let line = line.to_string();
            match run_line(chip8, &line) {
                Ok(Some(state)) => return state,
                Ok(None) => (),
                Err(error) => dprintln!(Always, "{}", error),
            }
        }
    }
}

/// Parse and run a single command.
pub fn run_line(chip8: &mut Chip8, line: &str) -> Result<Option<DebugState>, CommandError> {
    match Command::parse(line)? {
        Some(command) => run_command(chip8, command),
        None => Ok(None),
    }
}

fn run_command(chip8: &mut Chip8, command: Command) -> Result<Option<DebugState>, CommandError> {
    match command {
        Command::BreakAdd { address } => {
            chip8.breakpoints.insert(address.unwrap_or(chip8.pc));
        }
        Command::BreakRemove { address } => {
            chip8.breakpoints.remove(address.unwrap_or(chip8.pc));
        }
        Command::Continue => return Ok(Some(DebugState::Continue)),
        Command::Next => return Ok(Some(DebugState::Step)),
        Command::Quit => return Ok(Some(DebugState::Quit)),
        Command::Set { attribute, value } => set_value(chip8, attribute, value)?,
        Command::Print { attribute } => match attribute {
            Some(attribute) => print_value(chip8, attribute),
            None => print_overview(chip8),
        },
        Command::Load { path } => {
            let bytes = fs::read(path).map_err(|_| CommandError::InvalidFile)?;
            snapshot::load(chip8, &bytes)?;
        }
        Command::Save { path } => {
            fs::write(path, snapshot::save(chip8)).map_err(|_| CommandError::InvalidFile)?;
        }
        Command::LoadFlags { path } => {
            let bytes = fs::read(path).map_err(|_| CommandError::InvalidFile)?;
            snapshot::load_flags(chip8, &bytes)?;
        }
        Command::SaveFlags { path } => {
            fs::write(path, snapshot::save_flags(chip8)).map_err(|_| CommandError::InvalidFile)?;
        }
        Command::Help => dprintln!(Always, "{}", HELP),
    }
    Ok(None)
}

fn set_value(chip8: &mut Chip8, attribute: Attribute, value: &str) -> Result<(), CommandError> {
    let byte = || {
        parse_int(value)
            .and_then(|value| u8::try_from(value).ok())
            .ok_or(CommandError::InvalidArgument)
    };
    let address = || parse_address(value).ok_or(CommandError::InvalidArgument);
    let color = || parse_color(value).ok_or(CommandError::InvalidArgument);

    match attribute {
        Attribute::Sp => {
            let sp = byte()?;
            if sp as usize > STACK_SIZE {
                return Err(CommandError::InvalidArgument);
            }
            chip8.sp = sp;
        }
        Attribute::Dt => chip8.dt = byte()?,
        Attribute::St => chip8.st = byte()?,
        Attribute::Pc => chip8.pc = address()?,
        Attribute::I => chip8.i = address()?,
        Attribute::Vk => {
            let vk = byte()?;
            if vk > 0xF {
                return Err(CommandError::InvalidArgument);
            }
            chip8.vk = vk;
        }
        Attribute::Background => {
            chip8.palette.background = color()?;
            chip8.draw = true;
        }
        Attribute::Foreground => {
            chip8.palette.foreground = color()?;
            chip8.draw = true;
        }
        Attribute::SmallFont => {
            let small = value.parse().map_err(|_| CommandError::InvalidArgument)?;
            chip8.set_fonts(Fonts {
                small,
                ..chip8.fonts
            });
        }
        Attribute::BigFont => {
            let big = value.parse().map_err(|_| CommandError::InvalidArgument)?;
            chip8.set_fonts(Fonts { big, ..chip8.fonts });
        }
        Attribute::Quirks => {
            chip8.quirks = value.parse().map_err(|_| CommandError::InvalidArgument)?;
        }
        Attribute::V(Some(index)) => chip8.v[index as usize] = byte()?,
        Attribute::R(Some(index)) => chip8.r[index as usize] = byte()?,
        Attribute::Address(address) => chip8.mem[address as usize] = byte()?,
        Attribute::V(None) | Attribute::R(None) | Attribute::Stack => {
            return Err(CommandError::InvalidArgument)
        }
    }
    Ok(())
}

fn print_instruction(chip8: &Chip8, address: u16) {
    let opcode = chip8.word(address);
    let text =
        decode_instruction(opcode, None).unwrap_or_else(|| format!(".DW ${opcode:04X}"));
    dprintln!(Always, "${:03x}: {:04x}\t{}", address, opcode, text);
}

fn print_value(chip8: &Chip8, attribute: Attribute) {
    let output = Output::Debugger(Condition::Always);
    match attribute {
        Attribute::Sp => dprintln!(Always, "SP: {:02x}", chip8.sp),
        Attribute::Dt => dprintln!(Always, "DT: {:02x}", chip8.dt),
        Attribute::St => dprintln!(Always, "ST: {:02x}", chip8.st),
        Attribute::Pc => dprintln!(Always, "PC: {:03x}", chip8.pc),
        Attribute::I => dprintln!(Always, "I:  {:03x}", chip8.i),
        Attribute::Vk => dprintln!(Always, "VK: V{:01x}", chip8.vk),
        Attribute::Stack => output.print_stack(chip8),
        Attribute::Background => dprintln!(Always, "BG: {:06x}", chip8.palette.background),
        Attribute::Foreground => dprintln!(Always, "FG: {:06x}", chip8.palette.foreground),
        Attribute::SmallFont => dprintln!(Always, "SFONT: {}", chip8.fonts.small.name()),
        Attribute::BigFont => dprintln!(Always, "BFONT: {}", chip8.fonts.big.name()),
        Attribute::Quirks => dprintln!(Always, "Quirks: {}", chip8.quirks),
        Attribute::V(None) => output.print_registers(chip8),
        Attribute::V(Some(index)) => {
            dprintln!(Always, "V{:01x}: {:02x}", index, chip8.v[index as usize])
        }
        Attribute::R(None) => output.print_flags(chip8),
        Attribute::R(Some(index)) => {
            dprintln!(Always, "R{:01x}: {:02x}", index, chip8.r[index as usize])
        }
        Attribute::Address(address) => print_instruction(chip8, address),
    }
}

fn print_overview(chip8: &Chip8) {
    let output = Output::Debugger(Condition::Always);
    print_instruction(chip8, chip8.pc);
    dprintln!(Always, "PC: {:03x}\t\tSP: {:02x}", chip8.pc, chip8.sp);
    dprintln!(Always, "DT: {:02x}\t\tST: {:02x}", chip8.dt, chip8.st);
    dprintln!(Always, "I:  {:03x}\t\tK:  V{:01x}", chip8.i, chip8.vk);
    dprintln!(
        Always,
        "BG: {:06x}\tFG: {:06x}",
        chip8.palette.background,
        chip8.palette.foreground
    );
    dprintln!(
        Always,
        "SFONT: {}\tBFONT: {}",
        chip8.fonts.small.name(),
        chip8.fonts.big.name()
    );
    output.print_registers(chip8);
    output.print_flags(chip8);
    dprintln!(Always, "Stack:");
    output.print_stack(chip8);
    dprintln!(Always, "Quirks: {}", chip8.quirks);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::SmallFont;

    fn setup() -> Chip8 {
        let mut chip8 = Chip8::new();
        chip8.load_rom(&[0x00, 0xE0, 0x12, 0x00]).unwrap();
        chip8
    }

    #[test]
    fn control_flow() {
        let mut chip8 = setup();
        assert_eq!(run_line(&mut chip8, "continue"), Ok(Some(DebugState::Continue)));
        assert_eq!(run_line(&mut chip8, "next"), Ok(Some(DebugState::Step)));
        assert_eq!(run_line(&mut chip8, "quit"), Ok(Some(DebugState::Quit)));
        assert_eq!(run_line(&mut chip8, ""), Ok(None));
        assert_eq!(
            run_line(&mut chip8, "bogus"),
            Err(CommandError::InvalidCommand)
        );
    }

    #[test]
    fn breakpoints_default_to_pc() {
        let mut chip8 = setup();
        run_line(&mut chip8, "break").unwrap();
        run_line(&mut chip8, "break $204").unwrap();
        assert_eq!(chip8.breakpoints.iter().collect::<Vec<_>>(), [0x200, 0x204]);
        run_line(&mut chip8, "rmbreak").unwrap();
        assert_eq!(chip8.breakpoints.iter().collect::<Vec<_>>(), [0x204]);
    }

    #[test]
    fn sets_values() {
        let mut chip8 = setup();
        run_line(&mut chip8, "set V3 $2a").unwrap();
        run_line(&mut chip8, "set R7 9").unwrap();
        run_line(&mut chip8, "set PC $202").unwrap();
        run_line(&mut chip8, "set I 0x300").unwrap();
        run_line(&mut chip8, "set $300 255").unwrap();
        run_line(&mut chip8, "set quirks dl").unwrap();
        run_line(&mut chip8, "set sfont vip").unwrap();
        run_line(&mut chip8, "set bg #102030").unwrap();
        assert_eq!(chip8.v[3], 0x2A);
        assert_eq!(chip8.r[7], 9);
        assert_eq!(chip8.pc, 0x202);
        assert_eq!(chip8.i, 0x300);
        assert_eq!(chip8.mem[0x300], 0xFF);
        assert!(chip8.quirks.draw && chip8.quirks.load_store);
        assert_eq!(chip8.fonts.small, SmallFont::Vip);
        assert_eq!(chip8.mem[5], 0x60);
        assert_eq!(chip8.palette.background, 0x102030);
    }

    #[test]
    fn rejects_bad_values() {
        let mut chip8 = setup();
        for line in [
            "set V3 256",
            "set V 1",
            "set stack 1",
            "set SP 17",
            "set VK $10",
            "set quirks x",
            "set bfont vip",
            "set fg red",
        ] {
            assert_eq!(
                run_line(&mut chip8, line),
                Err(CommandError::InvalidArgument),
                "{line}"
            );
        }
        assert_eq!(
            run_line(&mut chip8, "set V3"),
            Err(CommandError::NotEnoughArguments)
        );
    }

    #[test]
    fn missing_files() {
        let mut chip8 = setup();
        assert_eq!(
            run_line(&mut chip8, "load /nonexistent/c8/state"),
            Err(CommandError::InvalidFile)
        );
        assert_eq!(
            run_line(&mut chip8, "saveflags /nonexistent/c8/flags"),
            Err(CommandError::InvalidFile)
        );
    }

    #[test]
    fn saves_and_loads_files() {
        let dir = std::env::temp_dir();
        let state = dir.join(format!("c8-debugger-state-{}", std::process::id()));
        let flags = dir.join(format!("c8-debugger-flags-{}", std::process::id()));

        let mut chip8 = setup();
        chip8.v[1] = 7;
        chip8.r[0] = 3;
        run_line(&mut chip8, &format!("save {}", state.display())).unwrap();
        run_line(&mut chip8, &format!("saveflags {}", flags.display())).unwrap();
        assert_eq!(fs::read(&flags).unwrap().len(), 8);

        let mut loaded = Chip8::new();
        run_line(&mut loaded, &format!("load {}", state.display())).unwrap();
        assert_eq!(loaded.v[1], 7);
        assert_eq!(loaded.fetch(), 0x00E0);

        let mut loaded = Chip8::new();
        run_line(&mut loaded, &format!("loadflags {}", flags.display())).unwrap();
        assert_eq!(loaded.r[0], 3);

        let _ = fs::remove_file(state);
        let _ = fs::remove_file(flags);
    }

    #[test]
    fn scripted_repl() {
        let mut chip8 = setup();
        let mut debugger = Debugger::new(DebuggerOptions {
            command: Some("set V0 1; break $202; print V0; next".to_string()),
        });
        assert_eq!(debugger.repl(&mut chip8), DebugState::Step);
        assert_eq!(chip8.v[0], 1);
        assert!(chip8.breakpoints.contains(0x202));
        // Out of commands
        assert_eq!(debugger.repl(&mut chip8), DebugState::Quit);
    }
}
