use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args as ClapArgs, Parser, Subcommand};
use colored::Colorize;
use miette::{IntoDiagnostic, Result};

use c8::backend::{Backend, Headless, TerminalBackend};
use c8::{assemble, decode_program, C8Error, DecodeOptions, ErrorKind, Output, PROGRAM_CAPACITY};
use c8::{Chip8, DebuggerOptions, Emulator, Fonts, Mode, Palette, Quirks, RunOptions};

/// c8 is an assembler, disassembler and debugging interpreter for CHIP-8, SCHIP and XO-CHIP.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.asm` or `.ch8` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run text `.asm` or binary `.ch8` file
    Run {
        /// `.asm` or `.ch8` file to run
        name: PathBuf,
        #[command(flatten)]
        options: RunArgs,
    },
    /// Run text `.asm` or binary `.ch8` file with debugger
    Debug {
        /// `.asm` or `.ch8` file to run
        name: PathBuf,
        /// Read debugger commands from argument, separated by `;` or newlines
        #[arg(long)]
        command: Option<String>,
        #[command(flatten)]
        options: RunArgs,
    },
    /// Create binary `.ch8` file to run later
    Compile {
        /// `.asm` file to compile
        name: PathBuf,
        /// Destination to output `.ch8` file
        dest: Option<PathBuf>,
    },
    /// Check a `.asm` file without running or outputting binary
    Check {
        /// File to check
        name: PathBuf,
    },
    /// Print the assembly of a binary `.ch8` file
    Decode {
        /// `.ch8` file to decode
        name: PathBuf,
        /// Name jump and call targets
        #[arg(short, long)]
        labels: bool,
        /// Prefix each line with its address
        #[arg(short, long)]
        addresses: bool,
    },
}

#[derive(ClapArgs, Default)]
struct RunArgs {
    /// Instructions per second
    #[arg(short, long, default_value_t = c8::DEFAULT_CLOCK_SPEED as i64, allow_negative_numbers = true)]
    clock: i64,
    /// Start in debug mode
    #[arg(short, long)]
    debug: bool,
    /// Small and big font, as `small,big`
    #[arg(short, long)]
    fonts: Option<String>,
    /// File containing a palette, as `RRGGBB,RRGGBB`
    #[arg(short, long)]
    palette_file: Option<PathBuf>,
    /// Background and foreground colors, as `RRGGBB,RRGGBB`
    #[arg(short = 'P', long)]
    palette: Option<String>,
    /// Enabled quirks, as letters from `bdjls`
    #[arg(short, long)]
    quirks: Option<String>,
    /// Print every instruction as it is executed
    #[arg(short, long)]
    verbose: bool,
    /// `chip8`, `schip` or `xochip`
    #[arg(long)]
    mode: Option<String>,
    /// Run without display, sound or keyboard
    #[arg(long)]
    headless: bool,
    /// Stop after this many clock cycles
    #[arg(long)]
    cycles: Option<u64>,
    /// Produce minimal output, suited for blackbox tests
    #[arg(short, long)]
    minimal: bool,
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    c8::env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(c8::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    if let Some(command) = args.command {
        match command {
            Command::Run { name, options } => run(&name, options, None),
            Command::Debug {
                name,
                command,
                options,
            } => run(&name, options, Some(DebuggerOptions { command })),
            Command::Compile { name, dest } => {
                file_message(Green, "Assembling", &name);
                let bytes = assemble_file(&name)?;

                let out_file_name = dest.unwrap_or_else(|| name.with_extension("ch8"));
                fs::write(&out_file_name, &bytes).into_diagnostic()?;

                message(Green, "Finished", &format!("emit {} bytes", bytes.len()));
                file_message(Green, "Saved", &out_file_name);
                Ok(())
            }
            Command::Check { name } => {
                file_message(Green, "Checking", &name);
                let _ = assemble_file(&name)?;
                message(Green, "Success", "no errors found!");
                Ok(())
            }
            Command::Decode {
                name,
                labels,
                addresses,
            } => {
                let rom = read_file(&name)?;
                if rom.len() > PROGRAM_CAPACITY {
                    return Err(C8Error::new(
                        ErrorKind::FileTooBig,
                        format!(
                            "Program is {} bytes, the maximum is {PROGRAM_CAPACITY}",
                            rom.len()
                        ),
                    )
                    .into());
                }
                let text = decode_program(
                    &rom,
                    DecodeOptions {
                        define_labels: labels,
                        print_addresses: addresses,
                    },
                );
                Output::Normal.print_str(&text);
                Ok(())
            }
        }
    } else if let Some(path) = args.path {
        run(&path, RunArgs::default_for_path(), None)
    } else {
        println!("\n~ c8 v{VERSION} ~");
        println!("{SHORT_INFO}");
        std::process::exit(0);
    }
}

#[allow(unused)]
enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message(color: MsgColor, left: &str, right: &str) {
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

impl RunArgs {
    /// Options for `c8 <PATH>`, which has no flags of its own.
    fn default_for_path() -> Self {
        Self {
            clock: c8::DEFAULT_CLOCK_SPEED as i64,
            ..Default::default()
        }
    }
}

fn run(name: &Path, options: RunArgs, debugger_opts: Option<DebuggerOptions>) -> Result<()> {
    use MsgColor::*;
    Output::set_minimal(options.minimal);

    let clock_speed = u32::try_from(options.clock)
        .ok()
        .filter(|clock| *clock >= 1)
        .ok_or_else(|| {
            C8Error::new(
                ErrorKind::InvalidClockSpeed,
                format!("Clock speed {} is less than 1", options.clock),
            )
        })?;

    let mut chip8 = Chip8::new();
    chip8.clock_speed = clock_speed;
    chip8.verbose = options.verbose;
    chip8.debug = options.debug || debugger_opts.is_some();
    if let Some(fonts) = &options.fonts {
        chip8.set_fonts(fonts.parse::<Fonts>()?);
    }
    if let Some(quirks) = &options.quirks {
        chip8.quirks = quirks.parse::<Quirks>()?;
    }
    if let Some(mode) = &options.mode {
        chip8.mode = mode.parse::<Mode>()?;
    }
    if let Some(palette) = &options.palette {
        chip8.palette = palette.parse::<Palette>()?;
    } else if let Some(path) = &options.palette_file {
        let text = fs::read_to_string(path).map_err(|err| {
            C8Error::new(
                ErrorKind::LoadFileFailure,
                format!("Cannot read palette file '{}': {err}", path.display()),
            )
        })?;
        chip8.palette = text.parse::<Palette>()?;
    }
    if let Some(seed) = c8::env::seed() {
        chip8.seed(seed);
    }

    let rom = if is_source(name) {
        file_message(Green, "Assembling", name);
        assemble_file(name)?
    } else {
        read_file(name)?
    };
    chip8.load_rom(&rom)?;

    let backend: Box<dyn Backend> = if options.headless || c8::env::is_headless() {
        Box::new(Headless)
    } else {
        Box::new(TerminalBackend::new())
    };

    message(Green, "Running", &format!("{} mode", chip8.mode));
    let mut emulator = Emulator::new(chip8, backend, debugger_opts.unwrap_or_default());
    emulator.run(&RunOptions {
        cycles: options.cycles,
    })?;

    file_message(Green, "Completed", name);
    Ok(())
}

fn is_source(name: &Path) -> bool {
    name.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "asm" | "c8s"))
}

fn read_file(name: &Path) -> Result<Vec<u8>> {
    fs::read(name).map_err(|err| {
        C8Error::new(
            ErrorKind::LoadFileFailure,
            format!("Cannot read '{}': {err}", name.display()),
        )
        .into()
    })
}

/// Return program image of source file, with the offending line quoted on error
fn assemble_file(name: &Path) -> Result<Vec<u8>> {
    let src = fs::read_to_string(name).map_err(|err| {
        C8Error::new(
            ErrorKind::LoadFileFailure,
            format!("Cannot read '{}': {err}", name.display()),
        )
    })?;
    assemble(&src).map_err(|err| err.into_report(&src))
}

const SHORT_INFO: &str = r"
Welcome to c8, an all-in-one toolchain for CHIP-8, SCHIP and XO-CHIP programs.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
