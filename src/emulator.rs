use std::time::{Duration, Instant};

use spin_sleep::SpinSleeper;

use crate::backend::{Backend, Tick};
use crate::debugger::{DebugState, Debugger, DebuggerOptions};
use crate::decoder::decode_instruction;
use crate::error::C8Error;
use crate::runtime::{Chip8, DEBUG_ENTER_KEY, DEBUG_EXIT_KEY};

/// Delay and sound timers count down at 60 Hz.
const TIMER_PERIOD: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// Falling further behind than this resets the pacing, instead of running in a burst.
const MAX_LAG: Duration = Duration::from_millis(100);

#[derive(Debug, Default)]
pub struct RunOptions {
    /// Stop after this many clock cycles. Cycles spent waiting for a key are counted.
    pub cycles: Option<u64>,
}

/// Drives a [`Chip8`] at its clock speed, connected to a [`Backend`] and the debugger.
pub struct Emulator {
    chip8: Chip8,
    backend: Box<dyn Backend>,
    debugger: Debugger,
    sounding: bool,
    /// Breakpoint already handled at this address, until an instruction executes.
    skip_breakpoint: Option<u16>,
}

impl Emulator {
    pub fn new(chip8: Chip8, backend: Box<dyn Backend>, debugger_opts: DebuggerOptions) -> Self {
        Self {
            chip8,
            backend,
            debugger: Debugger::new(debugger_opts),
            sounding: false,
            skip_breakpoint: None,
        }
    }

    pub fn chip8(&self) -> &Chip8 {
        &self.chip8
    }

    pub fn into_chip8(self) -> Chip8 {
        self.chip8
    }

    /// Run until the program exits, the user quits, or the cycle limit is reached.
    ///
    /// The backend is always deinitialized before returning.
    pub fn run(&mut self, options: &RunOptions) -> Result<(), C8Error> {
        self.backend.init()?;
        let result = self.run_loop(options);
        if self.sounding {
            self.backend.stop_sound();
            self.sounding = false;
        }
        self.backend.deinit();
        result
    }

    fn run_loop(&mut self, options: &RunOptions) -> Result<(), C8Error> {
        let sleeper = SpinSleeper::default();
        let cycle = Duration::from_secs(1) / self.chip8.clock_speed.max(1);
        let mut next_cycle = Instant::now();
        let mut next_timer = next_cycle + TIMER_PERIOD;
        let mut cycles = 0u64;

        while self.chip8.running {
            if options.cycles.is_some_and(|limit| cycles >= limit) {
                break;
            }
            cycles += 1;

            let now = Instant::now();
            if now >= next_timer {
                next_timer += TIMER_PERIOD;
                if now > next_timer + MAX_LAG {
                    next_timer = now + TIMER_PERIOD;
                }
                self.chip8.tick_timers();
                self.update_sound();
                if !self.poll_input() {
                    break;
                }
                self.render()?;
            }

            if self.should_break() {
                self.backend.deinit();
                let state = self.debugger.repl(&mut self.chip8);
                self.backend.init()?;
                self.chip8.draw = true;
                self.skip_breakpoint = Some(self.chip8.pc);
                match state {
                    DebugState::Continue => self.chip8.debug = false,
                    DebugState::Step => (),
                    DebugState::Quit => break,
                }
                next_cycle = Instant::now();
            }

            let executes = self.chip8.running && !self.chip8.waiting_for_key;
            if executes && self.chip8.verbose {
                self.trace();
            }
            self.chip8.step()?;
            if executes {
                self.skip_breakpoint = None;
            }
            self.update_sound();

            next_cycle += cycle;
            let now = Instant::now();
            if next_cycle > now {
                sleeper.sleep(next_cycle - now);
            } else if now - next_cycle > MAX_LAG {
                next_cycle = now;
            }
        }

        self.render()
    }

    /// Whether the debugger should take over before the next instruction.
    fn should_break(&mut self) -> bool {
        let pc = self.chip8.pc;
        if self.skip_breakpoint == Some(pc) {
            return false;
        }
        if self.chip8.breakpoints.contains(pc) {
            self.chip8.debug = true;
        }
        self.chip8.debug
    }

    /// Returns `false` if the user asked to quit.
    fn poll_input(&mut self) -> bool {
        match self.backend.tick(&mut self.chip8.keys) {
            Tick::Quit => return false,
            Tick::Idle => (),
            Tick::Key(DEBUG_ENTER_KEY) => self.chip8.debug = true,
            Tick::Key(DEBUG_EXIT_KEY) => self.chip8.debug = false,
            Tick::Key(key) => self.chip8.press_key(key),
        }
        true
    }

    fn render(&mut self) -> Result<(), C8Error> {
        if self.chip8.draw {
            self.backend
                .render(&self.chip8.display, &self.chip8.palette)?;
            self.chip8.draw = false;
        }
        Ok(())
    }

    fn update_sound(&mut self) {
        let sounding = self.chip8.st > 0;
        if sounding == self.sounding {
            return;
        }
        if sounding {
            self.backend.start_sound();
        } else {
            self.backend.stop_sound();
        }
        self.sounding = sounding;
    }

    fn trace(&self) {
        let opcode = self.chip8.fetch();
        let text =
            decode_instruction(opcode, None).unwrap_or_else(|| format!(".DW ${opcode:04X}"));
        dprintln!(Always, "${:03x}: {:04x}\t{}", self.chip8.pc, opcode, text);
    }
}
