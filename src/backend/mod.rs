mod terminal;

pub use self::terminal::TerminalBackend;
use crate::display::Display;
use crate::error::C8Error;
use crate::palette::Palette;
use crate::runtime::KEY_COUNT;

/// Result of polling a backend for input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// User asked to close the emulator.
    Quit,
    /// No new key press.
    Idle,
    /// Key slot pressed since the last tick.
    Key(u8),
}

/// Everything the emulator needs from a window, speaker and keyboard.
pub trait Backend {
    fn init(&mut self) -> Result<(), C8Error>;

    /// Must leave the terminal usable for the debugger.
    fn deinit(&mut self);

    fn render(&mut self, display: &Display, palette: &Palette) -> Result<(), C8Error>;

    /// Update `keys` with the currently held keys.
    fn tick(&mut self, keys: &mut [bool; KEY_COUNT]) -> Tick;

    fn start_sound(&mut self);

    fn stop_sound(&mut self);
}

/// Backend without any output or input.
#[derive(Debug, Default)]
pub struct Headless;

impl Backend for Headless {
    fn init(&mut self) -> Result<(), C8Error> {
        Ok(())
    }

    fn deinit(&mut self) {}

    fn render(&mut self, _display: &Display, _palette: &Palette) -> Result<(), C8Error> {
        Ok(())
    }

    fn tick(&mut self, _keys: &mut [bool; KEY_COUNT]) -> Tick {
        Tick::Idle
    }

    fn start_sound(&mut self) {}

    fn stop_sound(&mut self) {}
}
