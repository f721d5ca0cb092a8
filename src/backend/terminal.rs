use std::collections::VecDeque;
use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, Print, SetBackgroundColor, SetForegroundColor};
use crossterm::{cursor, execute, queue, terminal};

use super::{Backend, Tick};
use crate::display::Display;
use crate::error::{C8Error, ErrorKind};
use crate::palette::Palette;
use crate::runtime::{DEBUG_ENTER_KEY, DEBUG_EXIT_KEY, KEY_COUNT};

/// Left-hand side of a qwerty keyboard, laid out like the COSMAC VIP keypad.
const KEYMAP: [(char, u8); 18] = [
    ('x', 0x0),
    ('1', 0x1),
    ('2', 0x2),
    ('3', 0x3),
    ('q', 0x4),
    ('w', 0x5),
    ('e', 0x6),
    ('a', 0x7),
    ('s', 0x8),
    ('d', 0x9),
    ('z', 0xA),
    ('c', 0xB),
    ('4', 0xC),
    ('r', 0xD),
    ('f', 0xE),
    ('v', 0xF),
    ('p', DEBUG_ENTER_KEY),
    ('m', DEBUG_EXIT_KEY),
];

fn key_slot(ch: char) -> Option<u8> {
    let ch = ch.to_ascii_lowercase();
    KEYMAP
        .iter()
        .find(|(key, _)| *key == ch)
        .map(|(_, slot)| *slot)
}

/// Renders into the alternate screen, two pixels per character cell.
pub struct TerminalBackend {
    stdout: Stdout,
    active: bool,
    /// Presses read from the terminal but not yet returned from a tick.
    pending: VecDeque<u8>,
}

impl Default for TerminalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalBackend {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            active: false,
            pending: VecDeque::new(),
        }
    }

    fn color(color: u32) -> Color {
        let (r, g, b) = Palette::channels(color);
        Color::Rgb { r, g, b }
    }

    fn draw(&mut self, display: &Display, palette: &Palette) -> io::Result<()> {
        let (on, off) = (
            Self::color(palette.foreground),
            Self::color(palette.background),
        );
        queue!(self.stdout, cursor::MoveTo(0, 0))?;
        for y in (0..display.height()).step_by(2) {
            for x in 0..display.width() {
                let top = if display.get(x, y) { on } else { off };
                let bottom = if display.get(x, y + 1) { on } else { off };
                queue!(
                    self.stdout,
                    SetForegroundColor(top),
                    SetBackgroundColor(bottom),
                    Print('▀')
                )?;
            }
            queue!(self.stdout, cursor::MoveToNextLine(1))?;
        }
        self.stdout.flush()
    }

    fn poll(&mut self, keys: &mut [bool; KEY_COUNT]) -> io::Result<Tick> {
        // Terminals report presses only, so a key counts as held until the next tick
        keys.fill(false);
        while event::poll(Duration::from_millis(0))? {
            if self.handle_event(event::read()?) {
                return Ok(Tick::Quit);
            }
        }
        Ok(self.next_tick(keys))
    }

    /// Queue a key press. Returns `true` if the event asks to quit.
    fn handle_event(&mut self, event: Event) -> bool {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind,
            ..
        }) = event
        else {
            return false;
        };
        if kind == KeyEventKind::Release {
            return false;
        }
        match code {
            KeyCode::Esc => true,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => true,
            KeyCode::Char(ch) => {
                if let Some(slot) = key_slot(ch) {
                    self.pending.push_back(slot);
                }
                false
            }
            _ => false,
        }
    }

    /// One queued press per tick, so debug keys typed alongside keypad keys are kept.
    fn next_tick(&mut self, keys: &mut [bool; KEY_COUNT]) -> Tick {
        for slot in &self.pending {
            keys[*slot as usize] = true;
        }
        match self.pending.pop_front() {
            Some(slot) => Tick::Key(slot),
            None => Tick::Idle,
        }
    }
}

impl Backend for TerminalBackend {
    fn init(&mut self) -> Result<(), C8Error> {
        let result = terminal::enable_raw_mode().and_then(|()| {
            execute!(
                self.stdout,
                terminal::EnterAlternateScreen,
                cursor::Hide,
                terminal::Clear(terminal::ClearType::All)
            )
        });
        if let Err(err) = result {
            let _ = terminal::disable_raw_mode();
            return Err(C8Error::new(
                ErrorKind::GraphicsInitFailure,
                format!("Failed to initialize terminal: {err}"),
            ));
        }
        self.active = true;
        Ok(())
    }

    fn deinit(&mut self) {
        if !self.active {
            return;
        }
        let _ = execute!(
            self.stdout,
            SetForegroundColor(Color::Reset),
            SetBackgroundColor(Color::Reset),
            cursor::Show,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
        self.active = false;
    }

    fn render(&mut self, display: &Display, palette: &Palette) -> Result<(), C8Error> {
        self.draw(display, palette).map_err(|err| {
            C8Error::new(
                ErrorKind::GraphicsInitFailure,
                format!("Failed to draw to terminal: {err}"),
            )
        })
    }

    fn tick(&mut self, keys: &mut [bool; KEY_COUNT]) -> Tick {
        // A terminal which cannot be read from can no longer be controlled
        self.poll(keys).unwrap_or(Tick::Quit)
    }

    fn start_sound(&mut self) {
        let _ = execute!(self.stdout, Print('\x07'));
    }

    fn stop_sound(&mut self) {}
}

impl Drop for TerminalBackend {
    fn drop(&mut self) {
        self.deinit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_keypad() {
        assert_eq!(key_slot('x'), Some(0x0));
        assert_eq!(key_slot('4'), Some(0xC));
        assert_eq!(key_slot('V'), Some(0xF));
        assert_eq!(key_slot('p'), Some(DEBUG_ENTER_KEY));
        assert_eq!(key_slot('m'), Some(DEBUG_EXIT_KEY));
        assert_eq!(key_slot('0'), None);
    }

    fn press(ch: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE))
    }

    #[test]
    fn queues_every_press() {
        let mut backend = TerminalBackend::new();
        let mut keys = [false; KEY_COUNT];
        assert!(!backend.handle_event(press('z')));
        assert!(!backend.handle_event(press('p')));

        assert_eq!(backend.next_tick(&mut keys), Tick::Key(0xA));
        assert!(keys[0xA] && keys[DEBUG_ENTER_KEY as usize]);
        keys.fill(false);
        assert_eq!(backend.next_tick(&mut keys), Tick::Key(DEBUG_ENTER_KEY));
        keys.fill(false);
        assert_eq!(backend.next_tick(&mut keys), Tick::Idle);
        assert!(!keys.contains(&true));
    }

    #[test]
    fn quits_on_escape() {
        let mut backend = TerminalBackend::new();
        let escape = Event::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        let interrupt = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(backend.handle_event(escape));
        assert!(backend.handle_event(interrupt));
        assert!(!backend.handle_event(Event::FocusGained));
    }
}
