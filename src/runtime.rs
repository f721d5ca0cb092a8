use std::fmt;
use std::str::FromStr;

use rand::{rngs::StdRng, RngCore, SeedableRng};

use crate::assembler::PROGRAM_CAPACITY;
use crate::debugger::Breakpoints;
use crate::display::Display;
use crate::error::{self, C8Error, ErrorKind};
use crate::font::{Fonts, BIG_FONT_ADDR, BIG_GLYPH_LEN, SMALL_FONT_ADDR, SMALL_GLYPH_LEN};
use crate::palette::Palette;
use crate::quirks::Quirks;
use crate::{MEMORY_SIZE, PROGRAM_START};

/// Subroutine nesting limit.
pub const STACK_SIZE: usize = 16;
/// Keypad keys plus the two debugger keys.
pub const KEY_COUNT: usize = 18;
/// Key slot which pauses execution in the debugger.
pub const DEBUG_ENTER_KEY: u8 = 16;
/// Key slot which resumes execution from the debugger.
pub const DEBUG_EXIT_KEY: u8 = 17;
/// Default instructions per second.
pub const DEFAULT_CLOCK_SPEED: u32 = 1000;

/// Instruction set accepted at run time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Original instruction set only.
    Chip8,
    #[default]
    Schip,
    XoChip,
}

impl Mode {
    const ALL: [Mode; 3] = [Self::Chip8, Self::Schip, Self::XoChip];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Chip8 => "chip8",
            Self::Schip => "schip",
            Self::XoChip => "xochip",
        }
    }

    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }
}

impl FromStr for Mode {
    type Err = C8Error;
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| C8Error::new(ErrorKind::Unknown, format!("Unknown mode '{name}'")))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Complete machine state.
pub struct Chip8 {
    pub mem: Box<[u8; MEMORY_SIZE]>,
    /// Flag registers, persisted by `LD R, Vx`.
    pub r: [u8; 8],
    pub v: [u8; 16],
    pub sp: u8,
    pub dt: u8,
    pub st: u8,
    pub stack: [u16; STACK_SIZE],
    pub pc: u16,
    pub i: u16,
    pub keys: [bool; KEY_COUNT],
    /// Register receiving the next key press while waiting for a key.
    pub vk: u8,
    /// Instructions per second.
    pub clock_speed: u32,
    pub waiting_for_key: bool,
    /// Cleared by `EXIT`.
    pub running: bool,
    pub display: Display,
    pub quirks: Quirks,
    pub debug: bool,
    pub verbose: bool,
    pub breakpoints: Breakpoints,
    pub palette: Palette,
    pub fonts: Fonts,
    /// Display changed since last render.
    pub draw: bool,
    pub mode: Mode,
    rng: StdRng,
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}

impl Chip8 {
    pub fn new() -> Self {
        let mut chip8 = Self {
            mem: Box::new([0; MEMORY_SIZE]),
            r: [0; 8],
            v: [0; 16],
            sp: 0,
            dt: 0,
            st: 0,
            stack: [0; STACK_SIZE],
            pc: PROGRAM_START,
            i: 0,
            keys: [false; KEY_COUNT],
            vk: 0,
            clock_speed: DEFAULT_CLOCK_SPEED,
            waiting_for_key: false,
            running: true,
            display: Display::new(),
            quirks: Quirks::default(),
            debug: false,
            verbose: false,
            breakpoints: Breakpoints::default(),
            palette: Palette::default(),
            fonts: Fonts::default(),
            draw: true,
            mode: Mode::default(),
            rng: StdRng::from_entropy(),
        };
        chip8.set_fonts(Fonts::default());
        chip8
    }

    /// Make `RND` deterministic.
    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Select fonts and copy them into memory.
    pub fn set_fonts(&mut self, fonts: Fonts) {
        self.fonts = fonts;
        fonts.load_into(self.mem.as_mut_slice());
    }

    /// Copy a program image to [`PROGRAM_START`].
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), C8Error> {
        if rom.len() > PROGRAM_CAPACITY {
            return Err(C8Error::new(
                ErrorKind::FileTooBig,
                format!(
                    "Program is {} bytes, the maximum is {PROGRAM_CAPACITY}",
                    rom.len()
                ),
            ));
        }
        let start = PROGRAM_START as usize;
        self.mem[start..start + rom.len()].copy_from_slice(rom);
        self.pc = PROGRAM_START;
        Ok(())
    }

    /// Byte at `address`, which wraps around memory.
    pub fn read(&self, address: u16) -> u8 {
        self.mem[address as usize % MEMORY_SIZE]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.mem[address as usize % MEMORY_SIZE] = value;
    }

    /// Big-endian word at `address`.
    pub fn word(&self, address: u16) -> u16 {
        u16::from_be_bytes([self.read(address), self.read(address.wrapping_add(1))])
    }

    /// Opcode about to be executed.
    pub fn fetch(&self) -> u16 {
        self.word(self.pc)
    }

    /// Record a key press from the backend. Resolves a pending `LD Vx, K`.
    pub fn press_key(&mut self, key: u8) {
        let Some(slot) = self.keys.get_mut(key as usize) else {
            return;
        };
        *slot = true;
        if self.waiting_for_key && key < 16 {
            self.v[self.vk as usize & 0xF] = key;
            self.waiting_for_key = false;
        }
    }

    /// Decrement both timers, as happens 60 times a second.
    pub fn tick_timers(&mut self) {
        self.dt = self.dt.saturating_sub(1);
        self.st = self.st.saturating_sub(1);
    }

    /// Execute one instruction. Does nothing while waiting for a key.
    pub fn step(&mut self) -> Result<(), C8Error> {
        if self.waiting_for_key || !self.running {
            return Ok(());
        }
        let opcode = self.fetch();
        // PC incremented before instruction is performed
        self.pc = (self.pc + 2) % MEMORY_SIZE as u16;
        Self::OP_TABLE[(opcode >> 12) as usize](self, opcode)
    }

    const OP_TABLE: [fn(&mut Chip8, u16) -> Result<(), C8Error>; 16] = [
        Self::system, // 0x0
        Self::jp,     // 0x1
        Self::call,   // 0x2
        Self::se,     // 0x3
        Self::sne,    // 0x4
        Self::se_reg, // 0x5
        Self::ld,     // 0x6
        Self::add,    // 0x7
        Self::alu,    // 0x8
        Self::sne_reg, // 0x9
        Self::ld_i,   // 0xA
        Self::jp_v,   // 0xB
        Self::rnd,    // 0xC
        Self::drw,    // 0xD
        Self::key,    // 0xE
        Self::misc,   // 0xF
    ];

    #[inline]
    fn x(opcode: u16) -> usize {
        (opcode as usize >> 8) & 0xF
    }

    #[inline]
    fn y(opcode: u16) -> usize {
        (opcode as usize >> 4) & 0xF
    }

    #[inline]
    fn kk(opcode: u16) -> u8 {
        opcode as u8
    }

    #[inline]
    fn nnn(opcode: u16) -> u16 {
        opcode & 0x0FFF
    }

    /// Address of the instruction being executed.
    fn current(&self) -> u16 {
        self.pc.wrapping_sub(2) % MEMORY_SIZE as u16
    }

    fn unknown(&self, opcode: u16) -> Result<(), C8Error> {
        Err(error::unknown_opcode(self.current(), opcode))
    }

    /// Reject instructions which do not exist in CHIP-8 mode.
    fn extended(&self, opcode: u16) -> Result<(), C8Error> {
        if self.mode != Mode::Chip8 {
            return Ok(());
        }
        Err(C8Error::new(
            ErrorKind::InvalidInstruction,
            format!(
                "Opcode {opcode:04X} at ${:03X} is not available in CHIP-8 mode",
                self.current()
            ),
        ))
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.pc = (self.pc + 2) % MEMORY_SIZE as u16;
        }
    }

    fn system(&mut self, opcode: u16) -> Result<(), C8Error> {
        match opcode {
            0x00E0 => {
                self.display.clear();
                self.draw = true;
            }
            0x00EE => {
                if self.sp == 0 {
                    return Err(error::stack_underflow(self.current()));
                }
                self.sp -= 1;
                self.pc = self.stack[self.sp as usize];
            }
            0x00C0..=0x00CF => {
                self.extended(opcode)?;
                self.display.scroll_down((opcode & 0xF) as usize);
                self.draw = true;
            }
            0x00FB => {
                self.extended(opcode)?;
                self.display.scroll_right(4);
                self.draw = true;
            }
            0x00FC => {
                self.extended(opcode)?;
                self.display.scroll_left(4);
                self.draw = true;
            }
            0x00FD => {
                self.extended(opcode)?;
                self.running = false;
            }
            0x00FE | 0x00FF => {
                self.extended(opcode)?;
                self.display.set_high_res(opcode == 0x00FF);
                self.draw = true;
            }
            _ => return self.unknown(opcode),
        }
        Ok(())
    }

    fn jp(&mut self, opcode: u16) -> Result<(), C8Error> {
        self.pc = Self::nnn(opcode);
        Ok(())
    }

    fn call(&mut self, opcode: u16) -> Result<(), C8Error> {
        if self.sp as usize >= STACK_SIZE {
            return Err(error::stack_overflow(self.current()));
        }
        self.stack[self.sp as usize] = self.pc;
        self.sp += 1;
        self.pc = Self::nnn(opcode);
        Ok(())
    }

    fn se(&mut self, opcode: u16) -> Result<(), C8Error> {
        self.skip_if(self.v[Self::x(opcode)] == Self::kk(opcode));
        Ok(())
    }

    fn sne(&mut self, opcode: u16) -> Result<(), C8Error> {
        self.skip_if(self.v[Self::x(opcode)] != Self::kk(opcode));
        Ok(())
    }

    fn se_reg(&mut self, opcode: u16) -> Result<(), C8Error> {
        if opcode & 0xF != 0 {
            return self.unknown(opcode);
        }
        self.skip_if(self.v[Self::x(opcode)] == self.v[Self::y(opcode)]);
        Ok(())
    }

    fn ld(&mut self, opcode: u16) -> Result<(), C8Error> {
        self.v[Self::x(opcode)] = Self::kk(opcode);
        Ok(())
    }

    fn add(&mut self, opcode: u16) -> Result<(), C8Error> {
        let x = Self::x(opcode);
        self.v[x] = self.v[x].wrapping_add(Self::kk(opcode));
        Ok(())
    }

    fn alu(&mut self, opcode: u16) -> Result<(), C8Error> {
        let (x, y) = (Self::x(opcode), Self::y(opcode));
        let (vx, vy) = (self.v[x], self.v[y]);
        // VF is written last, so it holds the flag even when it is also an operand
        let (result, flag) = match opcode & 0xF {
            0x0 => (vy, None),
            0x1 => (vx | vy, self.quirks.bitwise.then_some(0)),
            0x2 => (vx & vy, self.quirks.bitwise.then_some(0)),
            0x3 => (vx ^ vy, self.quirks.bitwise.then_some(0)),
            0x4 => {
                let (sum, carry) = vx.overflowing_add(vy);
                (sum, Some(carry as u8))
            }
            0x5 => (vx.wrapping_sub(vy), Some((vx >= vy) as u8)),
            0x6 => {
                let src = if self.quirks.shift { vx } else { vy };
                (src >> 1, Some(src & 1))
            }
            0x7 => (vy.wrapping_sub(vx), Some((vy >= vx) as u8)),
            0xE => {
                let src = if self.quirks.shift { vx } else { vy };
                (src << 1, Some(src >> 7))
            }
            _ => return self.unknown(opcode),
        };
        self.v[x] = result;
        if let Some(flag) = flag {
            self.v[0xF] = flag;
        }
        Ok(())
    }

    fn sne_reg(&mut self, opcode: u16) -> Result<(), C8Error> {
        if opcode & 0xF != 0 {
            return self.unknown(opcode);
        }
        self.skip_if(self.v[Self::x(opcode)] != self.v[Self::y(opcode)]);
        Ok(())
    }

    fn ld_i(&mut self, opcode: u16) -> Result<(), C8Error> {
        self.i = Self::nnn(opcode);
        Ok(())
    }

    fn jp_v(&mut self, opcode: u16) -> Result<(), C8Error> {
        let offset = if self.quirks.jump {
            self.v[Self::x(opcode)]
        } else {
            self.v[0]
        };
        self.pc = (Self::nnn(opcode) + offset as u16) % MEMORY_SIZE as u16;
        Ok(())
    }

    fn rnd(&mut self, opcode: u16) -> Result<(), C8Error> {
        let n = self.rng.next_u32() as u8;
        self.v[Self::x(opcode)] = n & Self::kk(opcode);
        Ok(())
    }

    fn drw(&mut self, opcode: u16) -> Result<(), C8Error> {
        let x = self.v[Self::x(opcode)] as usize;
        let y = self.v[Self::y(opcode)] as usize;
        let n = opcode & 0xF;

        let (rows, width): (Vec<u16>, usize) = if n == 0 && self.mode != Mode::Chip8 {
            let rows = (0..16)
                .map(|row| self.word(self.i.wrapping_add(row * 2)))
                .collect();
            (rows, 16)
        } else {
            let rows = (0..n)
                .map(|row| self.read(self.i.wrapping_add(row)) as u16)
                .collect();
            (rows, 8)
        };

        let collision = self.display.draw(x, y, &rows, width, self.quirks.draw);
        self.v[0xF] = collision as u8;
        self.draw = true;
        Ok(())
    }

    fn key(&mut self, opcode: u16) -> Result<(), C8Error> {
        let pressed = self.keys[self.v[Self::x(opcode)] as usize & 0xF];
        match Self::kk(opcode) {
            0x9E => self.skip_if(pressed),
            0xA1 => self.skip_if(!pressed),
            _ => return self.unknown(opcode),
        }
        Ok(())
    }

    fn misc(&mut self, opcode: u16) -> Result<(), C8Error> {
        let x = Self::x(opcode);
        match Self::kk(opcode) {
            0x07 => self.v[x] = self.dt,
            0x0A => {
                self.waiting_for_key = true;
                self.vk = x as u8;
            }
            0x15 => self.dt = self.v[x],
            0x18 => self.st = self.v[x],
            0x1E => self.i = self.i.wrapping_add(self.v[x] as u16),
            0x29 => self.i = SMALL_FONT_ADDR + SMALL_GLYPH_LEN * (self.v[x] & 0xF) as u16,
            0x30 => {
                self.extended(opcode)?;
                self.i = BIG_FONT_ADDR + BIG_GLYPH_LEN * (self.v[x] & 0xF) as u16;
            }
            0x33 => {
                let value = self.v[x];
                self.write(self.i, value / 100);
                self.write(self.i.wrapping_add(1), value / 10 % 10);
                self.write(self.i.wrapping_add(2), value % 10);
            }
            0x55 => {
                for offset in 0..=x {
                    self.write(self.i.wrapping_add(offset as u16), self.v[offset]);
                }
                if self.quirks.load_store {
                    self.i = self.i.wrapping_add(x as u16 + 1);
                }
            }
            0x65 => {
                for offset in 0..=x {
                    self.v[offset] = self.read(self.i.wrapping_add(offset as u16));
                }
                if self.quirks.load_store {
                    self.i = self.i.wrapping_add(x as u16 + 1);
                }
            }
            0x75 => {
                self.extended(opcode)?;
                let count = x.min(self.r.len() - 1) + 1;
                self.r[..count].copy_from_slice(&self.v[..count]);
            }
            0x85 => {
                self.extended(opcode)?;
                let count = x.min(self.r.len() - 1) + 1;
                self.v[..count].copy_from_slice(&self.r[..count]);
            }
            _ => return self.unknown(opcode),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(rom: &[u8]) -> Chip8 {
        let mut chip8 = Chip8::new();
        chip8.seed(0);
        chip8.load_rom(rom).unwrap();
        chip8
    }

    fn run(chip8: &mut Chip8, steps: usize) {
        for _ in 0..steps {
            chip8.step().unwrap();
        }
    }

    #[test]
    fn loads_rom_and_fonts() {
        let chip8 = setup(&[0x12, 0x34]);
        assert_eq!(chip8.pc, PROGRAM_START);
        assert_eq!(chip8.fetch(), 0x1234);
        assert_eq!(chip8.read(0x000), 0xF0);

        let err = Chip8::new().load_rom(&[0; PROGRAM_CAPACITY + 1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileTooBig);
        assert!(Chip8::new().load_rom(&[0; PROGRAM_CAPACITY]).is_ok());
    }

    #[test]
    fn jumps_and_calls() {
        let mut chip8 = setup(&[0x22, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0xEE]);
        run(&mut chip8, 1);
        assert_eq!(chip8.pc, 0x206);
        assert_eq!(chip8.sp, 1);
        assert_eq!(chip8.stack[0], 0x202);
        run(&mut chip8, 1);
        assert_eq!(chip8.pc, 0x202);
        assert_eq!(chip8.sp, 0);
    }

    #[test]
    fn stack_overflow_on_seventeenth_call() {
        // CALL $200, forever
        let mut chip8 = setup(&[0x22, 0x00]);
        run(&mut chip8, STACK_SIZE);
        assert_eq!(chip8.sp as usize, STACK_SIZE);
        let err = chip8.step().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StackOverflow);
    }

    #[test]
    fn stack_underflow() {
        let mut chip8 = setup(&[0x00, 0xEE]);
        let err = chip8.step().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StackUnderflow);
    }

    #[test]
    fn skips() {
        let mut chip8 = setup(&[0x30, 0xAA]);
        run(&mut chip8, 1);
        assert_eq!(chip8.pc, 0x202);

        let mut chip8 = setup(&[0x30, 0xAA]);
        chip8.v[0] = 0xAA;
        run(&mut chip8, 1);
        assert_eq!(chip8.pc, 0x204);

        let mut chip8 = setup(&[0x9A, 0xB0]);
        chip8.v[0xA] = 1;
        run(&mut chip8, 1);
        assert_eq!(chip8.pc, 0x204);
    }

    #[test]
    fn arithmetic_flags() {
        let mut chip8 = setup(&[0x80, 0x14, 0x82, 0x35, 0x84, 0x57]);
        chip8.v[0] = 0xFF;
        chip8.v[1] = 0x02;
        chip8.v[2] = 0x01;
        chip8.v[3] = 0x02;
        chip8.v[4] = 0x05;
        chip8.v[5] = 0x07;
        run(&mut chip8, 1);
        assert_eq!((chip8.v[0], chip8.v[0xF]), (0x01, 1));
        run(&mut chip8, 1);
        assert_eq!((chip8.v[2], chip8.v[0xF]), (0xFF, 0));
        run(&mut chip8, 1);
        assert_eq!((chip8.v[4], chip8.v[0xF]), (0x02, 1));
    }

    #[test]
    fn flag_register_as_operand() {
        // ADD VF, V1
        let mut chip8 = setup(&[0x8F, 0x14]);
        chip8.v[0xF] = 0xFF;
        chip8.v[1] = 0x01;
        run(&mut chip8, 1);
        assert_eq!(chip8.v[0xF], 1);
    }

    #[test]
    fn bitwise_quirk() {
        let mut chip8 = setup(&[0x80, 0x11, 0x80, 0x11]);
        chip8.v[0xF] = 7;
        run(&mut chip8, 1);
        assert_eq!(chip8.v[0xF], 7);
        chip8.quirks.bitwise = true;
        run(&mut chip8, 1);
        assert_eq!(chip8.v[0xF], 0);
    }

    #[test]
    fn shift_quirk() {
        // SHR V0, V1
        let mut chip8 = setup(&[0x80, 0x16, 0x80, 0x16]);
        chip8.v[0] = 0x10;
        chip8.v[1] = 0x03;
        run(&mut chip8, 1);
        assert_eq!((chip8.v[0], chip8.v[0xF]), (0x01, 1));
        chip8.quirks.shift = true;
        chip8.v[0] = 0x10;
        run(&mut chip8, 1);
        assert_eq!((chip8.v[0], chip8.v[0xF]), (0x08, 0));

        // SHL V0, V1
        let mut chip8 = setup(&[0x80, 0x1E]);
        chip8.v[1] = 0x81;
        run(&mut chip8, 1);
        assert_eq!((chip8.v[0], chip8.v[0xF]), (0x02, 1));
    }

    #[test]
    fn jump_quirk() {
        let mut chip8 = setup(&[0xB3, 0x00]);
        chip8.v[0] = 0x02;
        chip8.v[3] = 0x10;
        run(&mut chip8, 1);
        assert_eq!(chip8.pc, 0x302);

        let mut chip8 = setup(&[0xB3, 0x00]);
        chip8.quirks.jump = true;
        chip8.v[0] = 0x02;
        chip8.v[3] = 0x10;
        run(&mut chip8, 1);
        assert_eq!(chip8.pc, 0x310);
    }

    #[test]
    fn load_store_quirk() {
        let mut chip8 = setup(&[0xA3, 0x00, 0xF2, 0x55, 0xF2, 0x65]);
        chip8.v[..3].copy_from_slice(&[1, 2, 3]);
        run(&mut chip8, 2);
        assert_eq!(&chip8.mem[0x300..0x303], &[1, 2, 3]);
        assert_eq!(chip8.i, 0x300);

        chip8.quirks.load_store = true;
        chip8.v[..3].copy_from_slice(&[0, 0, 0]);
        run(&mut chip8, 1);
        assert_eq!(&chip8.v[..3], &[1, 2, 3]);
        assert_eq!(chip8.i, 0x303);
    }

    #[test]
    fn bcd() {
        let mut chip8 = setup(&[0xA3, 0x00, 0xF5, 0x33]);
        chip8.v[5] = 254;
        run(&mut chip8, 2);
        assert_eq!(&chip8.mem[0x300..0x303], &[2, 5, 4]);
    }

    #[test]
    fn fonts() {
        let mut chip8 = setup(&[0xF1, 0x29, 0xF1, 0x30]);
        chip8.v[1] = 0xA;
        run(&mut chip8, 1);
        assert_eq!(chip8.i, 50);
        run(&mut chip8, 1);
        assert_eq!(chip8.i, 0x50 + 100);
    }

    #[test]
    fn draws_with_collision() {
        // LD I, 0 (glyph 0); DRW V0, V0, 5 twice
        let mut chip8 = setup(&[0xA0, 0x00, 0xD0, 0x05, 0xD0, 0x05]);
        run(&mut chip8, 2);
        assert_eq!(chip8.v[0xF], 0);
        assert!(chip8.display.get(0, 0));
        assert!(chip8.draw);
        run(&mut chip8, 1);
        assert_eq!(chip8.v[0xF], 1);
        assert!(!chip8.display.get(0, 0));
    }

    #[test]
    fn big_sprites() {
        // HIGH; LD I, $50; DRW V0, V0, 0
        let mut chip8 = setup(&[0x00, 0xFF, 0xA0, 0x50, 0xD0, 0x00]);
        run(&mut chip8, 3);
        assert!(chip8.display.is_high_res());
        assert!(chip8.display.get(15, 0));
        assert!(!chip8.display.get(16, 0));
    }

    #[test]
    fn chip8_mode_rejects_extensions() {
        for rom in [[0x00, 0xFF], [0x00, 0xC1], [0xF0, 0x75], [0xF0, 0x30]] {
            let mut chip8 = setup(&rom);
            chip8.mode = Mode::Chip8;
            let err = chip8.step().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInstruction);
        }
    }

    #[test]
    fn exit_stops() {
        let mut chip8 = setup(&[0x00, 0xFD, 0x60, 0x01]);
        run(&mut chip8, 2);
        assert!(!chip8.running);
        assert_eq!(chip8.v[0], 0);
    }

    #[test]
    fn flag_registers() {
        let mut chip8 = setup(&[0xF2, 0x75, 0x60, 0x00, 0x61, 0x00, 0xF1, 0x85]);
        chip8.v[..3].copy_from_slice(&[4, 5, 6]);
        run(&mut chip8, 4);
        assert_eq!(&chip8.r[..3], &[4, 5, 6]);
        assert_eq!(&chip8.v[..3], &[4, 5, 6]);
    }

    #[test]
    fn waits_for_key() {
        let mut chip8 = setup(&[0xF3, 0x0A, 0x60, 0x01]);
        run(&mut chip8, 2);
        assert!(chip8.waiting_for_key);
        assert_eq!(chip8.pc, 0x202);
        chip8.press_key(DEBUG_ENTER_KEY);
        assert!(chip8.waiting_for_key);
        chip8.press_key(0xB);
        assert!(!chip8.waiting_for_key);
        assert_eq!(chip8.v[3], 0xB);
        run(&mut chip8, 1);
        assert_eq!(chip8.v[0], 1);
    }

    #[test]
    fn key_skips() {
        let mut chip8 = setup(&[0xE1, 0x9E, 0x00, 0x00, 0xE1, 0xA1]);
        chip8.v[1] = 4;
        chip8.press_key(4);
        run(&mut chip8, 1);
        assert_eq!(chip8.pc, 0x204);
        run(&mut chip8, 1);
        assert_eq!(chip8.pc, 0x206);
    }

    #[test]
    fn timers() {
        let mut chip8 = setup(&[0x60, 0x02, 0xF0, 0x15, 0xF0, 0x18]);
        run(&mut chip8, 3);
        chip8.tick_timers();
        assert_eq!((chip8.dt, chip8.st), (1, 1));
        chip8.tick_timers();
        chip8.tick_timers();
        assert_eq!((chip8.dt, chip8.st), (0, 0));
    }

    #[test]
    fn random_is_masked() {
        let mut chip8 = setup(&[0xC0, 0x0F, 0xC1, 0x00]);
        chip8.v[1] = 0xFF;
        run(&mut chip8, 2);
        assert!(chip8.v[0] <= 0x0F);
        assert_eq!(chip8.v[1], 0);
    }

    #[test]
    fn unknown_opcodes() {
        let mut chip8 = setup(&[0x51, 0x21]);
        let err = chip8.step().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInstruction);
        assert_eq!(err.message(), "Unknown opcode 5121 at $200");
    }

    #[test]
    fn modes_parse() {
        assert_eq!("XOCHIP".parse::<Mode>().unwrap(), Mode::XoChip);
        assert_eq!(Mode::from_id(Mode::Chip8.id()), Some(Mode::Chip8));
        assert!("nes".parse::<Mode>().is_err());
    }
}
