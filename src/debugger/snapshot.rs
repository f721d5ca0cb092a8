//! Binary machine state files.
//!
//! Fields are written in a fixed order, big-endian, after a magic header. Bit arrays (display
//! pixels, breakpoints) are packed most significant bit first.

use super::breakpoint::Breakpoints;
use super::command::CommandError;
use crate::display::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::font::{BigFont, Fonts, SmallFont};
use crate::quirks::Quirks;
use crate::runtime::{Chip8, Mode, KEY_COUNT, STACK_SIZE};
use crate::MEMORY_SIZE;

const MAGIC: &[u8; 6] = b"C8SNAP";
const VERSION: u8 = 1;

/// Length of a flag register file.
pub const FLAGS_LEN: usize = 8;

const PIXEL_COUNT: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT;

/// Length of every state file.
pub const SNAPSHOT_LEN: usize = MAGIC.len()
    + 1 // version
    + MEMORY_SIZE
    + 8 // R
    + 16 // V
    + 3 // SP, DT, ST
    + STACK_SIZE * 2
    + 2 // PC
    + 2 // I
    + KEY_COUNT
    + 1 // VK
    + 4 // clock speed
    + 2 // waiting for key, running
    + 1 + PIXEL_COUNT / 8 // resolution, pixels
    + 1 // quirks
    + 2 // debug, verbose
    + MEMORY_SIZE / 8 // breakpoints
    + 8 // palette
    + 2 // fonts
    + 1 // draw
    + 1; // mode

fn pack(bits: &[bool], out: &mut Vec<u8>) {
    for chunk in bits.chunks(8) {
        let byte = chunk
            .iter()
            .enumerate()
            .fold(0u8, |byte, (i, bit)| byte | ((*bit as u8) << (7 - i)));
        out.push(byte);
    }
}

fn unpack(bytes: &[u8]) -> Vec<bool> {
    bytes
        .iter()
        .flat_map(|byte| (0..8).map(move |i| byte & (0x80 >> i) != 0))
        .collect()
}

/// Serialize the whole machine.
pub fn save(chip8: &Chip8) -> Vec<u8> {
    let mut out = Vec::with_capacity(SNAPSHOT_LEN);
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.extend_from_slice(chip8.mem.as_slice());
    out.extend_from_slice(&chip8.r);
    out.extend_from_slice(&chip8.v);
    out.extend_from_slice(&[chip8.sp, chip8.dt, chip8.st]);
    for entry in chip8.stack {
        out.extend_from_slice(&entry.to_be_bytes());
    }
    out.extend_from_slice(&chip8.pc.to_be_bytes());
    out.extend_from_slice(&chip8.i.to_be_bytes());
    out.extend(chip8.keys.iter().map(|key| *key as u8));
    out.push(chip8.vk);
    out.extend_from_slice(&chip8.clock_speed.to_be_bytes());
    out.extend_from_slice(&[chip8.waiting_for_key as u8, chip8.running as u8]);
    out.push(chip8.display.is_high_res() as u8);
    pack(chip8.display.pixels(), &mut out);
    out.push(chip8.quirks.bits());
    out.extend_from_slice(&[chip8.debug as u8, chip8.verbose as u8]);
    pack(chip8.breakpoints.as_slice(), &mut out);
    out.extend_from_slice(&chip8.palette.background.to_be_bytes());
    out.extend_from_slice(&chip8.palette.foreground.to_be_bytes());
    out.extend_from_slice(&[chip8.fonts.small.id(), chip8.fonts.big.id()]);
    out.push(chip8.draw as u8);
    out.push(chip8.mode.id());
    out
}

struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], CommandError> {
        if self.bytes.len() < len {
            return Err(CommandError::InvalidFile);
        }
        let (taken, rest) = self.bytes.split_at(len);
        self.bytes = rest;
        Ok(taken)
    }

    fn u8(&mut self) -> Result<u8, CommandError> {
        Ok(self.take(1)?[0])
    }

    fn bool(&mut self) -> Result<bool, CommandError> {
        Ok(self.u8()? != 0)
    }

    fn u16(&mut self) -> Result<u16, CommandError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self) -> Result<u32, CommandError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// Replace the machine with a state produced by [`save`].
///
/// `chip8` is left untouched if `bytes` is not a valid state.
pub fn load(chip8: &mut Chip8, bytes: &[u8]) -> Result<(), CommandError> {
    if bytes.len() != SNAPSHOT_LEN {
        return Err(CommandError::InvalidFile);
    }
    let mut reader = Reader { bytes };
    if reader.take(MAGIC.len())? != MAGIC || reader.u8()? != VERSION {
        return Err(CommandError::InvalidFile);
    }

    let mem = reader.take(MEMORY_SIZE)?;
    let r = reader.take(8)?;
    let v = reader.take(16)?;
    let (sp, dt, st) = (reader.u8()?, reader.u8()?, reader.u8()?);
    let mut stack = [0; STACK_SIZE];
    for entry in &mut stack {
        *entry = reader.u16()?;
    }
    let (pc, i) = (reader.u16()?, reader.u16()?);
    let mut keys = [false; KEY_COUNT];
    for key in &mut keys {
        *key = reader.bool()?;
    }
    let vk = reader.u8()?;
    let clock_speed = reader.u32()?;
    let (waiting_for_key, running) = (reader.bool()?, reader.bool()?);
    let high_res = reader.bool()?;
    let pixels = unpack(reader.take(PIXEL_COUNT / 8)?);
    let quirks = Quirks::from_bits(reader.u8()?);
    let (debug, verbose) = (reader.bool()?, reader.bool()?);
    let breakpoints = Breakpoints::from_slice(&unpack(reader.take(MEMORY_SIZE / 8)?))
        .ok_or(CommandError::InvalidFile)?;
    let (background, foreground) = (reader.u32()?, reader.u32()?);
    let small = SmallFont::from_id(reader.u8()?).ok_or(CommandError::InvalidFile)?;
    let big = BigFont::from_id(reader.u8()?).ok_or(CommandError::InvalidFile)?;
    let _draw = reader.bool()?;
    let mode = Mode::from_id(reader.u8()?).ok_or(CommandError::InvalidFile)?;

    if sp as usize > STACK_SIZE || vk > 0xF {
        return Err(CommandError::InvalidFile);
    }
    if !chip8.display.restore(high_res, &pixels) {
        return Err(CommandError::InvalidFile);
    }
    chip8.mem.copy_from_slice(mem);
    chip8.r.copy_from_slice(r);
    chip8.v.copy_from_slice(v);
    chip8.sp = sp;
    chip8.dt = dt;
    chip8.st = st;
    chip8.stack = stack;
    chip8.pc = pc;
    chip8.i = i;
    chip8.keys = keys;
    chip8.vk = vk;
    chip8.clock_speed = clock_speed;
    chip8.waiting_for_key = waiting_for_key;
    chip8.running = running;
    chip8.quirks = quirks;
    chip8.debug = debug;
    chip8.verbose = verbose;
    chip8.breakpoints = breakpoints;
    chip8.palette.background = background;
    chip8.palette.foreground = foreground;
    chip8.fonts = Fonts { small, big };
    chip8.mode = mode;
    chip8.draw = true;
    Ok(())
}

pub fn save_flags(chip8: &Chip8) -> [u8; FLAGS_LEN] {
    chip8.r
}

pub fn load_flags(chip8: &mut Chip8, bytes: &[u8]) -> Result<(), CommandError> {
    let flags: [u8; FLAGS_LEN] = bytes.try_into().map_err(|_| CommandError::InvalidFile)?;
    chip8.r = flags;
    Ok(())
}
