//! Instruction formats: the legal operand shapes of every mnemonic and their bit encoding.
//!
//! Encoding and decoding use separate tables. Both are searched in order and the first match
//! wins, so order matters wherever two entries overlap.

use crate::symbol::{Mnemonic, SymbolKind};

/// An operand slot and the bits of the opcode it occupies.
///
/// A mask of `0` means the operand must be present, but contributes no bits.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Operand {
    pub kind: SymbolKind,
    pub mask: u16,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct InstructionFormat {
    pub mnemonic: Mnemonic,
    pub base: u16,
    pub operands: &'static [Operand],
    /// Bits which no operand covers, but which may hold anything.
    pub ignored: u16,
}

impl InstructionFormat {
    /// Bits which are fixed for every opcode of this format.
    pub fn fixed_bits(&self) -> u16 {
        !self
            .operands
            .iter()
            .fold(self.ignored, |bits, operand| bits | operand.mask)
    }

    /// Whether `opcode` is an encoding of this format.
    pub fn matches_opcode(&self, opcode: u16) -> bool {
        opcode & self.fixed_bits() == self.base
    }

    /// Pack operand values into the base opcode.
    pub fn pack(&self, values: &[u32]) -> u16 {
        self.operands
            .iter()
            .zip(values)
            .filter(|(operand, _)| operand.mask != 0)
            .fold(self.base, |opcode, (operand, value)| {
                opcode | (((*value as u16) << shift(operand.mask)) & operand.mask)
            })
    }

    /// Extract operand values from an opcode of this format.
    pub fn unpack(&self, opcode: u16) -> [u16; 3] {
        let mut values = [0; 3];
        for (value, operand) in values.iter_mut().zip(self.operands) {
            *value = (opcode & operand.mask) >> shift(operand.mask);
        }
        values
    }
}

/// Amount a value must be shifted left to fill `mask`.
pub fn shift(mask: u16) -> u32 {
    match mask {
        0xF000 => 12,
        0x0F00 => 8,
        0x00F0 => 4,
        0x000F | 0x00FF | 0x0FFF => 0,
        _ => mask.trailing_zeros(),
    }
}

const fn op(kind: SymbolKind, mask: u16) -> Operand {
    Operand { kind, mask }
}

const fn format(mnemonic: Mnemonic, base: u16, operands: &'static [Operand]) -> InstructionFormat {
    InstructionFormat {
        mnemonic,
        base,
        operands,
        ignored: 0,
    }
}

const fn lossy(
    mnemonic: Mnemonic,
    base: u16,
    operands: &'static [Operand],
    ignored: u16,
) -> InstructionFormat {
    InstructionFormat {
        mnemonic,
        base,
        operands,
        ignored,
    }
}

use Mnemonic as M;
use SymbolKind as K;

const VX: Operand = op(K::VRegister, 0x0F00);
const VY: Operand = op(K::VRegister, 0x00F0);
const KK: Operand = op(K::Int8, 0x00FF);
const NNN: Operand = op(K::Int12, 0x0FFF);
const N: Operand = op(K::Int4, 0x000F);

/// Formats searched by the assembler.
///
/// The two-operand `SHR`/`SHL` forms precede their one-operand fallbacks, and `JP Vx, nnn`
/// is accepted for `Bnnn` regardless of the register given.
pub const ENCODE_TABLE: &[InstructionFormat] = &[
    format(M::Scd, 0x00C0, &[N]),
    format(M::Cls, 0x00E0, &[]),
    format(M::Ret, 0x00EE, &[]),
    format(M::Scr, 0x00FB, &[]),
    format(M::Scl, 0x00FC, &[]),
    format(M::Exit, 0x00FD, &[]),
    format(M::Low, 0x00FE, &[]),
    format(M::High, 0x00FF, &[]),
    format(M::Jp, 0x1000, &[NNN]),
    format(M::Call, 0x2000, &[NNN]),
    format(M::Se, 0x3000, &[VX, KK]),
    format(M::Sne, 0x4000, &[VX, KK]),
    format(M::Se, 0x5000, &[VX, VY]),
    format(M::Ld, 0x6000, &[VX, KK]),
    format(M::Add, 0x7000, &[VX, KK]),
    format(M::Ld, 0x8000, &[VX, VY]),
    format(M::Or, 0x8001, &[VX, VY]),
    format(M::And, 0x8002, &[VX, VY]),
    format(M::Xor, 0x8003, &[VX, VY]),
    format(M::Add, 0x8004, &[VX, VY]),
    format(M::Sub, 0x8005, &[VX, VY]),
    format(M::Shr, 0x8006, &[VX, VY]),
    format(M::Shr, 0x8006, &[VX]),
    format(M::Subn, 0x8007, &[VX, VY]),
    format(M::Shl, 0x800E, &[VX, VY]),
    format(M::Shl, 0x800E, &[VX]),
    format(M::Sne, 0x9000, &[VX, VY]),
    format(M::Ld, 0xA000, &[op(K::AddressRegister, 0), NNN]),
    format(M::Jp, 0xB000, &[op(K::VRegister, 0), NNN]),
    format(M::Rnd, 0xC000, &[VX, KK]),
    format(M::Drw, 0xD000, &[VX, VY, N]),
    format(M::Skp, 0xE09E, &[VX]),
    format(M::Sknp, 0xE0A1, &[VX]),
    format(M::Ld, 0xF007, &[VX, op(K::DelayTimer, 0)]),
    format(M::Ld, 0xF00A, &[VX, op(K::KeyWait, 0)]),
    format(M::Ld, 0xF015, &[op(K::DelayTimer, 0), VX]),
    format(M::Ld, 0xF018, &[op(K::SoundTimer, 0), VX]),
    format(M::Add, 0xF01E, &[op(K::AddressRegister, 0), VX]),
    format(M::Ld, 0xF029, &[op(K::FontSprite, 0), VX]),
    format(M::Ld, 0xF030, &[op(K::HighResFontSprite, 0), VX]),
    format(M::Ld, 0xF033, &[op(K::BcdDigits, 0), VX]),
    format(M::Ld, 0xF055, &[op(K::MemoryIndirect, 0), VX]),
    format(M::Ld, 0xF065, &[VX, op(K::MemoryIndirect, 0)]),
    format(M::Ld, 0xF075, &[op(K::FlagRegister, 0), VX]),
    format(M::Ld, 0xF085, &[VX, op(K::FlagRegister, 0)]),
];

/// Formats searched by the disassembler.
///
/// `8xy6`/`8xyE` always decode to the one-operand `SHR Vx`/`SHL Vx`, dropping `y`.
/// `Bnnn` decodes as `JP V0, nnn`.
pub const DECODE_TABLE: &[InstructionFormat] = &[
    format(M::Scd, 0x00C0, &[N]),
    format(M::Cls, 0x00E0, &[]),
    format(M::Ret, 0x00EE, &[]),
    format(M::Scr, 0x00FB, &[]),
    format(M::Scl, 0x00FC, &[]),
    format(M::Exit, 0x00FD, &[]),
    format(M::Low, 0x00FE, &[]),
    format(M::High, 0x00FF, &[]),
    format(M::Jp, 0x1000, &[NNN]),
    format(M::Call, 0x2000, &[NNN]),
    format(M::Se, 0x3000, &[VX, KK]),
    format(M::Sne, 0x4000, &[VX, KK]),
    format(M::Se, 0x5000, &[VX, VY]),
    format(M::Ld, 0x6000, &[VX, KK]),
    format(M::Add, 0x7000, &[VX, KK]),
    format(M::Ld, 0x8000, &[VX, VY]),
    format(M::Or, 0x8001, &[VX, VY]),
    format(M::And, 0x8002, &[VX, VY]),
    format(M::Xor, 0x8003, &[VX, VY]),
    format(M::Add, 0x8004, &[VX, VY]),
    format(M::Sub, 0x8005, &[VX, VY]),
    lossy(M::Shr, 0x8006, &[VX], 0x00F0),
    format(M::Subn, 0x8007, &[VX, VY]),
    lossy(M::Shl, 0x800E, &[VX], 0x00F0),
    format(M::Sne, 0x9000, &[VX, VY]),
    format(M::Ld, 0xA000, &[op(K::AddressRegister, 0), NNN]),
    format(M::Jp, 0xB000, &[op(K::VRegister, 0), NNN]),
    format(M::Rnd, 0xC000, &[VX, KK]),
    format(M::Drw, 0xD000, &[VX, VY, N]),
    format(M::Skp, 0xE09E, &[VX]),
    format(M::Sknp, 0xE0A1, &[VX]),
    format(M::Ld, 0xF007, &[VX, op(K::DelayTimer, 0)]),
    format(M::Ld, 0xF00A, &[VX, op(K::KeyWait, 0)]),
    format(M::Ld, 0xF015, &[op(K::DelayTimer, 0), VX]),
    format(M::Ld, 0xF018, &[op(K::SoundTimer, 0), VX]),
    format(M::Add, 0xF01E, &[op(K::AddressRegister, 0), VX]),
    format(M::Ld, 0xF029, &[op(K::FontSprite, 0), VX]),
    format(M::Ld, 0xF030, &[op(K::HighResFontSprite, 0), VX]),
    format(M::Ld, 0xF033, &[op(K::BcdDigits, 0), VX]),
    format(M::Ld, 0xF055, &[op(K::MemoryIndirect, 0), VX]),
    format(M::Ld, 0xF065, &[VX, op(K::MemoryIndirect, 0)]),
    format(M::Ld, 0xF075, &[op(K::FlagRegister, 0), VX]),
    format(M::Ld, 0xF085, &[VX, op(K::FlagRegister, 0)]),
];

/// First decode format matching `opcode`.
pub fn decode_format(opcode: u16) -> Option<&'static InstructionFormat> {
    DECODE_TABLE
        .iter()
        .find(|format| format.matches_opcode(opcode))
}
