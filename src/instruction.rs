use crate::error::{self, C8Error};
use crate::format::{InstructionFormat, ENCODE_TABLE};
use crate::symbol::{Mnemonic, Symbol, SymbolKind};

/// Most operands any format takes.
pub const MAX_OPERANDS: usize = 3;

/// A mnemonic and the operands following it, before it is matched to a format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub line: usize,
    pub mnemonic: Mnemonic,
    pub operands: Vec<Symbol>,
}

impl Instruction {
    /// Collect the instruction starting at `symbols[0]`, which must be a mnemonic.
    ///
    /// Operands are taken while operand-shaped symbols continue on the same line.
    /// `text` is the line as written, used for diagnostics.
    pub fn gather(symbols: &[Symbol], text: &str) -> Result<Self, C8Error> {
        let Some((first, rest)) = symbols.split_first() else {
            return Err(C8Error::new(error::ErrorKind::Unknown, "No instruction to gather"));
        };
        let Some(mnemonic) = first.mnemonic() else {
            return Err(error::invalid_instruction(first.line, text, "Expected a mnemonic"));
        };

        let operands: Vec<Symbol> = rest
            .iter()
            .take_while(|symbol| symbol.line == first.line && symbol.kind.is_operand())
            .copied()
            .collect();
        if operands.len() > MAX_OPERANDS {
            return Err(error::invalid_instruction(first.line, text, "Too many operands"));
        }

        for operand in &operands {
            let limit = match operand.kind {
                SymbolKind::VRegister | SymbolKind::Int12 => 0x1000,
                SymbolKind::Int8 => 0x100,
                SymbolKind::Int4 => 0x10,
                _ => continue,
            };
            if operand.value >= limit {
                return Err(error::invalid_instruction(
                    first.line,
                    text,
                    "Integer argument too big",
                ));
            }
        }

        Ok(Instruction {
            line: first.line,
            mnemonic,
            operands,
        })
    }

    /// Symbols consumed by this instruction, including the mnemonic.
    pub fn len(&self) -> usize {
        self.operands.len() + 1
    }

    /// First format in `table` this instruction satisfies.
    ///
    /// An integer operand satisfies any integer slot whose width can hold its value.
    pub fn find_format<'a>(
        &self,
        table: &'a [InstructionFormat],
    ) -> Option<&'a InstructionFormat> {
        table.iter().find(|format| {
            format.mnemonic == self.mnemonic
                && format.operands.len() == self.operands.len()
                && format
                    .operands
                    .iter()
                    .zip(&self.operands)
                    .all(|(slot, operand)| operand_fits(slot.kind, operand))
        })
    }

    /// Match against the assembler's format table and pack into an opcode.
    pub fn encode(&self, text: &str) -> Result<u16, C8Error> {
        let format = self
            .find_format(ENCODE_TABLE)
            .ok_or_else(|| error::invalid_instruction(self.line, text, "Invalid instruction"))?;
        let values: Vec<u32> = self.operands.iter().map(|operand| operand.value).collect();
        Ok(format.pack(&values))
    }
}

fn operand_fits(slot: SymbolKind, operand: &Symbol) -> bool {
    if slot == operand.kind {
        return true;
    }
    match (slot.int_limit(), operand.kind.is_int()) {
        (Some(limit), true) => operand.value < limit,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolKind as K;

    fn mnemonic(mnemonic: Mnemonic, line: usize) -> Symbol {
        let index = Mnemonic::ALL.iter().position(|m| *m == mnemonic).unwrap();
        Symbol::new(K::Instruction, index as u32, line)
    }

    fn encode(symbols: &[Symbol]) -> Result<u16, C8Error> {
        Instruction::gather(symbols, "")?.encode("")
    }

    #[test]
    fn gathers_operands_on_line() {
        let symbols = [
            mnemonic(Mnemonic::Ld, 1),
            Symbol::new(K::VRegister, 3, 1),
            Symbol::new(K::Int8, 0x42, 1),
            mnemonic(Mnemonic::Cls, 2),
        ];
        let instruction = Instruction::gather(&symbols, "LD V3, $42").unwrap();
        assert_eq!(instruction.mnemonic, Mnemonic::Ld);
        assert_eq!(instruction.len(), 3);

        let symbols = [mnemonic(Mnemonic::Cls, 1), Symbol::new(K::Int4, 1, 2)];
        assert_eq!(Instruction::gather(&symbols, "CLS").unwrap().len(), 1);
    }

    #[test]
    fn encodes_simple_forms() {
        assert_eq!(encode(&[mnemonic(Mnemonic::Cls, 1)]), Ok(0x00E0));
        assert_eq!(encode(&[mnemonic(Mnemonic::Ret, 1)]), Ok(0x00EE));
        assert_eq!(
            encode(&[
                mnemonic(Mnemonic::Drw, 1),
                Symbol::new(K::VRegister, 1, 1),
                Symbol::new(K::VRegister, 2, 1),
                Symbol::new(K::Int4, 5, 1),
            ]),
            Ok(0xD125)
        );
        assert_eq!(
            encode(&[
                mnemonic(Mnemonic::Ld, 1),
                Symbol::new(K::BcdDigits, 0, 1),
                Symbol::new(K::VRegister, 0xA, 1),
            ]),
            Ok(0xFA33)
        );
    }

    #[test]
    fn widens_integers() {
        // 4-bit value in a 12-bit slot
        assert_eq!(
            encode(&[mnemonic(Mnemonic::Jp, 1), Symbol::new(K::Int4, 5, 1)]),
            Ok(0x1005)
        );
        // 12-bit class value fitting in 8 bits
        assert_eq!(
            encode(&[
                mnemonic(Mnemonic::Ld, 1),
                Symbol::new(K::VRegister, 0, 1),
                Symbol::new(K::Int12, 0x20, 1),
            ]),
            Ok(0x6020)
        );
        // Too wide for the slot
        let err = encode(&[
            mnemonic(Mnemonic::Ld, 1),
            Symbol::new(K::VRegister, 0, 1),
            Symbol::new(K::Int12, 0x200, 1),
        ])
        .unwrap_err();
        assert_eq!(err.kind(), error::ErrorKind::InvalidInstruction);
    }

    #[test]
    fn shift_forms() {
        let vx = Symbol::new(K::VRegister, 4, 1);
        let vy = Symbol::new(K::VRegister, 7, 1);
        assert_eq!(encode(&[mnemonic(Mnemonic::Shr, 1), vx, vy]), Ok(0x8476));
        assert_eq!(encode(&[mnemonic(Mnemonic::Shr, 1), vx]), Ok(0x8406));
        assert_eq!(encode(&[mnemonic(Mnemonic::Shl, 1), vx, vy]), Ok(0x847E));
        assert_eq!(encode(&[mnemonic(Mnemonic::Shl, 1), vx]), Ok(0x840E));
    }

    #[test]
    fn jump_with_register() {
        assert_eq!(
            encode(&[
                mnemonic(Mnemonic::Jp, 1),
                Symbol::new(K::VRegister, 0, 1),
                Symbol::new(K::Int12, 0x300, 1),
            ]),
            Ok(0xB300)
        );
    }

    #[test]
    fn rejects_bad_operands() {
        let err = encode(&[mnemonic(Mnemonic::Cls, 1), Symbol::new(K::VRegister, 1, 1)])
            .unwrap_err();
        assert_eq!(err.kind(), error::ErrorKind::InvalidInstruction);

        let err = Instruction::gather(
            &[mnemonic(Mnemonic::Jp, 1), Symbol::new(K::Int12, 0x1000, 1)],
            "",
        )
        .unwrap_err();
        assert!(err.message().contains("Integer argument too big"));

        let operands = [Symbol::new(K::VRegister, 1, 1); 4];
        let mut symbols = vec![mnemonic(Mnemonic::Drw, 1)];
        symbols.extend(operands);
        assert!(Instruction::gather(&symbols, "").is_err());
    }
}
