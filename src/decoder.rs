use std::fmt::Write;

use crate::format::{decode_format, InstructionFormat};
use crate::symbol::{Mnemonic, SymbolKind};
use crate::{MEMORY_SIZE, PROGRAM_START};

/// Per-address label numbers. `0` marks an address without a label.
#[derive(Clone, Debug)]
pub struct LabelMap(Box<[u16; MEMORY_SIZE]>);

impl LabelMap {
    pub fn new() -> Self {
        Self(Box::new([0; MEMORY_SIZE]))
    }

    pub fn set(&mut self, address: u16, label: u16) {
        if let Some(slot) = self.0.get_mut(address as usize) {
            *slot = label;
        }
    }

    pub fn get(&self, address: u16) -> Option<u16> {
        self.0
            .get(address as usize)
            .copied()
            .filter(|label| *label != 0)
    }
}

impl Default for LabelMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for [`decode_program`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DecodeOptions {
    /// Name every jump, call and `LD I` target inside the program.
    pub define_labels: bool,
    /// Prefix every line with its address.
    pub print_addresses: bool,
}

/// Name used for label number `label`.
pub fn label_name(label: u16) -> String {
    format!("label{label}")
}

/// Disassemble a single opcode, or `None` if it encodes no known instruction.
///
/// Address operands with an entry in `labels` are printed as that label.
pub fn decode_instruction(opcode: u16, labels: Option<&LabelMap>) -> Option<String> {
    let format = decode_format(opcode)?;
    Some(render(format, opcode, labels))
}

fn render(format: &InstructionFormat, opcode: u16, labels: Option<&LabelMap>) -> String {
    let values = format.unpack(opcode);
    let operands: Vec<String> = format
        .operands
        .iter()
        .zip(values)
        .map(|(operand, value)| match operand.kind {
            SymbolKind::VRegister => format!("V{value:01X}"),
            SymbolKind::Int4 => format!("0x{value:01X}"),
            SymbolKind::Int8 => format!("0x{value:02X}"),
            SymbolKind::Int12 => match labels.and_then(|labels| labels.get(value)) {
                Some(label) => label_name(label),
                None => format!("${value:03X}"),
            },
            kind => kind.reserved_name().unwrap_or("?").to_string(),
        })
        .collect();

    if operands.is_empty() {
        format.mnemonic.to_string()
    } else {
        format!("{} {}", format.mnemonic, operands.join(", "))
    }
}

/// Address targeted by a jump, call or `LD I`.
fn target(opcode: u16) -> Option<u16> {
    let format = decode_format(opcode)?;
    let is_target = matches!(format.mnemonic, Mnemonic::Jp | Mnemonic::Call)
        || format.base == 0xA000;
    is_target.then_some(opcode & 0x0FFF)
}

/// Number every targeted address which starts a decoded line of `rom`, in address order.
pub fn find_labels(rom: &[u8]) -> LabelMap {
    let end = PROGRAM_START as usize + rom.len();
    let mut targets = vec![false; MEMORY_SIZE];
    for word in rom.chunks_exact(2) {
        let Some(address) = target(u16::from_be_bytes([word[0], word[1]])) else {
            continue;
        };
        let address = address as usize;
        if (PROGRAM_START as usize..end).contains(&address)
            && (address - PROGRAM_START as usize) % 2 == 0
        {
            targets[address] = true;
        }
    }

    let mut labels = LabelMap::new();
    let mut next = 1;
    for (address, _) in targets.iter().enumerate().filter(|(_, marked)| **marked) {
        labels.set(address as u16, next);
        next += 1;
    }
    labels
}

/// Disassemble a program image loaded at [`PROGRAM_START`].
///
/// Words which are not instructions are written as `.DW`, and a trailing odd byte as `.DB`,
/// so the output assembles back to the same image.
pub fn decode_program(rom: &[u8], options: DecodeOptions) -> String {
    let labels = options.define_labels.then(|| find_labels(rom));
    let mut out = String::new();

    for (i, chunk) in rom.chunks(2).enumerate() {
        let address = PROGRAM_START as usize + i * 2;
        let label = labels
            .as_ref()
            .zip(u16::try_from(address).ok())
            .and_then(|(labels, address)| labels.get(address));
        if let Some(label) = label {
            let _ = writeln!(out, "{}:", label_name(label));
        }
        if options.print_addresses {
            let _ = write!(out, "${address:03X}  ");
        }
        let text = match chunk {
            [high, low] => {
                let opcode = u16::from_be_bytes([*high, *low]);
                decode_instruction(opcode, labels.as_ref())
                    .unwrap_or_else(|| format!(".DW ${opcode:04X}"))
            }
            [byte] => format!(".DB ${byte:02X}"),
            _ => unreachable!("chunks of 2 are never empty"),
        };
        let _ = writeln!(out, "{text}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble;

    fn decode(opcode: u16) -> String {
        decode_instruction(opcode, None).unwrap()
    }

    #[test]
    fn no_operands() {
        assert_eq!(decode(0x00E0), "CLS");
        assert_eq!(decode(0x00EE), "RET");
        assert_eq!(decode(0x00FB), "SCR");
        assert_eq!(decode(0x00FC), "SCL");
        assert_eq!(decode(0x00FD), "EXIT");
        assert_eq!(decode(0x00FE), "LOW");
        assert_eq!(decode(0x00FF), "HIGH");
        assert_eq!(decode(0x00CA), "SCD 0xA");
    }

    #[test]
    fn addresses() {
        assert_eq!(decode(0x1ABC), "JP $ABC");
        assert_eq!(decode(0x2ABC), "CALL $ABC");
        assert_eq!(decode(0xA00F), "LD I, $00F");
        assert_eq!(decode(0xB123), "JP V0, $123");
    }

    #[test]
    fn addresses_with_labels() {
        let mut labels = LabelMap::new();
        labels.set(0xABC, 1);
        assert_eq!(decode_instruction(0x1ABC, Some(&labels)).unwrap(), "JP label1");
        assert_eq!(decode_instruction(0x2ABC, Some(&labels)).unwrap(), "CALL label1");
        assert_eq!(decode_instruction(0xAABC, Some(&labels)).unwrap(), "LD I, label1");
        assert_eq!(decode_instruction(0xBABC, Some(&labels)).unwrap(), "JP V0, label1");
        assert_eq!(decode_instruction(0x1ABD, Some(&labels)).unwrap(), "JP $ABD");
    }

    #[test]
    fn registers_and_immediates() {
        assert_eq!(decode(0x3A0F), "SE VA, 0x0F");
        assert_eq!(decode(0x4A0F), "SNE VA, 0x0F");
        assert_eq!(decode(0x5AB0), "SE VA, VB");
        assert_eq!(decode(0x6AFF), "LD VA, 0xFF");
        assert_eq!(decode(0x7A01), "ADD VA, 0x01");
        assert_eq!(decode(0x8AB0), "LD VA, VB");
        assert_eq!(decode(0x8AB1), "OR VA, VB");
        assert_eq!(decode(0x8AB2), "AND VA, VB");
        assert_eq!(decode(0x8AB3), "XOR VA, VB");
        assert_eq!(decode(0x8AB4), "ADD VA, VB");
        assert_eq!(decode(0x8AB5), "SUB VA, VB");
        assert_eq!(decode(0x8AB7), "SUBN VA, VB");
        assert_eq!(decode(0x9AB0), "SNE VA, VB");
        assert_eq!(decode(0xC312), "RND V3, 0x12");
        assert_eq!(decode(0xD12F), "DRW V1, V2, 0xF");
        assert_eq!(decode(0xE59E), "SKP V5");
        assert_eq!(decode(0xE5A1), "SKNP V5");
    }

    #[test]
    fn shifts_collapse_to_one_operand() {
        assert_eq!(decode(0x8AB6), "SHR VA");
        assert_eq!(decode(0x8A06), "SHR VA");
        assert_eq!(decode(0x8ABE), "SHL VA");
    }

    #[test]
    fn register_class_operands() {
        assert_eq!(decode(0xF207), "LD V2, DT");
        assert_eq!(decode(0xF20A), "LD V2, K");
        assert_eq!(decode(0xF215), "LD DT, V2");
        assert_eq!(decode(0xF218), "LD ST, V2");
        assert_eq!(decode(0xF21E), "ADD I, V2");
        assert_eq!(decode(0xF229), "LD F, V2");
        assert_eq!(decode(0xF230), "LD HF, V2");
        assert_eq!(decode(0xF233), "LD B, V2");
        assert_eq!(decode(0xF255), "LD [I], V2");
        assert_eq!(decode(0xF265), "LD V2, [I]");
        assert_eq!(decode(0xF275), "LD R, V2");
        assert_eq!(decode(0xF285), "LD V2, R");
    }

    #[test]
    fn unknown_opcodes() {
        assert_eq!(decode_instruction(0x0123, None), None);
        assert_eq!(decode_instruction(0x5AB1, None), None);
        assert_eq!(decode_instruction(0xF0FF, None), None);
    }

    #[test]
    fn decoded_text_reassembles() {
        for opcode in 0..=u16::MAX {
            if opcode & 0xF00F == 0x8006 || opcode & 0xF00F == 0x800E {
                continue; // Two-operand shifts decode as one-operand
            }
            let Some(text) = decode_instruction(opcode, None) else {
                continue;
            };
            let bytes = assemble(&text).unwrap_or_else(|err| panic!("{text}: {err}"));
            assert_eq!(bytes, opcode.to_be_bytes(), "{text}");
        }
    }

    #[test]
    fn program_with_labels() {
        let rom = [0x00, 0xE0, 0x22, 0x06, 0x12, 0x02, 0x00, 0xEE, 0xFF];
        let text = decode_program(
            &rom,
            DecodeOptions {
                define_labels: true,
                print_addresses: false,
            },
        );
        assert_eq!(
            text,
            "CLS\nlabel1:\nCALL label2\nJP label1\nlabel2:\nRET\n.DB $FF\n"
        );
        assert_eq!(assemble(&text).unwrap(), rom);
    }

    #[test]
    fn program_with_addresses() {
        let rom = [0x00, 0xE0, 0x01, 0x23];
        let text = decode_program(
            &rom,
            DecodeOptions {
                define_labels: false,
                print_addresses: true,
            },
        );
        assert_eq!(text, "$200  CLS\n$202  .DW $0123\n");
    }

    #[test]
    fn images_past_memory_keep_counting() {
        let rom = vec![0; 70_000];
        let text = decode_program(
            &rom,
            DecodeOptions {
                define_labels: true,
                print_addresses: true,
            },
        );
        assert_eq!(text.lines().count(), 35_000);
        assert!(text.lines().last().unwrap().starts_with("$1136E  "));
    }
}
