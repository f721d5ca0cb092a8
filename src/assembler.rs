use crate::error::{self, C8Error, ErrorKind};
use crate::instruction::Instruction;
use crate::lexer;
use crate::symbol::{LabelError, LabelList, Mnemonic, Symbol, SymbolKind, SymbolList};
use crate::{MEMORY_SIZE, PROGRAM_START};

/// Bytes available to a program.
pub const PROGRAM_CAPACITY: usize = MEMORY_SIZE - PROGRAM_START as usize;

/// Assemble source text into a program image loaded at [`PROGRAM_START`].
pub fn assemble(src: &str) -> Result<Vec<u8>, C8Error> {
    AssemblySession::new(src).assemble()
}

/// State of a single assembly job, threaded through every pass.
#[derive(Debug)]
pub struct AssemblySession {
    /// Trimmed, comment-free lines. Empty lines are skipped by every pass.
    lines: Vec<String>,
    /// Lines as written.
    raw: Vec<String>,
    labels: LabelList,
    symbols: SymbolList,
    /// Names referenced without a definition, reported once labels are substituted.
    undefined: Vec<String>,
}

impl AssemblySession {
    pub fn new(src: &str) -> Self {
        let raw = lexer::split_lines(src);
        let lines = raw
            .iter()
            .map(|line| lexer::strip_comment(lexer::trim(line)).to_string())
            .collect();
        AssemblySession {
            lines,
            raw,
            labels: LabelList::new(),
            symbols: SymbolList::new(),
            undefined: Vec::new(),
        }
    }

    pub fn assemble(mut self) -> Result<Vec<u8>, C8Error> {
        if self.lines.iter().all(String::is_empty) {
            return Ok(Vec::new());
        }
        self.populate_labels()?;
        self.parse_lines()?;
        self.resolve_labels()?;
        self.substitute_labels()?;
        self.emit()
    }

    pub fn labels(&self) -> &LabelList {
        &self.labels
    }

    pub fn symbols(&self) -> &SymbolList {
        &self.symbols
    }

    /// Text of 1-based `line` as written.
    fn raw_line(&self, line: usize) -> &str {
        line.checked_sub(1)
            .and_then(|index| self.raw.get(index))
            .map_or("", String::as_str)
    }

    /// Register every label defined at the start of a line.
    pub fn populate_labels(&mut self) -> Result<(), C8Error> {
        for (index, line) in self.lines.iter().enumerate() {
            let number = index + 1;
            let Some(word) = lexer::split_words(line).first().copied() else {
                continue;
            };
            if !lexer::is_label_definition(word) {
                continue;
            }
            let raw = &self.raw[index];
            match self.labels.insert(&word[..word.len() - 1]) {
                Ok(_) => {}
                Err(LabelError::Duplicate) => return Err(error::duplicate_label(number, raw)),
                Err(LabelError::Full) => {
                    return Err(error::too_many_labels(
                        number,
                        raw,
                        crate::symbol::MAX_LABELS,
                    ))
                }
                Err(LabelError::TooLong) => return Err(error::invalid_symbol(number, raw, word)),
            }
        }
        Ok(())
    }

    /// Convert every non-empty line into symbols.
    pub fn parse_lines(&mut self) -> Result<(), C8Error> {
        for index in 0..self.lines.len() {
            if self.lines[index].is_empty() {
                continue;
            }
            self.parse_line(index + 1)?;
        }
        Ok(())
    }

    fn parse_line(&mut self, number: usize) -> Result<(), C8Error> {
        let line = self.lines[number - 1].clone();
        let words = lexer::split_words(&line);

        if words.len() > 1 && words[0].eq_ignore_ascii_case(".DS") {
            self.parse_string(number, &words[1..]);
            return Ok(());
        }

        let mut i = 0;
        while i < words.len() {
            let next = words.get(i + 1).copied();
            let (symbol, consumed) = self.parse_word(number, words[i], next)?;
            self.symbols.push(symbol);
            i += consumed;
        }
        Ok(())
    }

    /// Emit one byte per character of a `.DS` string, with a space between words.
    ///
    /// The first character (the opening quote) is skipped. Any later `"` ends the string.
    fn parse_string(&mut self, number: usize, words: &[&str]) {
        for (i, word) in words.iter().enumerate() {
            if i > 0 {
                self.symbols
                    .push(Symbol::new(SymbolKind::DefineByte, ' ' as u32, number));
            }
            let skip = if i == 0 { 1 } else { 0 };
            for ch in word.chars().skip(skip) {
                if ch == '"' {
                    return;
                }
                self.symbols
                    .push(Symbol::new(SymbolKind::DefineByte, ch as u32, number));
            }
        }
    }

    /// Classify a single word. Returns the symbol and how many words it consumed.
    fn parse_word(
        &mut self,
        number: usize,
        word: &str,
        next: Option<&str>,
    ) -> Result<(Symbol, usize), C8Error> {
        let raw = self.raw_line(number);
        let word = word.strip_suffix(',').unwrap_or(word).trim().to_uppercase();
        let symbol = |kind, value| Symbol::new(kind, value, number);

        if lexer::is_label_definition(&word) {
            let index = self
                .labels
                .find(&word[..word.len() - 1])
                .ok_or_else(|| error::invalid_symbol(number, raw, &word))?;
            return Ok((symbol(SymbolKind::LabelDefinition, index as u32), 1));
        }

        if let Some(index) = Mnemonic::ALL.iter().position(|m| m.name() == word) {
            return Ok((symbol(SymbolKind::Instruction, index as u32), 1));
        }

        if word == ".DB" || word == ".DW" {
            let kind = if word == ".DB" {
                SymbolKind::DefineByte
            } else {
                SymbolKind::DefineWord
            };
            let Some(next) = next else {
                return Err(error::invalid_argument(
                    number,
                    raw,
                    &format!("Missing value for '{word}'"),
                ));
            };
            let value = lexer::parse_int(next.strip_suffix(',').unwrap_or(next)).ok_or_else(
                || error::invalid_argument(number, raw, &format!("Invalid value '{next}'")),
            )?;
            return Ok((symbol(kind, value), 2));
        }

        if let Some(register) = parse_register(&word) {
            return Ok((symbol(SymbolKind::VRegister, register as u32), 1));
        }

        if let Some(kind) = SymbolKind::reserved(&word) {
            if matches!(
                kind,
                SymbolKind::DefineByte | SymbolKind::DefineWord | SymbolKind::DefineString
            ) {
                return Err(error::invalid_argument(
                    number,
                    raw,
                    &format!("Missing value for '{word}'"),
                ));
            }
            return Ok((symbol(kind, 0), 1));
        }

        if let Some(value) = lexer::parse_int(&word) {
            return Ok((symbol(SymbolKind::int_for(value), value), 1));
        }

        if let Some(index) = self.labels.find(&word) {
            return Ok((symbol(SymbolKind::LabelReference, index as u32), 1));
        }

        // Indices past the defined labels name an entry of `undefined`
        let index = self.labels.len() + self.undefined.len();
        self.undefined.push(word);
        Ok((symbol(SymbolKind::LabelReference, index as u32), 1))
    }

    /// Assign each label the address of the content following its definition.
    pub fn resolve_labels(&mut self) -> Result<(), C8Error> {
        let mut byte = PROGRAM_START;
        let mut assigned = 0;
        for symbol in self.symbols.iter() {
            if assigned == self.labels.len() {
                break;
            }
            match symbol.kind {
                SymbolKind::DefineByte => byte = byte.wrapping_add(1),
                SymbolKind::Instruction | SymbolKind::DefineWord => byte = byte.wrapping_add(2),
                SymbolKind::LabelDefinition => {
                    self.labels.set_byte(symbol.value as usize, byte);
                    assigned += 1;
                }
                _ => {}
            }
        }
        if !self.labels.is_resolved() {
            let unresolved = self
                .labels
                .iter()
                .find(|label| label.byte.is_none())
                .map_or("", |label| label.identifier.as_str());
            return Err(C8Error::new(
                ErrorKind::InvalidSymbol,
                format!("Label '{unresolved}' was never defined"),
            ));
        }
        Ok(())
    }

    /// Replace every label reference with its address.
    pub fn substitute_labels(&mut self) -> Result<(), C8Error> {
        for symbol in self.symbols.iter_mut() {
            if symbol.kind != SymbolKind::LabelReference {
                continue;
            }
            let byte = self
                .labels
                .get(symbol.value as usize)
                .and_then(|label| label.byte);
            let Some(byte) = byte else {
                let line = symbol.line;
                let raw = line
                    .checked_sub(1)
                    .and_then(|index| self.raw.get(index))
                    .map_or("", String::as_str);
                let name = (symbol.value as usize)
                    .checked_sub(self.labels.len())
                    .and_then(|index| self.undefined.get(index))
                    .map_or("label reference", String::as_str);
                return Err(error::invalid_symbol(line, raw, name));
            };
            symbol.kind = SymbolKind::Int12;
            symbol.value = byte as u32;
        }
        Ok(())
    }

    /// Write instructions and data in order.
    pub fn emit(&self) -> Result<Vec<u8>, C8Error> {
        let mut out: Vec<u8> = Vec::with_capacity(self.symbols.len() * 2);
        let symbols = self.symbols.as_slice();

        let mut i = 0;
        while let Some(symbol) = symbols.get(i) {
            let raw = self.raw_line(symbol.line);
            let bytes: Vec<u8> = match symbol.kind {
                SymbolKind::Instruction => {
                    let instruction = Instruction::gather(&symbols[i..], raw)?;
                    i += instruction.len();
                    instruction.encode(raw)?.to_be_bytes().to_vec()
                }
                SymbolKind::DefineByte => {
                    i += 1;
                    let value = u8::try_from(symbol.value).map_err(|_| {
                        error::invalid_argument(symbol.line, raw, "Byte value exceeds 255")
                    })?;
                    vec![value]
                }
                SymbolKind::DefineWord => {
                    i += 1;
                    let value = u16::try_from(symbol.value).map_err(|_| {
                        error::invalid_argument(symbol.line, raw, "Word value exceeds 65535")
                    })?;
                    value.to_be_bytes().to_vec()
                }
                SymbolKind::LabelDefinition => {
                    i += 1;
                    continue;
                }
                _ => return Err(error::invalid_symbol(symbol.line, raw, raw.trim())),
            };

            if out.len() + bytes.len() > PROGRAM_CAPACITY {
                return Err(error::too_many_symbols(symbol.line, raw));
            }
            out.extend(bytes);
        }
        Ok(out)
    }
}

/// `V` followed by a single hex digit.
fn parse_register(word: &str) -> Option<u8> {
    let mut chars = word.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('V'), Some(digit), None) => lexer::hex_digit(digit),
        _ => None,
    }
}
