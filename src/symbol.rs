use std::fmt;

/// Maximum number of labels a single program may define.
///
/// The label table has 64 slots, and inserting stops once it would become full.
pub const MAX_LABELS: usize = 63;
/// Maximum length of a label identifier.
pub const MAX_LABEL_LEN: usize = 20;

const SYMBOLS_INITIAL_CAPACITY: usize = 256;

/// Instruction mnemonics, in the order the assembler tests for them.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mnemonic {
    Cls,
    Ret,
    Jp,
    Call,
    Se,
    Sne,
    Ld,
    Add,
    Or,
    And,
    Sub,
    Shr,
    Subn,
    Shl,
    Rnd,
    Drw,
    Skp,
    Sknp,
    Xor,
    Scd,
    Scr,
    Scl,
    Exit,
    Low,
    High,
}

impl Mnemonic {
    pub const ALL: [Mnemonic; 25] = [
        Self::Cls,
        Self::Ret,
        Self::Jp,
        Self::Call,
        Self::Se,
        Self::Sne,
        Self::Ld,
        Self::Add,
        Self::Or,
        Self::And,
        Self::Sub,
        Self::Shr,
        Self::Subn,
        Self::Shl,
        Self::Rnd,
        Self::Drw,
        Self::Skp,
        Self::Sknp,
        Self::Xor,
        Self::Scd,
        Self::Scr,
        Self::Scl,
        Self::Exit,
        Self::Low,
        Self::High,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Cls => "CLS",
            Self::Ret => "RET",
            Self::Jp => "JP",
            Self::Call => "CALL",
            Self::Se => "SE",
            Self::Sne => "SNE",
            Self::Ld => "LD",
            Self::Add => "ADD",
            Self::Or => "OR",
            Self::And => "AND",
            Self::Sub => "SUB",
            Self::Shr => "SHR",
            Self::Subn => "SUBN",
            Self::Shl => "SHL",
            Self::Rnd => "RND",
            Self::Drw => "DRW",
            Self::Skp => "SKP",
            Self::Sknp => "SKNP",
            Self::Xor => "XOR",
            Self::Scd => "SCD",
            Self::Scr => "SCR",
            Self::Scl => "SCL",
            Self::Exit => "EXIT",
            Self::Low => "LOW",
            Self::High => "HIGH",
        }
    }

    /// Exact match against an upper-cased word.
    pub fn from_word(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mnemonic| mnemonic.name() == word)
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Classification of a single assembled word.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SymbolKind {
    /// `DT`
    DelayTimer,
    /// `ST`
    SoundTimer,
    /// `I`
    AddressRegister,
    /// `[I]`
    MemoryIndirect,
    /// `K`
    KeyWait,
    /// `F`
    FontSprite,
    /// `B`
    BcdDigits,
    /// `HF`
    HighResFontSprite,
    /// `R`
    FlagRegister,
    DefineByte,
    DefineWord,
    DefineString,
    /// Value is an index into the label list.
    LabelReference,
    /// Value is an index into the label list.
    LabelDefinition,
    Int4,
    Int8,
    Int12,
    UnsizedInt,
    VRegister,
    /// Value is an index into [`Mnemonic::ALL`].
    Instruction,
}

impl SymbolKind {
    /// Reserved identifiers, matched after mnemonics and registers.
    pub const RESERVED: [(&'static str, SymbolKind); 12] = [
        ("DT", Self::DelayTimer),
        ("ST", Self::SoundTimer),
        ("I", Self::AddressRegister),
        ("[I]", Self::MemoryIndirect),
        ("K", Self::KeyWait),
        ("F", Self::FontSprite),
        ("B", Self::BcdDigits),
        (".DB", Self::DefineByte),
        (".DW", Self::DefineWord),
        (".DS", Self::DefineString),
        ("HF", Self::HighResFontSprite),
        ("R", Self::FlagRegister),
    ];

    pub fn reserved(word: &str) -> Option<Self> {
        Self::RESERVED
            .into_iter()
            .find(|(name, _)| *name == word)
            .map(|(_, kind)| kind)
    }

    /// Name written in source for reserved identifiers.
    pub fn reserved_name(&self) -> Option<&'static str> {
        Self::RESERVED
            .into_iter()
            .find(|(_, kind)| kind == self)
            .map(|(name, _)| name)
    }

    /// Smallest integer class which can hold `value`.
    pub fn int_for(value: u32) -> Self {
        match value {
            0..=0xF => Self::Int4,
            0x10..=0xFF => Self::Int8,
            0x100..=0xFFF => Self::Int12,
            _ => Self::UnsizedInt,
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(
            self,
            Self::Int4 | Self::Int8 | Self::Int12 | Self::UnsizedInt
        )
    }

    /// Exclusive upper bound of a sized integer class.
    pub fn int_limit(&self) -> Option<u32> {
        match self {
            Self::Int4 => Some(0x10),
            Self::Int8 => Some(0x100),
            Self::Int12 => Some(0x1000),
            _ => None,
        }
    }

    /// Whether the symbol can follow a mnemonic as one of its operands.
    pub fn is_operand(&self) -> bool {
        matches!(
            self,
            Self::VRegister
                | Self::Int4
                | Self::Int8
                | Self::Int12
                | Self::DelayTimer
                | Self::SoundTimer
                | Self::AddressRegister
                | Self::MemoryIndirect
                | Self::KeyWait
                | Self::FontSprite
                | Self::BcdDigits
                | Self::HighResFontSprite
                | Self::FlagRegister
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Symbol {
    pub kind: SymbolKind,
    /// Meaning depends on `kind`: register index, integer value, label index or mnemonic index.
    pub value: u32,
    /// 1-based source line.
    pub line: usize,
}

impl Symbol {
    pub fn new(kind: SymbolKind, value: u32, line: usize) -> Self {
        Symbol { kind, value, line }
    }

    pub fn mnemonic(&self) -> Option<Mnemonic> {
        match self.kind {
            SymbolKind::Instruction => Mnemonic::ALL.get(self.value as usize).copied(),
            _ => None,
        }
    }
}

/// Ordered symbol stream produced by the assembler's parsing pass.
#[derive(Debug)]
pub struct SymbolList(Vec<Symbol>);

impl SymbolList {
    pub fn new() -> Self {
        Self(Vec::with_capacity(SYMBOLS_INITIAL_CAPACITY))
    }

    pub fn push(&mut self, symbol: Symbol) {
        self.0.push(symbol);
    }

    pub fn get(&self, index: usize) -> Option<&Symbol> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Symbol] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Symbol> {
        self.0.iter_mut()
    }
}

impl Default for SymbolList {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a SymbolList {
    type Item = &'a Symbol;
    type IntoIter = std::slice::Iter<'a, Symbol>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Label used to refer to specific memory addresses.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Label {
    /// Always upper-case.
    pub identifier: String,
    /// Unknown until the symbol stream has been sized.
    pub byte: Option<u16>,
}

#[derive(Debug, Default)]
pub struct LabelList(Vec<Label>);

/// Why a label could not be added.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LabelError {
    Duplicate,
    Full,
    TooLong,
}

impl LabelList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds an unresolved label, returning its index.
    pub fn insert(&mut self, identifier: &str) -> Result<usize, LabelError> {
        let identifier = identifier.to_uppercase();
        if identifier.len() > MAX_LABEL_LEN {
            return Err(LabelError::TooLong);
        }
        if self.find(&identifier).is_some() {
            return Err(LabelError::Duplicate);
        }
        if self.0.len() >= MAX_LABELS {
            return Err(LabelError::Full);
        }
        self.0.push(Label {
            identifier,
            byte: None,
        });
        Ok(self.0.len() - 1)
    }

    /// Index of label with (upper-case) identifier.
    pub fn find(&self, identifier: &str) -> Option<usize> {
        self.0
            .iter()
            .position(|label| label.identifier == identifier)
    }

    pub fn get(&self, index: usize) -> Option<&Label> {
        self.0.get(index)
    }

    pub fn set_byte(&mut self, index: usize, byte: u16) {
        if let Some(label) = self.0.get_mut(index) {
            label.byte = Some(byte);
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.0.iter().all(|label| label.byte.is_some())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.0.iter()
    }
}
