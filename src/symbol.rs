/// A value the coder assigns a code to.
///
/// The derived ordering puts every byte before `Eod`, so iterating a sorted
/// collection of symbols yields the bytes by value and end-of-data last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Byte(u8),
    /// Synthetic end-of-data marker. Never produced by real input.
    Eod,
}

impl Symbol {
    /// Dense index in `0..MAX_SYMBOLS`, `Eod` being 256.
    pub fn index(self) -> usize {
        match self {
            Symbol::Byte(byte) => byte as usize,
            Symbol::Eod => 256,
        }
    }

    /// Inverse of [`Symbol::index`].
    pub fn from_index(idx: usize) -> Option<Symbol> {
        match idx {
            0..=255 => Some(Symbol::Byte(idx as u8)),
            256 => Some(Symbol::Eod),
            _ => None,
        }
    }
}

impl From<u8> for Symbol {
    fn from(byte: u8) -> Self {
        Symbol::Byte(byte)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Byte(byte) if byte.is_ascii_graphic() => write!(f, "{:?}", *byte as char),
            Symbol::Byte(byte) => write!(f, "0x{:02x}", byte),
            Symbol::Eod => write!(f, "EOD"),
        }
    }
}
