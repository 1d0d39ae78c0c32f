use crate::error::{HuffError, Result};
use crate::symbol::Symbol;
use std::collections::BTreeMap;
use std::io::{ErrorKind, Read};

/// Occurrence count of every symbol in one input, end-of-data included.
///
/// Iteration is ordered by symbol (bytes by value, `Eod` last). The tree
/// builder breaks ties by this order and the container stores the pairs in
/// it, so encoder and decoder rebuild the same tree from the same table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<Symbol, u32>,
}

impl FrequencyTable {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut stats = [0u64; 256];
        for byte in data {
            stats[*byte as usize] += 1;
        }

        Self::from_stats(&stats)
    }

    /// Counts every byte until `reader` is exhausted.
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut stats = [0u64; 256];
        let mut buffer = [0u8; 4096];

        loop {
            let num_read_bytes = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            for byte in &buffer[..num_read_bytes] {
                stats[*byte as usize] += 1;
            }
        }

        Self::from_stats(&stats)
    }

    /// Rebuilds a table from stored (symbol, count) pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Symbol, u32)>) -> Result<Self> {
        let mut counts = BTreeMap::new();
        for (symbol, count) in pairs {
            if counts.insert(symbol, count).is_some() {
                return Err(HuffError::format(format!(
                    "symbol {} appears twice in the frequency table",
                    symbol
                )));
            }
        }

        Ok(Self { counts })
    }

    fn from_stats(stats: &[u64; 256]) -> Result<Self> {
        let mut counts = BTreeMap::new();

        for (byte, &count) in stats.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let count = u32::try_from(count).map_err(|_| {
                HuffError::invalid_input(format!(
                    "byte 0x{:02x} occurs {} times, more than a 32-bit count can hold",
                    byte, count
                ))
            })?;
            counts.insert(Symbol::Byte(byte as u8), count);
        }

        // Real input never contains end-of-data, so this is always an insert.
        *counts.entry(Symbol::Eod).or_insert(0) += 1;

        Ok(Self { counts })
    }

    pub fn count(&self, symbol: Symbol) -> u32 {
        self.counts.get(&symbol).copied().unwrap_or(0)
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        self.counts.contains_key(&symbol)
    }

    /// Number of distinct symbols, end-of-data included.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, u32)> + '_ {
        self.counts.iter().map(|(symbol, count)| (*symbol, *count))
    }

    /// Length of the input this table describes, i.e. the sum of all byte
    /// counts.
    pub fn input_len(&self) -> u64 {
        self.iter()
            .filter(|(symbol, _)| *symbol != Symbol::Eod)
            .map(|(_, count)| count as u64)
            .sum()
    }
}
