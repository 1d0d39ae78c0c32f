//! On-disk layout, all integers 32-bit little-endian:
//!
//! ```text
//! magic number      4 bytes
//! pair count N      4 bytes
//! N pairs           1 byte symbol + 4 byte count, ordered by symbol,
//!                   end-of-data last (tagged EOD_TAG)
//! bitstream         codes MSB-first, zero-padded to a whole byte
//! checksum          optional CRC-32 of the original input, 4 bytes
//! ```

use crate::config::{
    CHECKSUM_LEN, EOD_TAG, MAGIC_LEN, MAGIC_NUMBER, MAX_SYMBOLS, PAIR_COUNT_LEN, PAIR_LEN,
};
use crate::error::{HuffError, Result};
use crate::frequency::FrequencyTable;
use crate::symbol::Symbol;
use crc::{Crc, CRC_32_ISO_HDLC};
use std::io::{ErrorKind, Read, Write};

pub const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Bytes taken by the magic number, pair count and frequency table.
pub fn header_len(table: &FrequencyTable) -> u64 {
    (MAGIC_LEN + PAIR_COUNT_LEN + table.len() * PAIR_LEN) as u64
}

pub fn write_header(writer: &mut impl Write, table: &FrequencyTable) -> Result<()> {
    let Some((Symbol::Eod, _)) = table.iter().last() else {
        return Err(HuffError::invalid_input(
            "frequency table has no end-of-data entry",
        ));
    };

    writer.write_all(&MAGIC_NUMBER.to_le_bytes())?;
    writer.write_all(&(table.len() as u32).to_le_bytes())?;

    for (symbol, count) in table.iter() {
        let tag = match symbol {
            Symbol::Byte(byte) => byte,
            Symbol::Eod => EOD_TAG,
        };
        writer.write_all(&[tag])?;
        writer.write_all(&count.to_le_bytes())?;
    }

    Ok(())
}

/// Validates the magic number before anything else, then reads the
/// frequency table.
pub fn read_header(reader: &mut impl Read) -> Result<FrequencyTable> {
    let mut buffer = [0u8; 4];

    read_field(reader, &mut buffer, "magic number")?;
    let magic = u32::from_le_bytes(buffer);
    if magic != MAGIC_NUMBER {
        return Err(HuffError::format(format!(
            "bad magic number {:#010x}",
            magic
        )));
    }

    read_field(reader, &mut buffer, "pair count")?;
    let num_pairs = u32::from_le_bytes(buffer) as usize;
    if num_pairs == 0 || num_pairs > MAX_SYMBOLS {
        return Err(HuffError::format(format!(
            "frequency table cannot hold {} entries",
            num_pairs
        )));
    }

    let mut pairs = Vec::with_capacity(num_pairs);
    let mut pair = [0u8; PAIR_LEN];
    let mut prev_byte: Option<u8> = None;

    for idx in 0..num_pairs {
        read_field(reader, &mut pair, "frequency table")?;
        let tag = pair[0];
        let count = u32::from_le_bytes([pair[1], pair[2], pair[3], pair[4]]);

        // End-of-data is known by position; its tag only has to match.
        let symbol = if idx == num_pairs - 1 {
            if tag != EOD_TAG {
                return Err(HuffError::format("frequency table does not end with end-of-data"));
            }
            Symbol::Eod
        } else {
            if prev_byte.is_some_and(|prev| prev >= tag) {
                return Err(HuffError::format("frequency table is not sorted by symbol"));
            }
            prev_byte = Some(tag);
            Symbol::Byte(tag)
        };

        pairs.push((symbol, count));
    }

    FrequencyTable::from_pairs(pairs)
}

pub fn write_trailer(writer: &mut impl Write, checksum: u32) -> Result<()> {
    writer.write_all(&checksum.to_le_bytes())?;
    Ok(())
}

/// Reads everything after the bitstream: nothing, or exactly one checksum.
pub fn read_trailer(reader: &mut impl Read) -> Result<Option<u32>> {
    let mut rest = Vec::with_capacity(CHECKSUM_LEN);
    reader.read_to_end(&mut rest)?;

    match rest.len() {
        0 => Ok(None),
        CHECKSUM_LEN => Ok(Some(u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]))),
        n => Err(HuffError::format(format!(
            "{} unexpected bytes after end-of-data",
            n
        ))),
    }
}

fn read_field(reader: &mut impl Read, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            HuffError::format(format!("file ends inside the {}", what))
        } else {
            HuffError::Io(e)
        }
    })
}
