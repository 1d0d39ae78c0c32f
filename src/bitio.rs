use crate::huffman::PrefixCode;
use std::io::{self, ErrorKind, Read, Write};

/// Packs bits most-significant first into whole bytes.
pub struct BitWriter<W: Write> {
    writer: W,
    buffer: u8,
    buffer_length: u8,
}

/// Yields the bits of a byte stream, most-significant bit of each byte first.
pub struct BitReader<R: Read> {
    reader: R,
    buffer: u8,
    buffer_length: u8,
}

impl<W: Write> BitWriter<W> {
    pub fn new(writer: W) -> Self {
        BitWriter {
            writer,
            buffer: 0,
            buffer_length: 0,
        }
    }

    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        self.buffer = (self.buffer << 1) | bit as u8;
        self.buffer_length += 1;

        if self.buffer_length == 8 {
            self.flush_buffer()?;
        }

        Ok(())
    }

    pub fn write_code(&mut self, code: &PrefixCode) -> io::Result<()> {
        for bit in code.bits() {
            self.write_bit(bit)?;
        }

        Ok(())
    }

    // Pads a partial byte with zeros on the low-order side.
    fn flush_buffer(&mut self) -> io::Result<()> {
        if self.buffer_length > 0 {
            self.buffer <<= 8 - self.buffer_length;
            self.writer.write_all(&[self.buffer])?;
            self.buffer = 0;
            self.buffer_length = 0;
        }

        Ok(())
    }

    /// Writes out the last partial byte and hands back the sink.
    pub fn finish(mut self) -> io::Result<W> {
        self.flush_buffer()?;
        self.writer.flush()?;

        Ok(self.writer)
    }
}

impl<R: Read> BitReader<R> {
    pub fn new(reader: R) -> Self {
        BitReader {
            reader,
            buffer: 0,
            buffer_length: 0,
        }
    }

    /// Next bit, or `None` once the stream is exhausted.
    pub fn read_bit(&mut self) -> io::Result<Option<bool>> {
        if self.buffer_length == 0 {
            let mut byte = [0];
            loop {
                match self.reader.read(&mut byte) {
                    Ok(0) => return Ok(None),
                    Ok(_) => break,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                }
            }

            self.buffer = byte[0];
            self.buffer_length = 8;
        }

        self.buffer_length -= 1;

        Ok(Some((self.buffer >> self.buffer_length) & 1 == 1))
    }

    /// Drops the unread bits of the current byte and returns the reader,
    /// positioned at the next whole byte.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> PrefixCode {
        s.chars().fold(PrefixCode::default(), |code, c| {
            PrefixCode::update(code, c == '1')
        })
    }

    #[test]
    fn bits_are_packed_msb_first() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_code(&code("1011")).unwrap();
        writer.write_code(&code("0001")).unwrap();

        assert_eq!(writer.finish().unwrap(), vec![0b1011_0001]);
    }

    #[test]
    fn codes_straddle_byte_boundaries() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_code(&code("111")).unwrap();
        writer.write_code(&code("0000011")).unwrap();
        writer.write_code(&code("01")).unwrap();

        assert_eq!(writer.finish().unwrap(), vec![0b1110_0000, 0b1101_0000]);
    }

    #[test]
    fn final_partial_byte_is_zero_padded() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_code(&code("1")).unwrap();

        assert_eq!(writer.finish().unwrap(), vec![0b1000_0000]);
    }

    #[test]
    fn nothing_written_means_no_bytes() {
        let writer = BitWriter::new(Vec::new());

        assert!(writer.finish().unwrap().is_empty());
    }

    #[test]
    fn reader_yields_msb_first_then_none() {
        let data = [0b1000_0001u8];
        let mut reader = BitReader::new(&data[..]);

        let mut bits = Vec::new();
        while let Some(bit) = reader.read_bit().unwrap() {
            bits.push(bit);
        }

        assert_eq!(
            bits,
            vec![true, false, false, false, false, false, false, true]
        );
    }

    #[test]
    fn into_inner_skips_rest_of_current_byte() {
        let data = [0b1100_0000u8, 0xAB, 0xCD];
        let mut reader = BitReader::new(&data[..]);

        assert_eq!(reader.read_bit().unwrap(), Some(true));
        let mut rest = Vec::new();
        reader.into_inner().read_to_end(&mut rest).unwrap();

        assert_eq!(rest, vec![0xAB, 0xCD]);
    }
}
