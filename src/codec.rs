use crate::bitio::{BitReader, BitWriter};
use crate::config::{CompressOptions, DecompressOptions, CHECKSUM_LEN};
use crate::container::{self, CRC32};
use crate::error::{HuffError, Result};
use crate::frequency::FrequencyTable;
use crate::huffman::{CodeTable, HuffmanTree, PrefixCode};
use crate::symbol::Symbol;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

const OUTPUT_CHUNK: usize = 8192;

/// Result of a compression request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Compressed { input_len: u64, output_len: u64 },
    /// The header alone would be at least as large as the input, so nothing
    /// was written.
    NotBeneficial { input_len: u64, header_len: u64 },
}

/// Scans `reader` for symbol counts, rewinds it and encodes it into `writer`.
/// `writer` is left untouched when compressing would not pay off.
pub fn compress<R: Read + Seek, W: Write>(
    mut reader: R,
    writer: W,
    options: &CompressOptions,
) -> Result<Outcome> {
    let table = FrequencyTable::from_reader(&mut reader)?;
    if let Some(outcome) = check_not_beneficial(&table) {
        return Ok(outcome);
    }

    reader.rewind()?;
    encode(&table, reader, writer, options)
}

/// Encodes `reader`, whose symbol counts must be exactly `table`.
pub fn encode<W: Write>(
    table: &FrequencyTable,
    mut reader: impl Read,
    mut writer: W,
    options: &CompressOptions,
) -> Result<Outcome> {
    let codes = build_codes(table)?;

    container::write_header(&mut writer, table)?;

    let mut bit_writer = BitWriter::new(writer);
    let mut digest = CRC32.digest();
    let mut input_len: u64 = 0;
    let mut payload_bits: u64 = 0;
    let mut buffer = [0u8; 4096];

    loop {
        let num_read_bytes = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        for byte in &buffer[..num_read_bytes] {
            let code = codes.code(Symbol::Byte(*byte)).ok_or_else(|| {
                HuffError::invalid_input(format!(
                    "byte 0x{:02x} is not in the frequency table",
                    byte
                ))
            })?;
            bit_writer.write_code(code)?;
            payload_bits += code.length as u64;
        }

        digest.update(&buffer[..num_read_bytes]);
        input_len += num_read_bytes as u64;
    }

    if input_len != table.input_len() {
        return Err(HuffError::invalid_input(format!(
            "input is {} bytes but the frequency table describes {}",
            input_len,
            table.input_len()
        )));
    }

    let eod = codes
        .code(Symbol::Eod)
        .ok_or_else(|| HuffError::invalid_input("frequency table has no end-of-data entry"))?;
    bit_writer.write_code(eod)?;
    payload_bits += eod.length as u64;

    let mut writer = bit_writer.finish()?;

    let mut output_len = container::header_len(table) + payload_bits.div_ceil(8);
    if options.checksum {
        container::write_trailer(&mut writer, digest.finalize())?;
        output_len += CHECKSUM_LEN as u64;
    }
    writer.flush()?;

    debug!(input_len, output_len, "compressed");

    Ok(Outcome::Compressed {
        input_len,
        output_len,
    })
}

/// Decodes a container from `reader` into `writer` and returns the number of
/// bytes produced. Nothing is written if the header is invalid.
pub fn decompress<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    options: &DecompressOptions,
) -> Result<u64> {
    let table = container::read_header(&mut reader)?;
    let codes = build_codes(&table)?;
    let expected_len = table.input_len();

    let mut bit_reader = BitReader::new(reader);
    let mut digest = CRC32.digest();
    let mut chunk = Vec::with_capacity(OUTPUT_CHUNK);
    let mut written: u64 = 0;
    let mut candidate = PrefixCode::default();

    loop {
        let Some(bit) = bit_reader.read_bit()? else {
            return Err(HuffError::format(
                "compressed stream ends before the end-of-data marker",
            ));
        };
        candidate = PrefixCode::update(candidate, bit);

        match codes.symbol(&candidate) {
            Some(Symbol::Eod) => break,
            Some(Symbol::Byte(byte)) => {
                if written == expected_len {
                    return Err(HuffError::format(format!(
                        "stream decodes to more than the {} bytes its frequency table accounts for",
                        expected_len
                    )));
                }

                chunk.push(byte);
                written += 1;
                candidate = PrefixCode::default();

                if chunk.len() == OUTPUT_CHUNK {
                    digest.update(&chunk);
                    writer.write_all(&chunk)?;
                    chunk.clear();
                }
            }
            None if candidate.length >= codes.max_length() => {
                return Err(HuffError::format(format!(
                    "bit-path {} matches no symbol",
                    candidate
                )));
            }
            None => {}
        }
    }

    digest.update(&chunk);
    writer.write_all(&chunk)?;

    if written != expected_len {
        return Err(HuffError::format(format!(
            "stream decodes to {} bytes, frequency table accounts for {}",
            written, expected_len
        )));
    }

    // The rest of the byte holding the end-of-data code is padding.
    let trailer = container::read_trailer(&mut bit_reader.into_inner())?;
    match trailer {
        Some(expected) if options.verify_checksum => {
            let actual = digest.finalize();
            if expected != actual {
                return Err(HuffError::ChecksumMismatch { expected, actual });
            }
        }
        Some(_) => debug!("checksum present, verification disabled"),
        None => debug!("no checksum trailer"),
    }

    writer.flush()?;

    debug!(output_len = written, "decompressed");

    Ok(written)
}

/// Compresses the file at `input_path` into `output_path`. The output is
/// written to a temporary file next to it and only renamed into place once
/// encoding succeeds, so a skipped or failed run leaves `output_path` as it
/// was.
pub fn compress_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    options: &CompressOptions,
) -> Result<Outcome> {
    let input_path = input_path.as_ref();
    let output_path = output_path.as_ref();

    let input_file = File::open(input_path)?;
    let mut buf_reader = BufReader::new(input_file);

    let table = FrequencyTable::from_reader(&mut buf_reader)?;
    if let Some(outcome) = check_not_beneficial(&table) {
        return Ok(outcome);
    }

    check_distinct(input_path, output_path)?;
    buf_reader.rewind()?;

    write_atomically(output_path, |buf_writer| {
        encode(&table, buf_reader, buf_writer, options)
    })
}

/// Decompresses the file at `input_path` into `output_path`. Decoding and
/// verification finish before anything is written, and the output appears
/// only once it is complete.
pub fn decompress_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    options: &DecompressOptions,
) -> Result<u64> {
    let input_file = File::open(input_path)?;
    let buf_reader = BufReader::new(input_file);

    let mut decoded = Vec::new();
    let written = decompress(buf_reader, &mut decoded, options)?;

    write_atomically(output_path.as_ref(), |mut buf_writer| {
        buf_writer.write_all(&decoded)?;
        buf_writer.flush()?;
        Ok(written)
    })
}

fn check_not_beneficial(table: &FrequencyTable) -> Option<Outcome> {
    let input_len = table.input_len();
    let header_len = container::header_len(table);

    debug!(symbols = table.len(), input_len, header_len, "frequency table built");

    if header_len < input_len {
        None
    } else {
        Some(Outcome::NotBeneficial {
            input_len,
            header_len,
        })
    }
}

// Compares file identity rather than paths, so hard links and symlinks to
// the input are caught too.
fn check_distinct(input_path: &Path, output_path: &Path) -> Result<()> {
    if is_same_file(input_path, output_path) {
        return Err(HuffError::invalid_input(
            "input and output are the same file",
        ));
    }
    Ok(())
}

#[cfg(unix)]
fn is_same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Runs `write` against a temporary file in the directory of `output_path`
/// and renames it over `output_path` on success. On failure the temporary
/// file is removed and `output_path` is untouched.
fn write_atomically<T>(
    output_path: &Path,
    write: impl FnOnce(BufWriter<File>) -> Result<T>,
) -> Result<T> {
    let tmp_path = temp_path_for(output_path);

    let result = File::create(&tmp_path)
        .map_err(HuffError::from)
        .and_then(|file| write(BufWriter::new(file)))
        .and_then(|value| {
            fs::rename(&tmp_path, output_path)?;
            Ok(value)
        });

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn temp_path_for(output_path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(output_path.file_name().unwrap_or_default());
    name.push(format!(".{}.tmp", std::process::id()));
    output_path.with_file_name(name)
}

fn build_codes(table: &FrequencyTable) -> Result<CodeTable> {
    let tree = HuffmanTree::build(table)?;
    let codes = CodeTable::from(&tree);

    debug!(
        leaves = tree.num_leaves(),
        max_code_length = codes.max_length(),
        "code table built"
    );
    for (symbol, code) in codes.iter() {
        trace!(%symbol, %code, count = table.count(symbol), "code assigned");
    }

    Ok(codes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn compress_bytes(data: &[u8]) -> (Outcome, Vec<u8>) {
        let mut out = Vec::new();
        let outcome = compress(Cursor::new(data), &mut out, &CompressOptions::default()).unwrap();
        (outcome, out)
    }

    fn decompress_bytes(data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        decompress(data, &mut out, &DecompressOptions::default())?;
        Ok(out)
    }

    #[test]
    fn aaab_round_trip_through_encode() {
        let table = FrequencyTable::from_bytes(b"aaab").unwrap();
        let mut out = Vec::new();
        let options = CompressOptions { checksum: false };
        encode(&table, &b"aaab"[..], &mut out, &options).unwrap();

        // a=1 a=1 a=1 b=00 EOD=01 -> seven bits and one zero of padding.
        let header_len = container::header_len(&table) as usize;
        assert_eq!(&out[header_len..], &[0b1110_0010]);

        assert_eq!(decompress_bytes(&out).unwrap(), b"aaab");
    }

    #[test]
    fn round_trip_text() {
        let data = b"It was the best of times, it was the worst of times, it was the age of \
                     wisdom, it was the age of foolishness, it was the epoch of belief."
            .repeat(20);
        let (outcome, compressed) = compress_bytes(&data);

        let Outcome::Compressed {
            input_len,
            output_len,
        } = outcome
        else {
            panic!("expected compression, got {:?}", outcome);
        };
        assert_eq!(input_len, data.len() as u64);
        assert_eq!(output_len, compressed.len() as u64);
        assert!(output_len < input_len);
        assert_eq!(decompress_bytes(&compressed).unwrap(), data);
    }

    #[test]
    fn round_trip_every_byte_value() {
        let data = (0..20_000u32)
            .map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8)
            .collect::<Vec<_>>();
        let (outcome, compressed) = compress_bytes(&data);

        assert!(matches!(outcome, Outcome::Compressed { .. }));
        assert_eq!(decompress_bytes(&compressed).unwrap(), data);
    }

    #[test]
    fn single_byte_is_not_beneficial() {
        let (outcome, out) = compress_bytes(b"x");

        assert_eq!(
            outcome,
            Outcome::NotBeneficial {
                input_len: 1,
                header_len: 18
            }
        );
        assert!(out.is_empty());
    }

    #[test]
    fn empty_input_is_not_beneficial() {
        let (outcome, out) = compress_bytes(b"");

        assert!(matches!(outcome, Outcome::NotBeneficial { input_len: 0, .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn repeated_byte_compresses_well() {
        let data = vec![b'z'; 100_000];
        let (outcome, compressed) = compress_bytes(&data);

        // One bit per byte plus header and checksum.
        assert!(compressed.len() < 100_000 / 8 + 64);
        assert!(matches!(outcome, Outcome::Compressed { .. }));
        assert_eq!(decompress_bytes(&compressed).unwrap(), data);
    }

    #[test]
    fn output_is_deterministic() {
        let data = b"abcabcabcddddeeeeeffffffgggggggg".repeat(4);

        assert_eq!(compress_bytes(&data).1, compress_bytes(&data).1);
    }

    #[test]
    fn header_bytes_equal_to_input_are_skipped() {
        // table {a, EOD}: header = 8 + 2 * 5 = 18 bytes.
        assert!(matches!(
            compress_bytes(&[b'a'; 18]).0,
            Outcome::NotBeneficial { header_len: 18, .. }
        ));
        assert!(matches!(
            compress_bytes(&[b'a'; 19]).0,
            Outcome::Compressed { .. }
        ));
    }

    #[test]
    fn checksum_mismatch_is_reported() {
        let data = b"checksum me please, checksum me please".to_vec();
        let (_, mut compressed) = compress_bytes(&data);
        let last = compressed.len() - 1;
        compressed[last] ^= 0xFF;

        assert!(matches!(
            decompress_bytes(&compressed),
            Err(HuffError::ChecksumMismatch { .. })
        ));

        let mut out = Vec::new();
        let options = DecompressOptions {
            verify_checksum: false,
        };
        decompress(&compressed[..], &mut out, &options).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn missing_checksum_is_accepted() {
        let data = b"no trailer here, no trailer here".to_vec();
        let mut with = Vec::new();
        let mut without = Vec::new();
        compress(Cursor::new(&data), &mut with, &CompressOptions::default()).unwrap();
        compress(
            Cursor::new(&data),
            &mut without,
            &CompressOptions { checksum: false },
        )
        .unwrap();

        assert_eq!(with.len(), without.len() + CHECKSUM_LEN);
        assert_eq!(decompress_bytes(&without).unwrap(), data);
    }

    #[test]
    fn truncated_payload_is_a_format_error() {
        let data = b"truncate the payload of this one please".repeat(3);
        let mut compressed = Vec::new();
        compress(
            Cursor::new(&data),
            &mut compressed,
            &CompressOptions { checksum: false },
        )
        .unwrap();
        let table = FrequencyTable::from_bytes(&data).unwrap();
        compressed.truncate(container::header_len(&table) as usize + 3);

        assert!(matches!(
            decompress_bytes(&compressed),
            Err(HuffError::Format(_))
        ));
    }

    #[test]
    fn bad_magic_writes_nothing() {
        let mut out = Vec::new();
        let result = decompress(
            &b"not a huffman file at all"[..],
            &mut out,
            &DecompressOptions::default(),
        );

        assert!(matches!(result, Err(HuffError::Format(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn single_leaf_container_decodes_to_nothing() {
        let table = FrequencyTable::from_bytes(&[]).unwrap();
        let mut out = Vec::new();
        encode(&table, &[0u8; 0][..], &mut out, &CompressOptions::default()).unwrap();

        // EOD alone is coded as a single 0 bit.
        let header_len = container::header_len(&table) as usize;
        assert_eq!(out[header_len], 0);
        assert!(decompress_bytes(&out).unwrap().is_empty());

        // A 1 bit matches no code in a single-leaf tree.
        out[header_len] = 0b1000_0000;
        assert!(matches!(decompress_bytes(&out), Err(HuffError::Format(_))));
    }

    #[test]
    fn input_not_matching_table_is_rejected() {
        let table = FrequencyTable::from_bytes(b"aaab").unwrap();
        let mut out = Vec::new();
        let options = CompressOptions::default();

        assert!(matches!(
            encode(&table, &b"aaac"[..], &mut out, &options),
            Err(HuffError::InvalidInput(_))
        ));
        assert!(matches!(
            encode(&table, &b"aaabb"[..], &mut Vec::new(), &options),
            Err(HuffError::InvalidInput(_))
        ));
    }
}
