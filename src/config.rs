/// Sentinel stored in the first four bytes of every container.
pub const MAGIC_NUMBER: u32 = 0xFFFF_FFFF;

/// On-disk symbol byte of the end-of-data entry. The entry itself is
/// recognized by position (always the last pair), the tag only guards it.
pub const EOD_TAG: u8 = 0x0D;

pub const MAGIC_LEN: usize = std::mem::size_of::<u32>();
pub const PAIR_COUNT_LEN: usize = std::mem::size_of::<u32>();
pub const PAIR_LEN: usize = std::mem::size_of::<u8>() + std::mem::size_of::<u32>();
pub const CHECKSUM_LEN: usize = std::mem::size_of::<u32>();

/// 256 byte values plus end-of-data.
pub const MAX_SYMBOLS: usize = 257;

#[derive(Debug, Clone)]
pub struct CompressOptions {
    /// Append a CRC-32 of the input after the bitstream.
    pub checksum: bool,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self { checksum: true }
    }
}

#[derive(Debug, Clone)]
pub struct DecompressOptions {
    /// Check the CRC-32 trailer when one is present.
    pub verify_checksum: bool,
}

impl Default for DecompressOptions {
    fn default() -> Self {
        Self {
            verify_checksum: true,
        }
    }
}
