//! Static Huffman coding over single-byte symbols.
//!
//! The input is scanned once for symbol counts, a prefix-code tree is built
//! from them, and the input is scanned again to write the codes. The counts
//! are stored in the output so the decoder can rebuild the same tree.

pub mod bitio;
pub mod codec;
pub mod config;
pub mod container;
pub mod error;
pub mod frequency;
pub mod huffman;
pub mod logger;
pub mod symbol;

pub use codec::{compress, compress_file, decompress, decompress_file, Outcome};
pub use config::{CompressOptions, DecompressOptions};
pub use error::{HuffError, Result};
