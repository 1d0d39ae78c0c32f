use anyhow::Context;
use clap::Parser;
use huff::{compress_file, CompressOptions, Outcome};
use std::path::PathBuf;
use tracing::info;

/// Compress a file with static Huffman coding.
#[derive(Debug, clap::Parser)]
#[command(name = "huff", version)]
struct Args {
    input_path: PathBuf,
    output_path: PathBuf,

    /// Do not append a CRC-32 of the input to the output.
    #[arg(long)]
    no_checksum: bool,

    /// Log more (repeat for more detail).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    huff::logger::init(args.verbose)?;

    let options = CompressOptions {
        checksum: !args.no_checksum,
    };

    let outcome = compress_file(&args.input_path, &args.output_path, &options)
        .with_context(|| format!("failed to compress {}", args.input_path.display()))?;

    match outcome {
        Outcome::Compressed {
            input_len,
            output_len,
        } => info!(
            input_len,
            output_len,
            "wrote {}",
            args.output_path.display()
        ),
        Outcome::NotBeneficial {
            input_len,
            header_len,
        } => {
            info!(input_len, header_len, "header would not be smaller than the input");
            println!("File will not compress");
        }
    }

    Ok(())
}
