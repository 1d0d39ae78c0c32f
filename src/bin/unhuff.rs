use anyhow::Context;
use clap::Parser;
use huff::{decompress_file, DecompressOptions};
use std::path::PathBuf;
use tracing::info;

/// Restore a file written by `huff`.
#[derive(Debug, clap::Parser)]
#[command(name = "unhuff", version)]
struct Args {
    input_path: PathBuf,
    output_path: PathBuf,

    /// Skip the CRC-32 check even when the input carries one.
    #[arg(long)]
    no_verify: bool,

    /// Log more (repeat for more detail).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    huff::logger::init(args.verbose)?;

    let options = DecompressOptions {
        verify_checksum: !args.no_verify,
    };

    let written = decompress_file(&args.input_path, &args.output_path, &options)
        .with_context(|| format!("failed to decompress {}", args.input_path.display()))?;

    info!(output_len = written, "wrote {}", args.output_path.display());

    Ok(())
}
