// Copyright 2024 Karpeles Lab Inc.
// Zstandard streaming decompression command-line tool

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zstream::{
    is_skippable_frame, parse_skippable_frame, DecompressionDictionary, StreamingDecompress,
    SKIPPABLE_HEADER_SIZE,
};

#[derive(Parser)]
#[command(name = "zsd")]
#[command(about = "Zstandard streaming decompression tool", long_about = None)]
#[command(version)]
struct Args {
    /// Input files to decompress
    #[arg(required = true)]
    files: Vec<String>,

    /// Write output to stdout (use with single file or -)
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Output file (use with single input file)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Decompress using this dictionary file
    #[arg(long)]
    dict: Option<PathBuf>,

    /// Print the metadata of a leading skippable frame
    #[arg(long)]
    show_meta: bool,

    /// Do not overwrite existing files
    #[arg(long)]
    safe: bool,

    /// Delete source files after successful decompression
    #[arg(long)]
    rm: bool,

    /// Quiet mode - don't print progress
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Verify files only, don't write output
    #[arg(long)]
    verify: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Validate arguments
    if args.files.len() > 1 && args.output.is_some() {
        anyhow::bail!("Cannot use -o with multiple input files");
    }

    if args.files.len() > 1 && args.stdout {
        anyhow::bail!("Cannot use -c with multiple input files");
    }

    let dict = match args.dict {
        Some(ref path) => {
            let bytes = fs::read(path)
                .with_context(|| format!("Failed to read dictionary: {}", path.display()))?;
            let dict = DecompressionDictionary::new(&bytes)
                .with_context(|| format!("Invalid dictionary: {}", path.display()))?;
            Some(Arc::new(dict))
        }
        None => None,
    };

    // Handle stdin/stdout case
    if args.files.len() == 1 && args.files[0] == "-" {
        let stdin = io::stdin();
        let mut reader = stdin.lock();
        if args.verify {
            decompress_stream(&mut reader, &mut io::sink(), &args, dict.as_ref(), None)?;
            if !args.quiet {
                eprintln!("Verification successful");
            }
        } else {
            let stdout = io::stdout();
            decompress_stream(&mut reader, &mut stdout.lock(), &args, dict.as_ref(), None)?;
        }
        return Ok(());
    }

    // Decompress each file
    for file in &args.files {
        decompress_file(file, &args, dict.as_ref())?;
    }

    Ok(())
}

fn decompress_file(
    input_path: &str,
    args: &Args,
    dict: Option<&Arc<DecompressionDictionary>>,
) -> Result<()> {
    let input = PathBuf::from(input_path);

    if !input.exists() {
        anyhow::bail!("File not found: {}", input_path);
    }

    if !input.is_file() {
        anyhow::bail!("Not a file: {}", input_path);
    }

    // Determine output path
    let output = if args.verify {
        PathBuf::from("-") // Don't write anything in verify mode
    } else if let Some(ref out) = args.output {
        out.clone()
    } else if args.stdout {
        PathBuf::from("-")
    } else {
        let path_str = input.to_string_lossy();
        match path_str.strip_suffix(".zst") {
            Some(stripped) => PathBuf::from(stripped),
            None => anyhow::bail!("Input file must have .zst extension: {}", input.display()),
        }
    };

    // Check if output exists in safe mode
    if args.safe && !args.verify && output != Path::new("-") && output.exists() {
        anyhow::bail!("Output file already exists: {}", output.display());
    }

    // Get file size for progress bar
    let file_size = fs::metadata(&input)?.len();

    let pb = if !args.quiet && !args.stdout && !args.verify {
        let pb = ProgressBar::new(file_size);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut input_file = File::open(&input)
        .with_context(|| format!("Failed to open input file: {}", input.display()))?;

    let result = if args.verify {
        decompress_stream(&mut input_file, &mut io::sink(), args, dict, pb.as_ref())
    } else if output == Path::new("-") {
        let stdout = io::stdout();
        let mut stdout_lock = stdout.lock();
        decompress_stream(&mut input_file, &mut stdout_lock, args, dict, pb.as_ref())
    } else {
        let mut output_file = File::create(&output)
            .with_context(|| format!("Failed to create output file: {}", output.display()))?;
        decompress_stream(&mut input_file, &mut output_file, args, dict, pb.as_ref())
    };
    let written = result.with_context(|| format!("Decompression failed: {}", input.display()))?;

    if let Some(pb) = pb {
        pb.finish_with_message("Done");
    }

    if args.verify {
        if !args.quiet {
            println!("Verification successful: {}", input.display());
        }
    } else if !args.quiet && !args.stdout && written > 0 {
        let ratio = (file_size as f64 / written as f64) * 100.0;
        println!(
            "{} -> {} (compressed to {:.2}%)",
            input.display(),
            output.display(),
            ratio
        );
    }

    if args.rm && output != Path::new("-") && !args.verify {
        fs::remove_file(&input)
            .with_context(|| format!("Failed to remove source file: {}", input.display()))?;
    }

    Ok(())
}

/// Read a leading skippable frame, if any, and return its metadata along
/// with every byte consumed from `input`
fn read_leading_metadata<R: Read>(input: &mut R) -> Result<(Option<Vec<u8>>, Vec<u8>)> {
    let mut head = Vec::with_capacity(SKIPPABLE_HEADER_SIZE);
    (&mut *input)
        .take(SKIPPABLE_HEADER_SIZE as u64)
        .read_to_end(&mut head)?;

    if !is_skippable_frame(&head) {
        return Ok((None, head));
    }

    let metadata_len = u32::from_le_bytes([head[4], head[5], head[6], head[7]]);
    (&mut *input)
        .take(u64::from(metadata_len))
        .read_to_end(&mut head)?;

    let metadata = parse_skippable_frame(&head)
        .context("Metadata frame is truncated")?
        .map(|frame| frame.metadata().to_vec());
    Ok((metadata, head))
}

/// Decompress `input` into `output`, returning the number of bytes written
fn decompress_stream<R: Read, W: Write>(
    input: &mut R,
    output: &mut W,
    args: &Args,
    dict: Option<&Arc<DecompressionDictionary>>,
    pb: Option<&ProgressBar>,
) -> Result<u64> {
    let mut stream = match dict {
        Some(dict) => StreamingDecompress::with_prepared_dictionary(Arc::clone(dict))?,
        None => StreamingDecompress::new()?,
    };
    let mut written = 0u64;

    if args.show_meta {
        let (metadata, head) = read_leading_metadata(input)?;
        match metadata {
            Some(metadata) if args.stdout || (args.output.is_none() && args.files[0] == "-") => {
                eprintln!("{}", String::from_utf8_lossy(&metadata))
            }
            Some(metadata) => println!("{}", String::from_utf8_lossy(&metadata)),
            None => log::info!("no metadata frame"),
        }
        written += feed(&mut stream, &head, output)?;
        if let Some(pb) = pb {
            pb.inc(head.len() as u64);
        }
    }

    let mut buffer = vec![0u8; 128 * 1024];
    loop {
        let n = input.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        written += feed(&mut stream, &buffer[..n], output)?;
        if let Some(pb) = pb {
            pb.inc(n as u64);
        }
    }

    if !stream.is_frame_complete() {
        anyhow::bail!("Input is truncated: the last frame is incomplete");
    }
    output.flush()?;
    Ok(written)
}

fn feed<W: Write>(stream: &mut StreamingDecompress, mut chunk: &[u8], output: &mut W) -> Result<u64> {
    let mut written = 0u64;
    while !chunk.is_empty() {
        let (decoded, consumed) = stream.decompress_with_pos(chunk)?;
        if consumed == 0 {
            anyhow::bail!("Decoder made no progress");
        }
        output.write_all(&decoded)?;
        written += decoded.len() as u64;
        chunk = &chunk[consumed..];
    }
    Ok(written)
}
