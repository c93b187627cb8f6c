// Copyright 2024 Karpeles Lab Inc.
// Zstandard streaming compression command-line tool

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zstream::{
    compress_frames_parallel, write_skippable_frame, CompressOptions, CompressionDictionary,
    StreamingCompress, StreamingDecompress, DEFAULT_LEVEL, MAX_MAGIC_VARIANT,
};

#[derive(Parser)]
#[command(name = "zsc")]
#[command(about = "Zstandard streaming compression tool", long_about = None)]
#[command(version)]
struct Args {
    /// Input files to compress
    #[arg(required = true)]
    files: Vec<String>,

    /// Write output to stdout (use with single file or -)
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Output file (use with single input file)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Compression level (negative values trade ratio for speed)
    #[arg(short = 'l', long, default_value_t = DEFAULT_LEVEL, allow_hyphen_values = true)]
    level: i32,

    /// Compress using this dictionary file
    #[arg(long)]
    dict: Option<PathBuf>,

    /// Prefix the output with a skippable frame holding this file's contents
    #[arg(long)]
    meta: Option<PathBuf>,

    /// Magic variant (0-15) for the metadata frame
    #[arg(long, default_value_t = 0)]
    meta_variant: u32,

    /// Flush the stream after every SIZE input bytes (e.g., 64K, 1M)
    #[arg(long)]
    flush_every: Option<String>,

    /// Compress as independent frames of SIZE bytes on all cores (loads into memory)
    #[arg(long)]
    frame_size: Option<String>,

    /// Do not overwrite existing files
    #[arg(long)]
    safe: bool,

    /// Delete source files after successful compression
    #[arg(long)]
    rm: bool,

    /// Quiet mode - don't print progress
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Verify written files by decompressing them
    #[arg(long)]
    verify: bool,
}

/// Settings shared by every input file
struct Job {
    dict: Option<Arc<CompressionDictionary>>,
    dict_bytes: Option<Vec<u8>>,
    meta: Option<Vec<u8>>,
    flush_every: Option<usize>,
    frame_size: Option<usize>,
}

impl Job {
    fn options(&self, args: &Args) -> CompressOptions {
        CompressOptions::new()
            .level(args.level)
            .dict(self.dict.clone())
    }

    fn write_meta<W: Write>(&self, args: &Args, output: &mut W) -> Result<()> {
        if let Some(ref meta) = self.meta {
            let header = write_skippable_frame(&[], meta, args.meta_variant)
                .context("Failed to build metadata frame")?;
            output.write_all(&header)?;
        }
        Ok(())
    }
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

    if args.meta_variant > MAX_MAGIC_VARIANT {
        anyhow::bail!("--meta-variant must be between 0 and {}", MAX_MAGIC_VARIANT);
    }

    if args.flush_every.is_some() && args.frame_size.is_some() {
        anyhow::bail!("Cannot use both --flush-every and --frame-size");
    }

    let job = load_job(&args)?;

    // Handle stdin/stdout case
    if args.files.len() == 1 && args.files[0] == "-" {
        let stdin = io::stdin();
        let stdout = io::stdout();
        return compress_stream(&mut stdin.lock(), &mut stdout.lock(), &args, &job, None);
    }

    // Compress each file
    for file in &args.files {
        compress_file(file, &args, &job)?;
    }

    Ok(())
}

fn load_job(args: &Args) -> Result<Job> {
    let (dict, dict_bytes) = match args.dict {
        Some(ref path) => {
            let bytes = fs::read(path)
                .with_context(|| format!("Failed to read dictionary: {}", path.display()))?;
            let dict = CompressionDictionary::new(&bytes, args.level)
                .with_context(|| format!("Invalid dictionary: {}", path.display()))?;
            log::debug!("loaded {:?} from {}", dict, path.display());
            (Some(Arc::new(dict)), Some(bytes))
        }
        None => (None, None),
    };

    let meta = match args.meta {
        Some(ref path) => Some(
            fs::read(path)
                .with_context(|| format!("Failed to read metadata: {}", path.display()))?,
        ),
        None => None,
    };

    let flush_every = match args.flush_every {
        Some(ref size) => Some(parse_size(size).context("Invalid flush size")?),
        None => None,
    };
    let frame_size = match args.frame_size {
        Some(ref size) => Some(parse_size(size).context("Invalid frame size")?),
        None => None,
    };

    Ok(Job {
        dict,
        dict_bytes,
        meta,
        flush_every,
        frame_size,
    })
}

fn compress_file(input_path: &str, args: &Args, job: &Job) -> Result<()> {
    let input = PathBuf::from(input_path);

    if !input.exists() {
        anyhow::bail!("File not found: {}", input_path);
    }

    if !input.is_file() {
        anyhow::bail!("Not a file: {}", input_path);
    }

    // Determine output path
    let output = if let Some(ref out) = args.output {
        out.clone()
    } else if args.stdout {
        PathBuf::from("-")
    } else {
        let mut name = input.as_os_str().to_owned();
        name.push(".zst");
        PathBuf::from(name)
    };

    // Check if output exists in safe mode
    if args.safe && output != Path::new("-") && output.exists() {
        anyhow::bail!("Output file already exists: {}", output.display());
    }

    // Get file size for progress bar
    let file_size = fs::metadata(&input)?.len();

    let pb = if !args.quiet && !args.stdout {
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

    if output == Path::new("-") {
        let stdout = io::stdout();
        let mut stdout_lock = stdout.lock();
        compress_stream(&mut input_file, &mut stdout_lock, args, job, pb.as_ref())?;
    } else {
        let mut output_file = File::create(&output)
            .with_context(|| format!("Failed to create output file: {}", output.display()))?;
        compress_stream(&mut input_file, &mut output_file, args, job, pb.as_ref())?;
        output_file.sync_all()?;
    }

    if let Some(pb) = pb {
        pb.finish_with_message("Done");
    }

    // Print compression stats
    if !args.quiet && !args.stdout {
        let output_size = if output != Path::new("-") {
            fs::metadata(&output)?.len()
        } else {
            0
        };

        if output_size > 0 && file_size > 0 {
            let ratio = (output_size as f64 / file_size as f64) * 100.0;
            println!(
                "{} -> {} ({:.2}%)",
                input.display(),
                output.display(),
                ratio
            );
        }
    }

    if args.verify && output != Path::new("-") {
        verify_compressed_file(&input, &output, job)?;
    }

    if args.rm && output != Path::new("-") {
        fs::remove_file(&input)
            .with_context(|| format!("Failed to remove source file: {}", input.display()))?;
    }

    Ok(())
}

fn compress_stream<R: Read, W: Write>(
    input: &mut R,
    output: &mut W,
    args: &Args,
    job: &Job,
    pb: Option<&ProgressBar>,
) -> Result<()> {
    job.write_meta(args, output)?;

    if let Some(frame_size) = job.frame_size {
        let mut data = Vec::new();
        input.read_to_end(&mut data)?;
        if let Some(pb) = pb {
            pb.set_position(data.len() as u64);
        }

        let compressed = compress_frames_parallel(&data, frame_size, &job.options(args))?;
        output.write_all(&compressed)?;
        output.flush()?;
        return Ok(());
    }

    let mut stream = StreamingCompress::with_options(job.options(args))?;
    let mut buffer = vec![0u8; 128 * 1024];
    let mut since_flush = 0;

    loop {
        let n = input.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        output.write_all(&stream.compress(&buffer[..n])?)?;

        if let Some(flush_every) = job.flush_every {
            since_flush += n;
            if since_flush >= flush_every {
                output.write_all(&stream.flush()?)?;
                output.flush()?;
                since_flush = 0;
            }
        }

        if let Some(pb) = pb {
            pb.inc(n as u64);
        }
    }

    output.write_all(&stream.finish()?)?;
    output.flush()?;
    Ok(())
}

fn verify_compressed_file(original: &Path, compressed: &Path, job: &Job) -> Result<()> {
    let original_data = fs::read(original).with_context(|| {
        format!(
            "Failed to open original file for verification: {}",
            original.display()
        )
    })?;
    let compressed_data = fs::read(compressed).with_context(|| {
        format!(
            "Failed to open compressed file for verification: {}",
            compressed.display()
        )
    })?;

    let mut stream = match job.dict_bytes {
        Some(ref dict) => StreamingDecompress::with_dictionary(dict)?,
        None => StreamingDecompress::new()?,
    };
    let decompressed_data = stream.decompress(&compressed_data).with_context(|| {
        format!(
            "Failed to decompress file for verification: {}",
            compressed.display()
        )
    })?;

    if !stream.is_frame_complete() {
        anyhow::bail!("Verification failed: {} is truncated", compressed.display());
    }

    if original_data != decompressed_data {
        anyhow::bail!(
            "Verification failed: decompressed data does not match original (original: {} bytes, decompressed: {} bytes)",
            original_data.len(),
            decompressed_data.len()
        );
    }

    Ok(())
}

fn parse_size(s: &str) -> Result<usize> {
    let s = s.trim().to_uppercase();

    let size = if let Some(num) = s.strip_suffix('K') {
        num.parse::<usize>()? * 1024
    } else if let Some(num) = s.strip_suffix('M') {
        num.parse::<usize>()? * 1024 * 1024
    } else {
        s.parse::<usize>().context("Invalid size format")?
    };

    if size == 0 {
        anyhow::bail!("Size must be greater than zero");
    }
    Ok(size)
}
