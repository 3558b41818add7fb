//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "archivist")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compress files and directories into a new archive
    Compress(CompressArgs),
    /// Extract archive contents
    Extract(ExtractArgs),
    /// List supported archive formats
    Formats,
}

#[derive(clap::Args)]
pub struct CompressArgs {
    /// Output archive path; the format's extension is appended if missing
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Source files or directories to archive
    #[arg(value_name = "SOURCE", required = true)]
    pub sources: Vec<PathBuf>,

    /// Archive format (e.g. zip, jar, gzip, targz, tarbz2, tarlz);
    /// detected from OUTPUT when omitted
    #[arg(short = 'f', long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Compression level (-1 for the codec default, 0-9)
    #[arg(
        short = 'l',
        long,
        default_value_t = -1,
        allow_negative_numbers = true,
        value_name = "LEVEL"
    )]
    pub level: i32,

    /// Write to a temporary file and rename it into place on success
    #[arg(long)]
    pub atomic: bool,

    /// Do not store file permissions in the archive
    #[arg(long)]
    pub no_permissions: bool,

    /// I/O chunk size with optional K/M suffix
    #[arg(long, value_parser = parse_byte_size, value_name = "SIZE")]
    pub chunk_size: Option<u64>,
}

#[derive(clap::Args)]
pub struct ExtractArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Output directory (default: current directory)
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Archive format; detected from the archive name when omitted. The
    /// name must end with one of the format's extensions
    #[arg(short = 'f', long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Do not restore file permissions from the archive
    #[arg(long)]
    pub no_permissions: bool,

    /// I/O chunk size with optional K/M suffix
    #[arg(long, value_parser = parse_byte_size, value_name = "SIZE")]
    pub chunk_size: Option<u64>,
}

/// Parse byte size with optional suffix (K, M, G)
#[allow(clippy::option_if_let_else)]
fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty byte size".to_string());
    }

    let (num_str, multiplier) = if let Some(stripped) = s.strip_suffix('G') {
        (stripped, 1024_u64.pow(3))
    } else if let Some(stripped) = s.strip_suffix('M') {
        (stripped, 1024_u64.pow(2))
    } else if let Some(stripped) = s.strip_suffix('K') {
        (stripped, 1024)
    } else {
        (s, 1)
    };

    let size = num_str
        .parse::<u64>()
        .map_err(|_| format!("invalid byte size: {s}"))
        .and_then(|n| {
            n.checked_mul(multiplier)
                .ok_or_else(|| format!("byte size overflow: {s}"))
        })?;

    if size == 0 {
        Err("chunk size must be at least 1 byte".to_string())
    } else {
        Ok(size)
    }
}
