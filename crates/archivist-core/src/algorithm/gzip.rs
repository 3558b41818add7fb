//! Single-file gzip streams.
//!
//! The original file name travels in the gzip header (`FNAME`). On
//! extraction it is restored as a bare file name; streams without one fall
//! back to the archive name minus its extension.

use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use flate2::GzBuilder;
use flate2::read::GzDecoder;

use super::ArchivingAlgorithm;
use super::codec::Codec;
use super::shared::AlgorithmState;
use super::shared::OutputTarget;
use super::shared::copy_chunked;
use super::shared::interrupted_or;
use crate::ArchiveError;
use crate::ArchiveFormat;
use crate::OperationConfig;
use crate::Result;

/// Suffix for extracted files whose name cannot be derived otherwise.
const FALLBACK_SUFFIX: &str = ".out";

/// Smallest gzip stream: 10-byte header plus 8-byte trailer.
const MIN_STREAM_LEN: u64 = 18;

/// Gzip compressor for exactly one regular file.
#[derive(Debug)]
pub struct GzipAlgorithm {
    state: AlgorithmState,
}

impl GzipAlgorithm {
    /// Creates a fresh instance.
    #[must_use]
    pub fn new(config: OperationConfig) -> Self {
        Self {
            state: AlgorithmState::new(config),
        }
    }

    /// Output name used when the stream carries no file name.
    fn fallback_name(archive_name: &str) -> String {
        let base = Path::new(archive_name)
            .file_name()
            .map_or_else(|| archive_name.to_string(), |n| n.to_string_lossy().into_owned());
        ArchiveFormat::Gzip
            .strip_extension(&base)
            .map_or_else(|| format!("{base}{FALLBACK_SUFFIX}"), str::to_string)
    }
}

/// Reduces a header file name to a safe bare name.
fn header_file_name(raw: &[u8]) -> Option<String> {
    let name = String::from_utf8_lossy(raw);
    let base = Path::new(name.as_ref()).file_name()?.to_string_lossy().into_owned();
    (!base.is_empty()).then_some(base)
}

impl ArchivingAlgorithm for GzipAlgorithm {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Gzip
    }

    fn state(&self) -> &AlgorithmState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AlgorithmState {
        &mut self.state
    }

    fn compress(&mut self, files: &[PathBuf], location: &Path, name: &str) -> Result<()> {
        let [input] = files else {
            return Err(ArchiveError::SingleFileExpected {
                format: ArchiveFormat::Gzip,
                count: files.len(),
            });
        };
        let metadata = fs::metadata(input)?;
        if metadata.is_dir() {
            return Err(ArchiveError::InvalidArchive {
                format: ArchiveFormat::Gzip,
                reason: format!("cannot compress directory {}", input.display()),
            });
        }
        self.state.init_progress(files)?;
        self.state.check_interrupt()?;

        let mut builder = GzBuilder::new();
        if let Some(file_name) = input.file_name() {
            builder = builder.filename(file_name.to_string_lossy().into_owned());
        }
        if let Some(mtime) = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .and_then(|d| u32::try_from(d.as_secs()).ok())
        {
            builder = builder.mtime(mtime);
        }

        let (target, file) =
            OutputTarget::create(location, name, self.state.config.atomic_output)?;
        let mut encoder = builder.write(file, self.state.level.to_flate2());
        self.state.tracker.entry(input);
        let mut source = File::open(input)?;
        self.state.copy(&mut source, &mut encoder)?;

        let file = encoder.finish().map_err(|e| self.state.io_error(e))?;
        file.sync_all()?;
        drop(file);
        target.commit()?;
        self.state.tracker.complete();
        Ok(())
    }

    fn extract(&mut self, location: &Path, name: &str) -> Result<()> {
        let path = location.join(name);
        let mut file = File::open(&path)?;
        Codec::Gzip.check_header(&mut file)?;
        let total = uncompressed_size(&mut file)?;
        fs::create_dir_all(location)?;
        self.state.init_progress_total(total);

        let flag = self.state.flag.clone();
        let mut buffer = vec![0u8; self.state.config.chunk_size];
        let mut decoder = GzDecoder::new(BufReader::new(file));
        let target = decoder
            .header()
            .and_then(|h| h.filename())
            .and_then(header_file_name)
            .map(|output_name| location.join(output_name))
            .filter(|target| !same_file(target, &path))
            .unwrap_or_else(|| location.join(Self::fallback_name(name)));
        log::debug!("decompressing {} into {}", path.display(), target.display());

        self.state.tracker.entry(&target);
        let mut out = File::create(&target)?;
        let tracker = &mut self.state.tracker;
        copy_chunked(
            &mut decoder,
            &mut out,
            &mut buffer,
            &flag,
            |n| tracker.advance(n),
            |e| interrupted_or(&flag, e, |e| ArchiveError::from_decoder(Codec::Gzip.name(), e)),
        )?;

        self.state.tracker.complete();
        Ok(())
    }
}

/// Reads the uncompressed size (`ISIZE`, modulo 2^32) from the stream
/// trailer and rewinds. Falls back to the compressed size when the file is
/// too short to carry a trailer.
fn uncompressed_size(file: &mut File) -> Result<u64> {
    let len = file.metadata()?.len();
    if len < MIN_STREAM_LEN {
        return Ok(len);
    }
    let mut trailer = [0u8; 4];
    file.seek(SeekFrom::End(-4))?;
    file.read_exact(&mut trailer)?;
    file.rewind()?;
    Ok(u64::from(u32::from_le_bytes(trailer)))
}

/// Returns `true` if `a` and `b` name the same file on disk.
fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
