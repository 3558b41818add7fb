//! Archiving algorithms.
//!
//! Every format implements [`ArchivingAlgorithm`]. The concrete types only
//! decide which archiver and compressor streams to build; byte copying,
//! progress metering and interrupt polling live in [`shared`].

pub mod codec;
pub mod gzip;
pub mod shared;
pub mod tar;
pub mod zip;

use std::path::Path;
use std::path::PathBuf;

use crate::ArchiveDescriptor;
use crate::ArchiveFormat;
use crate::CompressionLevel;
use crate::InterruptFlag;
use crate::ProgressCallback;
use crate::Result;

pub use shared::AlgorithmState;

/// Compress/extract contract shared by all formats.
///
/// An instance is single-use: it carries the compression level, the
/// interrupt flag and the progress state of one run.
pub trait ArchivingAlgorithm: Send {
    /// Format implemented by this instance.
    fn format(&self) -> ArchiveFormat;

    /// Shared per-run state.
    fn state(&self) -> &AlgorithmState;

    /// Shared per-run state, mutably.
    fn state_mut(&mut self) -> &mut AlgorithmState;

    /// Writes `files` into a new archive `location/name`.
    ///
    /// Directories are added recursively with their relative structure.
    /// The output directory is created if absent.
    ///
    /// # Errors
    ///
    /// Returns an I/O error, [`ArchiveError::Interrupted`](crate::ArchiveError)
    /// after an interrupt request, or a format error.
    fn compress(&mut self, files: &[PathBuf], location: &Path, name: &str) -> Result<()>;

    /// Extracts the archive `location/name` into `location`.
    ///
    /// An absolute `name` is read from that path instead.
    ///
    /// # Errors
    ///
    /// Returns a format error if the archive does not match this format,
    /// an I/O error, or [`ArchiveError::Interrupted`](crate::ArchiveError).
    fn extract(&mut self, location: &Path, name: &str) -> Result<()>;

    /// Requests cooperative cancellation. Idempotent and non-blocking.
    fn interrupt(&self) {
        self.state().interrupt_flag().interrupt();
    }

    /// Returns a handle to this instance's interrupt flag.
    fn interrupt_flag(&self) -> InterruptFlag {
        self.state().interrupt_flag().clone()
    }

    /// Sets the compression level used by the next compress call.
    fn set_compression_level(&mut self, level: CompressionLevel) {
        self.state_mut().set_level(level);
    }

    /// Installs the progress callback.
    fn set_progress_callback(&mut self, callback: Box<dyn ProgressCallback>) {
        self.state_mut().set_progress_callback(callback);
    }

    /// Compresses using every parameter of `descriptor`, including its level.
    fn compress_descriptor(&mut self, descriptor: &ArchiveDescriptor) -> Result<()> {
        self.set_compression_level(descriptor.level());
        self.compress(
            descriptor.files(),
            descriptor.output_dir(),
            descriptor.archive_name(),
        )
    }

    /// Extracts using the location and name of `descriptor`.
    fn extract_descriptor(&mut self, descriptor: &ArchiveDescriptor) -> Result<()> {
        self.extract(descriptor.output_dir(), descriptor.archive_name())
    }
}
