//! Archive descriptor: one immutable compress/extract request.

use std::path::Path;
use std::path::PathBuf;

use crate::ArchiveFormat;
use crate::CompressionLevel;
use crate::Result;

/// Describes one archive operation.
///
/// The archive name always carries one of the format's recognized
/// extensions: if the supplied name lacks one, the default extension is
/// appended exactly once (case-sensitive suffix check).
///
/// # Examples
///
/// ```
/// use archivist_core::{ArchiveDescriptor, ArchiveFormat};
///
/// # fn main() -> archivist_core::Result<()> {
/// let descriptor = ArchiveDescriptor::builder(ArchiveFormat::Zip, "out")
///     .level(9)?
///     .file("a.txt")
///     .file("b.txt")
///     .output_dir("/tmp")
///     .build();
///
/// assert_eq!(descriptor.archive_name(), "out.zip");
/// assert_eq!(descriptor.archive_path(), std::path::Path::new("/tmp/out.zip"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveDescriptor {
    format: ArchiveFormat,
    archive_name: String,
    level: CompressionLevel,
    files: Vec<PathBuf>,
    output_dir: PathBuf,
}

impl ArchiveDescriptor {
    /// Creates a descriptor, normalizing the archive name's extension.
    #[must_use]
    pub fn new(
        format: ArchiveFormat,
        archive_name: &str,
        level: CompressionLevel,
        files: Vec<PathBuf>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            format,
            archive_name: format.with_extension(archive_name),
            level,
            files,
            output_dir,
        }
    }

    /// Starts building a descriptor for `format` and `archive_name`.
    #[must_use]
    pub fn builder(format: ArchiveFormat, archive_name: &str) -> ArchiveDescriptorBuilder {
        ArchiveDescriptorBuilder {
            format,
            archive_name: archive_name.to_string(),
            level: CompressionLevel::DEFAULT,
            files: Vec::new(),
            output_dir: PathBuf::from("."),
        }
    }

    /// Archive format.
    #[must_use]
    pub const fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Archive file name including extension.
    #[must_use]
    pub fn archive_name(&self) -> &str {
        &self.archive_name
    }

    /// Compression level.
    #[must_use]
    pub const fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Input files, in order. May be empty for extraction.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Full path of the archive: `output_dir/archive_name`.
    #[must_use]
    pub fn archive_path(&self) -> PathBuf {
        self.output_dir.join(&self.archive_name)
    }
}

/// Builder for [`ArchiveDescriptor`].
#[derive(Debug, Clone)]
pub struct ArchiveDescriptorBuilder {
    format: ArchiveFormat,
    archive_name: String,
    level: CompressionLevel,
    files: Vec<PathBuf>,
    output_dir: PathBuf,
}

impl ArchiveDescriptorBuilder {
    /// Sets the compression level from a raw integer.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidCompressionLevel`](crate::ArchiveError)
    /// outside `-1..=9`.
    pub fn level(mut self, level: i32) -> Result<Self> {
        self.level = CompressionLevel::new(level)?;
        Ok(self)
    }

    /// Sets an already validated compression level.
    #[must_use]
    pub fn compression_level(mut self, level: CompressionLevel) -> Self {
        self.level = level;
        self
    }

    /// Appends one input file or directory.
    #[must_use]
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Appends several input files or directories.
    #[must_use]
    pub fn files<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.files.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Sets the output directory.
    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Builds the descriptor.
    #[must_use]
    pub fn build(self) -> ArchiveDescriptor {
        ArchiveDescriptor::new(
            self.format,
            &self.archive_name,
            self.level,
            self.files,
            self.output_dir,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_appended_once() {
        let d = ArchiveDescriptor::builder(ArchiveFormat::Zip, "out").build();
        assert_eq!(d.archive_name(), "out.zip");

        let d = ArchiveDescriptor::builder(ArchiveFormat::Zip, "out.zip").build();
        assert_eq!(d.archive_name(), "out.zip");

        let d = ArchiveDescriptor::builder(ArchiveFormat::Zip, "out.ZIP").build();
        assert_eq!(d.archive_name(), "out.ZIP.zip");
    }

    #[test]
    fn test_alternate_extension_kept() {
        let d = ArchiveDescriptor::builder(ArchiveFormat::TarBz2, "src.tbz2").build();
        assert_eq!(d.archive_name(), "src.tbz2");
    }

    #[test]
    fn test_level_validation() {
        for level in [-1, 0, 9] {
            let d = ArchiveDescriptor::builder(ArchiveFormat::Gzip, "x")
                .level(level)
                .unwrap()
                .build();
            assert_eq!(d.level().get(), level);
        }
        for level in [-2, 10] {
            assert!(
                ArchiveDescriptor::builder(ArchiveFormat::Gzip, "x")
                    .level(level)
                    .is_err()
            );
        }
    }

    #[test]
    fn test_builder_collects_files_in_order() {
        let d = ArchiveDescriptor::builder(ArchiveFormat::TarGz, "backup")
            .file("a")
            .files(["b", "c"])
            .output_dir("/out")
            .build();
        assert_eq!(
            d.files(),
            [PathBuf::from("a"), PathBuf::from("b"), PathBuf::from("c")]
        );
        assert_eq!(d.archive_path(), PathBuf::from("/out/backup.tar.gz"));
        assert!(d.level().is_default());
    }
}
