//! ZIP and JAR archives.
//!
//! Both formats share the same container; they differ only in extension.
//! Level 0 stores entries uncompressed, every other level deflates.

use std::fs;
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;

use zip::CompressionMethod;
use zip::ZipArchive;
use zip::ZipWriter;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;

use super::ArchivingAlgorithm;
use super::shared::AlgorithmState;
use super::shared::OutputTarget;
use super::shared::collect_entries;
use super::shared::copy_chunked;
use super::shared::entry_name;
use super::shared::interrupted_or;
use super::shared::set_mode;
use crate::ArchiveError;
use crate::ArchiveFormat;
use crate::CompressionLevel;
use crate::InterruptFlag;
use crate::OperationConfig;
use crate::Result;

/// ZIP-family archiver.
#[derive(Debug)]
pub struct ZipAlgorithm {
    format: ArchiveFormat,
    state: AlgorithmState,
}

impl ZipAlgorithm {
    /// Creates a fresh instance for [`ArchiveFormat::Zip`] or
    /// [`ArchiveFormat::Jar`].
    #[must_use]
    pub fn new(format: ArchiveFormat, config: OperationConfig) -> Self {
        Self {
            format,
            state: AlgorithmState::new(config),
        }
    }

    fn file_options(level: CompressionLevel) -> SimpleFileOptions {
        if level == CompressionLevel::NONE {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        } else {
            SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(level.to_zip())
        }
    }

    fn zip_error(&self, err: ZipError) -> ArchiveError {
        zip_error(&self.state.flag, self.format, err)
    }
}

fn zip_error(flag: &InterruptFlag, format: ArchiveFormat, err: ZipError) -> ArchiveError {
    match err {
        ZipError::Io(e) => entry_read_error(flag, format, e),
        other => ArchiveError::InvalidArchive {
            format,
            reason: other.to_string(),
        },
    }
}

/// Truncated or corrupt entry data surfaces from the zip reader as I/O
/// errors of these kinds.
fn entry_read_error(flag: &InterruptFlag, format: ArchiveFormat, err: io::Error) -> ArchiveError {
    interrupted_or(flag, err, |e| match e.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput | io::ErrorKind::UnexpectedEof => {
            ArchiveError::InvalidArchive {
                format,
                reason: e.to_string(),
            }
        }
        _ => ArchiveError::Io(e),
    })
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

impl ArchivingAlgorithm for ZipAlgorithm {
    fn format(&self) -> ArchiveFormat {
        self.format
    }

    fn state(&self) -> &AlgorithmState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AlgorithmState {
        &mut self.state
    }

    fn compress(&mut self, files: &[PathBuf], location: &Path, name: &str) -> Result<()> {
        self.state.init_progress(files)?;
        let entries = collect_entries(files, &self.state.flag)?;
        let options = Self::file_options(self.state.level);
        log::debug!(
            "writing {} entries to {} archive {name} (level {})",
            entries.len(),
            self.format.display_name(),
            self.state.level
        );

        let (target, file) =
            OutputTarget::create(location, name, self.state.config.atomic_output)?;
        let mut zip = ZipWriter::new(file);

        for entry in &entries {
            self.state.check_interrupt()?;
            self.state.tracker.entry(&entry.archive_path);
            let archive_name = entry_name(&entry.archive_path);
            let metadata = fs::metadata(&entry.path)?;
            let options = if self.state.config.preserve_permissions {
                options.unix_permissions(file_mode(&metadata))
            } else {
                options
            };

            if entry.is_dir {
                zip.add_directory(format!("{archive_name}/"), options)
                    .map_err(|e| self.zip_error(e))?;
            } else {
                zip.start_file(archive_name, options)
                    .map_err(|e| self.zip_error(e))?;
                let mut source = File::open(&entry.path)?;
                self.state.copy(&mut source, &mut zip)?;
            }
        }

        let file = zip.finish().map_err(|e| self.zip_error(e))?;
        file.sync_all()?;
        drop(file);
        target.commit()?;
        self.state.tracker.complete();
        Ok(())
    }

    fn extract(&mut self, location: &Path, name: &str) -> Result<()> {
        let path = location.join(name);
        let file = File::open(&path)?;
        let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|e| self.zip_error(e))?;
        fs::create_dir_all(location)?;

        let mut total: u64 = 0;
        for index in 0..archive.len() {
            let entry = archive.by_index_raw(index).map_err(|e| self.zip_error(e))?;
            total = total.saturating_add(entry.size());
        }
        self.state.init_progress_total(total);
        log::debug!(
            "extracting {} entries ({total} bytes) from {}",
            archive.len(),
            path.display()
        );

        let format = self.format;
        let preserve_permissions = self.state.config.preserve_permissions;
        let mut buffer = vec![0u8; self.state.config.chunk_size];
        let tracker = &mut self.state.tracker;
        let flag = &self.state.flag;

        for index in 0..archive.len() {
            flag.check()?;
            let mut entry = archive
                .by_index(index)
                .map_err(|e| zip_error(flag, format, e))?;
            let relative = entry
                .enclosed_name()
                .ok_or_else(|| ArchiveError::InvalidArchive {
                    format,
                    reason: format!("entry escapes the output directory: {}", entry.name()),
                })?;
            let target = location.join(&relative);
            tracker.entry(&relative);

            if entry.is_dir() {
                fs::create_dir_all(&target)?;
            } else {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut out = File::create(&target)?;
                copy_chunked(
                    &mut entry,
                    &mut out,
                    &mut buffer,
                    flag,
                    |n| tracker.advance(n),
                    |e| entry_read_error(flag, format, e),
                )?;
            }

            if preserve_permissions && let Some(mode) = entry.unix_mode() {
                set_mode(&target, mode)?;
            }
        }

        tracker.complete();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn fixture(root: &Path) -> Vec<PathBuf> {
        let dir = root.join("site");
        fs::create_dir_all(dir.join("assets/empty")).unwrap();
        fs::write(dir.join("index.html"), "<html></html>").unwrap();
        fs::write(dir.join("assets/logo.bin"), vec![3u8; 4096]).unwrap();
        fs::write(root.join("notes.txt"), "notes").unwrap();
        vec![dir, root.join("notes.txt")]
    }

    #[test]
    fn test_roundtrip_preserves_structure() {
        let temp = TempDir::new().unwrap();
        let files = fixture(temp.path());
        let out = temp.path().join("out");

        let mut algo = ZipAlgorithm::new(ArchiveFormat::Zip, OperationConfig::default());
        algo.compress(&files, &out, "bundle.zip").unwrap();

        let mut algo = ZipAlgorithm::new(ArchiveFormat::Zip, OperationConfig::default());
        algo.extract(&out, "bundle.zip").unwrap();

        assert_eq!(
            fs::read_to_string(out.join("site/index.html")).unwrap(),
            "<html></html>"
        );
        assert_eq!(
            fs::read(out.join("site/assets/logo.bin")).unwrap(),
            vec![3u8; 4096]
        );
        assert!(out.join("site/assets/empty").is_dir());
        assert_eq!(fs::read_to_string(out.join("notes.txt")).unwrap(), "notes");
    }

    #[test]
    fn test_entry_names_use_forward_slashes() {
        let temp = TempDir::new().unwrap();
        let files = fixture(temp.path());
        let mut algo = ZipAlgorithm::new(ArchiveFormat::Jar, OperationConfig::default());
        algo.compress(&files, temp.path(), "lib.jar").unwrap();

        let archive = ZipArchive::new(File::open(temp.path().join("lib.jar")).unwrap()).unwrap();
        let names: Vec<_> = archive.file_names().map(str::to_string).collect();
        assert!(names.contains(&"site/".to_string()));
        assert!(names.contains(&"site/assets/logo.bin".to_string()));
        assert!(names.iter().all(|n| !n.contains('\\')));
    }

    #[test]
    fn test_level_zero_stores_entries() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("data.txt");
        fs::write(&input, "a".repeat(10_000)).unwrap();

        let mut algo = ZipAlgorithm::new(ArchiveFormat::Zip, OperationConfig::default());
        algo.set_compression_level(CompressionLevel::NONE);
        algo.compress(&[input], temp.path(), "stored.zip").unwrap();

        let mut archive =
            ZipArchive::new(File::open(temp.path().join("stored.zip")).unwrap()).unwrap();
        let entry = archive.by_name("data.txt").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Stored);
    }

    #[test]
    fn test_not_a_zip_is_format_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("fake.zip"), "definitely not a zip").unwrap();
        let mut algo = ZipAlgorithm::new(ArchiveFormat::Zip, OperationConfig::default());
        let err = algo.extract(temp.path(), "fake.zip").unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidArchive { format: ArchiveFormat::Zip, .. }));
    }

    #[test]
    fn test_traversal_entry_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("evil.zip");
        let mut zip = ZipWriter::new(File::create(&path).unwrap());
        zip.start_file("../escape.txt", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"gotcha").unwrap();
        zip.finish().unwrap();

        let out = temp.path().join("out");
        fs::create_dir_all(&out).unwrap();
        fs::copy(&path, out.join("evil.zip")).unwrap();

        let mut algo = ZipAlgorithm::new(ArchiveFormat::Zip, OperationConfig::default());
        let err = algo.extract(&out, "evil.zip").unwrap_err();
        assert!(err.is_format_error());
        assert!(!temp.path().join("escape.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_roundtrip() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let script = temp.path().join("tool.sh");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let out = temp.path().join("out");
        let mut algo = ZipAlgorithm::new(ArchiveFormat::Zip, OperationConfig::default());
        algo.compress(&[script], &out, "t.zip").unwrap();
        let mut algo = ZipAlgorithm::new(ArchiveFormat::Zip, OperationConfig::default());
        algo.extract(&out, "t.zip").unwrap();

        let mode = fs::metadata(out.join("tool.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
