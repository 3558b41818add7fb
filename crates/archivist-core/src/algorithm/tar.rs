//! Tar archives wrapped in a gzip, bzip2 or LZMA compressor stream.

use std::fs;
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;

use tar::Archive;
use tar::Builder;
use tar::Header;
use tar::HeaderMode;

use super::ArchivingAlgorithm;
use super::codec::Codec;
use super::shared::AlgorithmState;
use super::shared::MeteredReader;
use super::shared::OutputTarget;
use super::shared::SourceEntry;
use super::shared::collect_entries;
use super::shared::interrupted_or;
use crate::ArchiveError;
use crate::ArchiveFormat;
use crate::InterruptFlag;
use crate::OperationConfig;
use crate::Result;

/// Tar archiver over a compressor stream.
#[derive(Debug)]
pub struct TarAlgorithm {
    codec: Codec,
    state: AlgorithmState,
}

impl TarAlgorithm {
    /// Creates a fresh instance for `codec`.
    #[must_use]
    pub fn new(codec: Codec, config: OperationConfig) -> Self {
        Self {
            codec,
            state: AlgorithmState::new(config),
        }
    }

    fn header_mode(&self) -> HeaderMode {
        if self.state.config.preserve_permissions {
            HeaderMode::Complete
        } else {
            HeaderMode::Deterministic
        }
    }

    fn append_entry<W: io::Write>(
        &mut self,
        builder: &mut Builder<W>,
        entry: &SourceEntry,
    ) -> Result<()> {
        self.state.check_interrupt()?;
        self.state.tracker.entry(&entry.archive_path);

        if entry.is_dir {
            builder
                .append_dir(&entry.archive_path, &entry.path)
                .map_err(|e| self.state.io_error(e))?;
            return Ok(());
        }

        let file = File::open(&entry.path)?;
        let metadata = file.metadata()?;
        let mut header = Header::new_gnu();
        header.set_metadata_in_mode(&metadata, self.header_mode());
        header.set_size(metadata.len());

        let AlgorithmState { tracker, flag, .. } = &mut self.state;
        let reader = MeteredReader::new(file, tracker, flag.clone());
        builder
            .append_data(&mut header, &entry.archive_path, reader)
            .map_err(|e| interrupted_or(flag, e, ArchiveError::Io))
    }
}

/// Maps a failure while reading tar headers or entry data.
///
/// The tar crate reports malformed headers as `Other` errors; those are
/// archive-level format errors. Codec failures go through
/// [`ArchiveError::from_decoder`].
fn read_error(
    flag: &InterruptFlag,
    format: ArchiveFormat,
    codec: Codec,
    err: io::Error,
) -> ArchiveError {
    interrupted_or(flag, err, |e| {
        if e.kind() == io::ErrorKind::Other {
            ArchiveError::InvalidArchive {
                format,
                reason: e.to_string(),
            }
        } else {
            ArchiveError::from_decoder(codec.name(), e)
        }
    })
}

impl ArchivingAlgorithm for TarAlgorithm {
    fn format(&self) -> ArchiveFormat {
        match self.codec {
            Codec::Gzip => ArchiveFormat::TarGz,
            Codec::Bzip2 => ArchiveFormat::TarBz2,
            Codec::Lzma => ArchiveFormat::TarLz,
        }
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
        log::debug!(
            "writing {} entries to {} archive {name}",
            entries.len(),
            self.format().display_name()
        );

        let (target, file) =
            OutputTarget::create(location, name, self.state.config.atomic_output)?;
        let encoder = self.codec.encoder(file, self.state.level)?;
        let mut builder = Builder::new(encoder);
        builder.mode(self.header_mode());

        for entry in &entries {
            self.append_entry(&mut builder, entry)?;
        }

        let encoder = builder.into_inner().map_err(|e| self.state.io_error(e))?;
        let file = encoder.finish_stream().map_err(|e| self.state.io_error(e))?;
        file.sync_all()?;
        drop(file);
        target.commit()?;
        self.state.tracker.complete();
        Ok(())
    }

    fn extract(&mut self, location: &Path, name: &str) -> Result<()> {
        let path = location.join(name);
        let mut file = File::open(&path)?;
        self.codec.check_header(&mut file)?;
        let total = file.metadata()?.len();
        fs::create_dir_all(location)?;
        self.state.init_progress_total(total);

        let codec = self.codec;
        let format = self.format();
        let flag = self.state.flag.clone();
        let preserve_permissions = self.state.config.preserve_permissions;
        let on_read = |e: io::Error| read_error(&flag, format, codec, e);
        let on_unpack = |e: io::Error| {
            interrupted_or(&flag, e, |e| ArchiveError::from_decoder(codec.name(), e))
        };

        {
            let reader = MeteredReader::new(
                BufReader::new(file),
                &mut self.state.tracker,
                flag.clone(),
            );
            let mut archive = Archive::new(codec.decoder(reader)?);
            archive.set_preserve_permissions(preserve_permissions);
            archive.set_preserve_mtime(preserve_permissions);
            archive.set_overwrite(true);

            let mut count = 0usize;
            for entry in archive.entries().map_err(on_read)? {
                flag.check()?;
                let mut entry = entry.map_err(on_read)?;
                let entry_path = entry.path().map_err(on_read)?.into_owned();
                log::trace!("extracting {}", entry_path.display());
                if !entry.unpack_in(location).map_err(on_unpack)? {
                    return Err(ArchiveError::InvalidArchive {
                        format,
                        reason: format!(
                            "entry escapes the output directory: {}",
                            entry_path.display()
                        ),
                    });
                }
                count += 1;
            }
            log::debug!("extracted {count} entries from {}", path.display());
        }

        self.state.tracker.complete();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::CompressionLevel;
    use crate::ProgressCallback;
    use std::sync::Arc;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<u8>>>);

    impl ProgressCallback for Recorder {
        fn on_progress(&mut self, percent: u8) {
            self.0.lock().unwrap().push(percent);
        }
    }

    fn fixture(root: &Path) -> Vec<PathBuf> {
        let dir = root.join("docs");
        fs::create_dir_all(dir.join("nested/empty")).unwrap();
        fs::write(dir.join("readme.txt"), "hello tar").unwrap();
        fs::write(dir.join("nested/data.bin"), vec![42u8; 10_000]).unwrap();
        fs::write(root.join("top.txt"), "top level").unwrap();
        vec![dir, root.join("top.txt")]
    }

    #[test]
    fn test_roundtrip_every_codec() {
        for codec in [Codec::Gzip, Codec::Bzip2, Codec::Lzma] {
            let temp = TempDir::new().unwrap();
            let files = fixture(temp.path());
            let out = temp.path().join("out");
            let name = TarAlgorithm::new(codec, OperationConfig::default())
                .format()
                .with_extension("bundle");

            let mut algo = TarAlgorithm::new(codec, OperationConfig::default());
            algo.set_compression_level(CompressionLevel::BEST);
            algo.compress(&files, &out, &name).unwrap();

            let restored = temp.path().join("restored");
            fs::create_dir_all(&restored).unwrap();
            fs::copy(out.join(&name), restored.join(&name)).unwrap();

            let mut algo = TarAlgorithm::new(codec, OperationConfig::default());
            algo.extract(&restored, &name).unwrap();

            assert_eq!(
                fs::read_to_string(restored.join("docs/readme.txt")).unwrap(),
                "hello tar"
            );
            assert_eq!(
                fs::read(restored.join("docs/nested/data.bin")).unwrap(),
                vec![42u8; 10_000]
            );
            assert!(restored.join("docs/nested/empty").is_dir());
            assert_eq!(
                fs::read_to_string(restored.join("top.txt")).unwrap(),
                "top level"
            );
        }
    }

    #[test]
    fn test_wrong_codec_is_format_error() {
        let temp = TempDir::new().unwrap();
        let files = fixture(temp.path());
        let mut algo = TarAlgorithm::new(Codec::Gzip, OperationConfig::default());
        algo.compress(&files, temp.path(), "a.tar.gz").unwrap();
        fs::rename(temp.path().join("a.tar.gz"), temp.path().join("a.tar.bz2")).unwrap();

        let mut algo = TarAlgorithm::new(Codec::Bzip2, OperationConfig::default());
        let err = algo.extract(temp.path(), "a.tar.bz2").unwrap_err();
        assert!(err.is_format_error(), "{err:?}");
    }

    #[test]
    fn test_corrupt_payload_is_format_error() {
        let temp = TempDir::new().unwrap();
        let mut bytes = vec![0x1f, 0x8b, 0x08, 0x00];
        bytes.extend_from_slice(&[0xff; 64]);
        fs::write(temp.path().join("bad.tar.gz"), bytes).unwrap();

        let mut algo = TarAlgorithm::new(Codec::Gzip, OperationConfig::default());
        let err = algo.extract(temp.path(), "bad.tar.gz").unwrap_err();
        assert!(err.is_format_error(), "{err:?}");
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let temp = TempDir::new().unwrap();
        let mut algo = TarAlgorithm::new(Codec::Gzip, OperationConfig::default());
        let err = algo
            .compress(&[temp.path().join("missing")], temp.path(), "a.tar.gz")
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Io(_)));
    }

    #[test]
    fn test_interrupt_before_run_stops_compress() {
        let temp = TempDir::new().unwrap();
        let files = fixture(temp.path());
        let mut algo = TarAlgorithm::new(Codec::Gzip, OperationConfig::default());
        algo.interrupt();
        let err = algo.compress(&files, temp.path(), "a.tar.gz").unwrap_err();
        assert!(matches!(err, ArchiveError::Interrupted));
    }

    #[test]
    fn test_atomic_output_leaves_nothing_on_interrupt() {
        let temp = TempDir::new().unwrap();
        let files = fixture(temp.path());
        let out = temp.path().join("out");
        let config = OperationConfig::default().with_atomic_output(true);
        let mut algo = TarAlgorithm::new(Codec::Gzip, config);
        algo.interrupt();
        assert!(algo.compress(&files, &out, "a.tar.gz").is_err());
        assert!(!out.join("a.tar.gz").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let script = temp.path().join("run.sh");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o750)).unwrap();

        let mut algo = TarAlgorithm::new(Codec::Gzip, OperationConfig::default());
        algo.compress(&[script], &temp.path().join("a"), "s.tar.gz")
            .unwrap();
        let mut algo = TarAlgorithm::new(Codec::Gzip, OperationConfig::default());
        algo.extract(&temp.path().join("a"), "s.tar.gz").unwrap();

        let mode = fs::metadata(temp.path().join("a/run.sh"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o750);
    }

    #[test]
    fn test_extract_holds_hundred_until_unpacked() {
        for codec in [Codec::Gzip, Codec::Bzip2, Codec::Lzma] {
            let temp = TempDir::new().unwrap();
            let input = temp.path().join("big.txt");
            fs::write(&input, "compressible line\n".repeat(250_000)).unwrap();
            let name = TarAlgorithm::new(codec, OperationConfig::default())
                .format()
                .with_extension("big");
            let mut algo = TarAlgorithm::new(codec, OperationConfig::default());
            algo.compress(&[input], temp.path(), &name).unwrap();

            let recorder = Recorder::default();
            let out = temp.path().join("out");
            let mut algo = TarAlgorithm::new(codec, OperationConfig::default());
            algo.set_progress_callback(Box::new(recorder.clone()));
            algo.extract(&out, &temp.path().join(&name).to_string_lossy())
                .unwrap();

            let seen = recorder.0.lock().unwrap().clone();
            let (last, earlier) = seen.split_last().unwrap();
            assert_eq!(*last, 100, "{codec:?}: {seen:?}");
            assert!(earlier.iter().all(|p| *p < 100), "{codec:?}: {seen:?}");
            assert_eq!(fs::metadata(out.join("big.txt")).unwrap().len(), 4_500_000);
        }
    }
}
