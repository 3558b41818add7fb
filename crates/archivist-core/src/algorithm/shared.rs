//! Behavior shared by every archiving algorithm.
//!
//! - [`AlgorithmState`]: level, interrupt flag, progress tracker and config
//!   of one run, with file listing and progress initialization
//! - [`MeteredReader`]: reader that polls the interrupt flag and feeds the
//!   progress tracker on every chunk
//! - [`copy_chunked`]: chunked copy polling the interrupt flag per chunk
//! - [`OutputTarget`]: archive output, optionally via temp-file-then-rename

use std::fs;
use std::fs::File;
use std::io;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::ArchiveError;
use crate::CompressionLevel;
use crate::InterruptFlag;
use crate::NoopProgress;
use crate::OperationConfig;
use crate::ProgressCallback;
use crate::Result;
use crate::progress::ProgressTracker;

/// Message carried by the I/O error a [`MeteredReader`] raises on interrupt.
const INTERRUPTED_MESSAGE: &str = "operation interrupted";

/// Per-run state owned by every algorithm instance.
#[derive(Debug)]
pub struct AlgorithmState {
    pub(crate) level: CompressionLevel,
    pub(crate) flag: InterruptFlag,
    pub(crate) tracker: ProgressTracker,
    pub(crate) config: OperationConfig,
}

impl AlgorithmState {
    /// Creates fresh state with its own interrupt flag and progress tracker.
    #[must_use]
    pub fn new(config: OperationConfig) -> Self {
        Self {
            level: CompressionLevel::DEFAULT,
            flag: InterruptFlag::new(),
            tracker: ProgressTracker::new(Box::new(NoopProgress)),
            config,
        }
    }

    /// Compression level for the next compress call.
    #[must_use]
    pub const fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Sets the compression level.
    pub fn set_level(&mut self, level: CompressionLevel) {
        self.level = level;
    }

    /// This run's interrupt flag.
    #[must_use]
    pub const fn interrupt_flag(&self) -> &InterruptFlag {
        &self.flag
    }

    /// This run's configuration.
    #[must_use]
    pub const fn config(&self) -> &OperationConfig {
        &self.config
    }

    /// This run's progress tracker.
    #[must_use]
    pub const fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// Installs the progress callback.
    pub fn set_progress_callback(&mut self, callback: Box<dyn ProgressCallback>) {
        self.tracker.set_callback(callback);
    }

    /// Returns the immediate children of `dir`, sorted by name.
    pub fn list_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut children = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<Vec<_>>>()?;
        children.sort();
        Ok(children)
    }

    /// Resets progress to the total size of `files`.
    ///
    /// Directories contribute the recursive size of their contents.
    pub fn init_progress(&mut self, files: &[PathBuf]) -> Result<()> {
        let mut total: u64 = 0;
        for file in files {
            for entry in WalkDir::new(file).follow_links(true) {
                let entry = entry.map_err(|e| ArchiveError::Io(e.into()))?;
                if entry.file_type().is_file() {
                    let size = entry.metadata().map_err(|e| ArchiveError::Io(e.into()))?.len();
                    total = total.saturating_add(size);
                }
            }
        }
        log::debug!("progress initialized: {total} bytes in {} inputs", files.len());
        self.tracker.reset(total);
        Ok(())
    }

    /// Resets progress to an explicit total.
    pub fn init_progress_total(&mut self, total: u64) {
        self.tracker.reset(total);
    }

    /// Polls the interrupt flag.
    pub fn check_interrupt(&self) -> Result<()> {
        self.flag.check()
    }

    /// Converts an I/O error, attributing it to cancellation when an
    /// interrupt has been requested.
    #[must_use]
    pub fn io_error(&self, err: io::Error) -> ArchiveError {
        interrupted_or(&self.flag, err, ArchiveError::Io)
    }

    /// Copies `reader` into `writer` chunk by chunk, advancing progress by
    /// the bytes read and polling the interrupt flag before every chunk.
    pub fn copy<R, W>(&mut self, reader: &mut R, writer: &mut W) -> Result<u64>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let mut buffer = vec![0u8; self.config.chunk_size];
        let tracker = &mut self.tracker;
        copy_chunked(
            reader,
            writer,
            &mut buffer,
            &self.flag,
            |n| tracker.advance(n),
            ArchiveError::Io,
        )
    }
}

/// Maps `err` to [`ArchiveError::Interrupted`] if `flag` is set, otherwise
/// through `otherwise`.
pub(crate) fn interrupted_or(
    flag: &InterruptFlag,
    err: io::Error,
    otherwise: impl FnOnce(io::Error) -> ArchiveError,
) -> ArchiveError {
    if flag.is_interrupted() {
        log::debug!("I/O error after interrupt request: {err}");
        ArchiveError::Interrupted
    } else {
        otherwise(err)
    }
}

/// Chunked copy with interrupt polling.
///
/// `on_chunk` receives the size of every chunk read; `read_error` maps
/// read failures (decoders classify corrupt input there). Write failures
/// are always I/O errors.
pub(crate) fn copy_chunked<R, W>(
    reader: &mut R,
    writer: &mut W,
    buffer: &mut [u8],
    flag: &InterruptFlag,
    mut on_chunk: impl FnMut(u64),
    read_error: impl Fn(io::Error) -> ArchiveError,
) -> Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut total: u64 = 0;
    loop {
        flag.check()?;
        let bytes_read = match reader.read(buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(interrupted_or(flag, e, &read_error)),
        };
        writer
            .write_all(&buffer[..bytes_read])
            .map_err(|e| interrupted_or(flag, e, ArchiveError::Io))?;
        total = total.saturating_add(bytes_read as u64);
        on_chunk(bytes_read as u64);
    }
    Ok(total)
}

/// Reader that polls the interrupt flag and advances progress per read.
///
/// Used where a third-party stream (tar builder, decoder) drives the copy
/// loop. On interrupt it fails the read with an I/O error that
/// [`interrupted_or`] turns into [`ArchiveError::Interrupted`].
pub struct MeteredReader<'a, R> {
    inner: R,
    tracker: &'a mut ProgressTracker,
    flag: InterruptFlag,
}

impl<'a, R> MeteredReader<'a, R> {
    /// Wraps `inner`, reporting to `tracker` and polling `flag`.
    pub fn new(inner: R, tracker: &'a mut ProgressTracker, flag: InterruptFlag) -> Self {
        Self {
            inner,
            tracker,
            flag,
        }
    }
}

impl<R: Read> Read for MeteredReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.flag.is_interrupted() {
            return Err(io::Error::other(INTERRUPTED_MESSAGE));
        }
        let bytes_read = self.inner.read(buf)?;
        if bytes_read > 0 {
            self.tracker.advance(bytes_read as u64);
        }
        Ok(bytes_read)
    }
}

/// Destination of a new archive.
///
/// Without atomic output the archive is written in place and a failed run
/// leaves a partial file. With atomic output it is written to a temporary
/// file next to the destination and renamed on [`commit`](Self::commit);
/// dropping an uncommitted target removes the temporary file.
#[derive(Debug)]
pub struct OutputTarget {
    path: PathBuf,
    temp: Option<NamedTempFile>,
}

impl OutputTarget {
    /// Creates the output directory if absent and opens the archive file.
    pub fn create(location: &Path, name: &str, atomic: bool) -> Result<(Self, File)> {
        let path = location.join(name);
        let parent = path.parent().unwrap_or(location);
        fs::create_dir_all(parent)?;

        if atomic {
            let temp = NamedTempFile::new_in(parent)?;
            let file = temp.reopen()?;
            Ok((
                Self {
                    path,
                    temp: Some(temp),
                },
                file,
            ))
        } else {
            let file = File::create(&path)?;
            Ok((Self { path, temp: None }, file))
        }
    }

    /// Moves the archive into place (atomic mode) and finishes the target.
    pub fn commit(self) -> Result<PathBuf> {
        if let Some(temp) = self.temp {
            temp.persist(&self.path).map_err(|e| ArchiveError::Io(e.error))?;
        }
        Ok(self.path)
    }
}

/// One filesystem entry scheduled for an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Path on disk.
    pub path: PathBuf,
    /// Relative path inside the archive.
    pub archive_path: PathBuf,
    /// `true` for directories.
    pub is_dir: bool,
}

/// Expands `files` into archive entries, recursing into directories.
///
/// Each input keeps its own name as the top-level component, so
/// compressing `/data/photos` yields entries `photos/...`.
pub fn collect_entries(files: &[PathBuf], flag: &InterruptFlag) -> Result<Vec<SourceEntry>> {
    let mut entries = Vec::new();
    for file in files {
        let file = if file.file_name().is_none() {
            file.canonicalize()?
        } else {
            file.clone()
        };
        let root = file.file_name().map(PathBuf::from).unwrap_or_default();
        push_entry(&file, root, flag, &mut entries)?;
    }
    Ok(entries)
}

fn push_entry(
    path: &Path,
    archive_path: PathBuf,
    flag: &InterruptFlag,
    entries: &mut Vec<SourceEntry>,
) -> Result<()> {
    flag.check()?;
    let is_dir = fs::metadata(path)?.is_dir();
    if is_dir {
        let children = AlgorithmState::list_files(path)?;
        if !archive_path.as_os_str().is_empty() {
            entries.push(SourceEntry {
                path: path.to_path_buf(),
                archive_path: archive_path.clone(),
                is_dir,
            });
        }
        for child in children {
            let child_name = child.file_name().map(PathBuf::from).unwrap_or_default();
            push_entry(&child, archive_path.join(child_name), flag, entries)?;
        }
    } else {
        entries.push(SourceEntry {
            path: path.to_path_buf(),
            archive_path,
            is_dir,
        });
    }
    Ok(())
}

/// Converts an archive path to a `/`-separated entry name.
#[must_use]
pub fn entry_name(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Applies a Unix mode to an extracted file.
#[cfg(unix)]
pub(crate) fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
}

#[cfg(not(unix))]
pub(crate) fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;
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

    #[test]
    fn test_list_files_is_not_recursive() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.txt"), "b").unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("sub/c.txt"), "c").unwrap();

        let children = AlgorithmState::list_files(temp.path()).unwrap();
        let names: Vec<_> = children
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["a.txt", "b.txt", "sub"]);
    }

    #[test]
    fn test_init_progress_sums_recursively() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), vec![0u8; 100]).unwrap();
        fs::create_dir_all(temp.path().join("d/e")).unwrap();
        fs::write(temp.path().join("d/b.txt"), vec![0u8; 50]).unwrap();
        fs::write(temp.path().join("d/e/c.txt"), vec![0u8; 25]).unwrap();

        let mut state = AlgorithmState::new(OperationConfig::default());
        state
            .init_progress(&[temp.path().join("a.txt"), temp.path().join("d")])
            .unwrap();
        assert_eq!(state.tracker().meter().total_bytes(), 175);
    }

    #[test]
    fn test_copy_reports_progress_per_chunk() {
        let recorder = Recorder::default();
        let mut state = AlgorithmState::new(OperationConfig::default().with_chunk_size(10));
        state.set_progress_callback(Box::new(recorder.clone()));
        state.init_progress_total(100);

        let mut reader = Cursor::new(vec![7u8; 100]);
        let mut out = Vec::new();
        let copied = state.copy(&mut reader, &mut out).unwrap();

        assert_eq!(copied, 100);
        assert_eq!(out, vec![7u8; 100]);
        let seen = recorder.0.lock().unwrap().clone();
        assert_eq!(seen, [10, 20, 30, 40, 50, 60, 70, 80, 90, 99]);

        state.tracker.complete();
        assert_eq!(recorder.0.lock().unwrap().last(), Some(&100));
    }

    #[test]
    fn test_copy_stops_on_interrupt() {
        let mut state = AlgorithmState::new(OperationConfig::default().with_chunk_size(4));
        state.interrupt_flag().interrupt();
        let mut reader = Cursor::new(vec![1u8; 64]);
        let mut out = Vec::new();
        let result = state.copy(&mut reader, &mut out);
        assert!(matches!(result, Err(ArchiveError::Interrupted)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_metered_reader_interrupt() {
        let flag = InterruptFlag::new();
        let mut tracker = ProgressTracker::new(Box::new(NoopProgress));
        tracker.reset(8);
        let mut reader = MeteredReader::new(Cursor::new(vec![0u8; 8]), &mut tracker, flag.clone());
        let mut buf = [0u8; 4];
        assert_eq!(reader.read(&mut buf).unwrap(), 4);
        flag.interrupt();
        let err = reader.read(&mut buf).unwrap_err();
        assert!(matches!(
            interrupted_or(&flag, err, ArchiveError::Io),
            ArchiveError::Interrupted
        ));
        assert_eq!(tracker.meter().bytes_read(), 4);
    }

    #[test]
    fn test_collect_entries_preserves_structure() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("project");
        fs::create_dir_all(root.join("src/empty")).unwrap();
        fs::write(root.join("README"), "r").unwrap();
        fs::write(root.join("src/main.rs"), "m").unwrap();
        fs::write(temp.path().join("loose.txt"), "l").unwrap();

        let entries =
            collect_entries(&[root, temp.path().join("loose.txt")], &InterruptFlag::new())
                .unwrap();
        let names: Vec<_> = entries
            .iter()
            .map(|e| (entry_name(&e.archive_path), e.is_dir))
            .collect();
        assert_eq!(
            names,
            [
                ("project".to_string(), true),
                ("project/README".to_string(), false),
                ("project/src".to_string(), true),
                ("project/src/empty".to_string(), true),
                ("project/src/main.rs".to_string(), false),
                ("loose.txt".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_output_target_atomic_commit() {
        let temp = TempDir::new().unwrap();
        let out_dir = temp.path().join("nested/out");
        let (target, mut file) = OutputTarget::create(&out_dir, "a.bin", true).unwrap();
        file.write_all(b"data").unwrap();
        drop(file);
        assert!(!out_dir.join("a.bin").exists());
        let path = target.commit().unwrap();
        assert_eq!(fs::read(path).unwrap(), b"data");
    }

    #[test]
    fn test_output_target_atomic_drop_discards() {
        let temp = TempDir::new().unwrap();
        let (target, mut file) = OutputTarget::create(temp.path(), "a.bin", true).unwrap();
        file.write_all(b"partial").unwrap();
        drop(file);
        drop(target);
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }
}
