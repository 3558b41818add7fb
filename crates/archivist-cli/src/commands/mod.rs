//! Subcommand implementations.

pub mod compress;
pub mod extract;
pub mod formats;

use crate::error::Interrupted;
use crate::error::convert_error;
use crate::error::convert_failure;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Result;
use archivist_core::ArchiveFormat;
use archivist_core::ErrorClass;
use archivist_core::Operation;
use archivist_core::OperationConfig;
use std::thread;

/// Resolves the format from `--format` or, failing that, from `file_name`.
pub(crate) fn resolve_format(explicit: Option<&str>, file_name: &str) -> Result<ArchiveFormat> {
    match explicit {
        Some(token) => ArchiveFormat::from_token(token).map_err(convert_error),
        None => ArchiveFormat::detect(file_name).map_err(|_| {
            anyhow::anyhow!(
                "Cannot detect archive format of '{file_name}'\n\
                 HINT: Use --format to choose it, or run `archivist formats` for known extensions."
            )
        }),
    }
}

/// Builds the per-run configuration from shared CLI flags.
pub(crate) fn operation_config(
    chunk_size: Option<u64>,
    atomic: bool,
    no_permissions: bool,
) -> OperationConfig {
    let config = OperationConfig::default()
        .with_atomic_output(atomic)
        .with_preserve_permissions(!no_permissions);
    match chunk_size.and_then(|size| usize::try_from(size).ok()) {
        Some(size) => config.with_chunk_size(size),
        None => config,
    }
}

/// Runs `operation` with a progress bar and Ctrl-C handling.
pub(crate) fn run_operation(
    operation: &mut Operation,
    verb: &'static str,
    show_progress: bool,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    if show_progress && CliProgress::should_show() {
        operation.set_progress_callback(Box::new(CliProgress::new(verb)));
    }

    let handle = operation.interrupt_handle();
    if let Err(err) = ctrlc::set_handler(move || handle.interrupt()) {
        log::warn!("failed to install Ctrl-C handler: {err}");
        formatter.format_warning("Ctrl-C will terminate without cleanup");
    }

    // Run on a worker thread; the main thread only waits for it.
    let succeeded = thread::scope(|scope| scope.spawn(|| operation.run()).join())
        .map_err(|_| anyhow::anyhow!("{} worker thread panicked", operation.mode()))?;
    if succeeded {
        return Ok(());
    }

    let archive = operation.descriptor().archive_path();
    match operation.failure() {
        Some(failure) if failure.class == ErrorClass::SuppressedIo => {
            Err(anyhow::Error::new(Interrupted))
        }
        Some(failure) => Err(convert_failure(failure, &archive)),
        None => Err(anyhow::anyhow!(
            "{} of '{}' failed",
            operation.mode(),
            archive.display()
        )),
    }
}
