//! Error conversion utilities for CLI.
//!
//! Converts archivist-core's typed errors and failure events into
//! user-friendly contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use archivist_core::ArchiveError;
use archivist_core::ErrorClass;
use archivist_core::Failure;
use std::path::Path;

/// Converts the failure event of a finished operation to an anyhow error.
pub fn convert_failure(failure: &Failure, archive: &Path) -> anyhow::Error {
    match failure.class {
        ErrorClass::CriticalIo => anyhow!(
            "I/O error while processing '{}': {}\n\
             HINT: Check that you have access rights to the files and the output directory.",
            archive.display(),
            failure.message
        ),
        ErrorClass::Format => anyhow!(
            "Invalid archive '{}': {}\n\
             HINT: The archive may be corrupted, or the format does not match. \
             Use --format to choose it explicitly.",
            archive.display(),
            failure.message
        ),
        ErrorClass::Configuration => anyhow!(
            "Invalid request for '{}': {}",
            archive.display(),
            failure.message
        ),
        ErrorClass::SuppressedIo => anyhow!("Interrupted while processing '{}'", archive.display()),
    }
}

/// Converts a configuration error raised before the operation runs.
pub fn convert_error(err: ArchiveError) -> anyhow::Error {
    match err {
        ArchiveError::UnknownFormat { token } => {
            let names = archivist_core::ArchiveFormat::ALL
                .iter()
                .map(|format| format.name())
                .collect::<Vec<_>>()
                .join(", ");
            anyhow!(
                "Unknown archive format: {token}\n\
                 HINT: Supported formats: {names}. Run `archivist formats` for extensions."
            )
        }
        ArchiveError::InvalidCompressionLevel { .. } => {
            anyhow!("{err}\nHINT: Use -1 for the codec default, 0 to store, 9 for best.")
        }
        _ => anyhow::Error::from(err),
    }
}

/// Returns `true` if the error chain ends in an interrupted operation.
pub fn is_interrupted(err: &anyhow::Error) -> bool {
    err.downcast_ref::<Interrupted>().is_some()
}

/// Marker error for runs stopped by Ctrl-C.
#[derive(Debug)]
pub struct Interrupted;

impl std::fmt::Display for Interrupted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("operation interrupted")
    }
}

impl std::error::Error for Interrupted {}
