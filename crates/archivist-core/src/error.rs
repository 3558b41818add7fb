//! Error types for archive compression and extraction operations.

use std::io;
use thiserror::Error;

use crate::format::ArchiveFormat;

/// Result type alias using `ArchiveError`.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Errors that can occur while configuring or running an archive operation.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Format token does not name a supported archive format.
    #[error("unknown archive format: {token}")]
    UnknownFormat {
        /// The unresolvable token.
        token: String,
    },

    /// Compression level outside `-1..=9`.
    #[error("invalid compression level {level} (expected -1 for default or 0-9)")]
    InvalidCompressionLevel {
        /// The rejected level.
        level: i32,
    },

    /// A compress operation was requested without any input files.
    #[error("no input files to compress")]
    EmptyFileList,

    /// Operation mode token is not recognized.
    #[error("unknown operation mode: {token}")]
    UnknownMode {
        /// The unresolvable token.
        token: String,
    },

    /// The operation has already been run once.
    #[error("operation has already been run")]
    AlreadyRun,

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The running operation observed an interrupt request and stopped.
    #[error("operation interrupted")]
    Interrupted,

    /// Archive content is malformed or does not match the expected format.
    #[error("invalid {format} archive: {reason}")]
    InvalidArchive {
        /// Format that was being read or written.
        format: ArchiveFormat,
        /// Description of the problem.
        reason: String,
    },

    /// Compressor stream is malformed or could not be constructed.
    #[error("{codec} stream error: {reason}")]
    Compressor {
        /// Codec name (e.g. `gzip`, `bzip2`, `lzma`).
        codec: &'static str,
        /// Description of the problem.
        reason: String,
    },

    /// A single-stream format received more (or less) than one input file.
    #[error("{format} compresses exactly one file, got {count}")]
    SingleFileExpected {
        /// The single-stream format.
        format: ArchiveFormat,
        /// Number of inputs supplied.
        count: usize,
    },
}

/// The four failure kinds an operation distinguishes.
///
/// Callers branch on this instead of inspecting individual error variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Invalid format token, compression level, mode or file list.
    Configuration,
    /// I/O failure that followed an interrupt request; expected, not alarming.
    SuppressedIo,
    /// I/O failure without a preceding interrupt request.
    CriticalIo,
    /// Malformed or unsupported archive or compressor content.
    Format,
}

impl ErrorClass {
    /// Returns the unlocalized message key a front end renders for this class.
    #[must_use]
    pub const fn message_key(self) -> &'static str {
        match self {
            Self::Configuration => "error.configuration",
            Self::SuppressedIo => "operation.interrupted",
            Self::CriticalIo => "error.missing_access_rights",
            Self::Format => "error.invalid_archive",
        }
    }

    /// Returns `true` if this failure must be shown to the user.
    #[must_use]
    pub const fn is_surfaced(self) -> bool {
        !matches!(self, Self::SuppressedIo)
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Configuration => "configuration error",
            Self::SuppressedIo => "interrupted",
            Self::CriticalIo => "critical I/O error",
            Self::Format => "format error",
        };
        f.write_str(name)
    }
}

impl ArchiveError {
    /// Classifies this error given whether an interrupt had been requested.
    ///
    /// # Examples
    ///
    /// ```
    /// use archivist_core::{ArchiveError, ErrorClass};
    ///
    /// let err = ArchiveError::Io(std::io::Error::other("disk full"));
    /// assert_eq!(err.classify(false), ErrorClass::CriticalIo);
    ///
    /// let err = ArchiveError::Io(std::io::Error::other("broken pipe"));
    /// assert_eq!(err.classify(true), ErrorClass::SuppressedIo);
    /// ```
    #[must_use]
    pub const fn classify(&self, interrupt_requested: bool) -> ErrorClass {
        match self {
            Self::UnknownFormat { .. }
            | Self::InvalidCompressionLevel { .. }
            | Self::EmptyFileList
            | Self::UnknownMode { .. }
            | Self::AlreadyRun => ErrorClass::Configuration,
            Self::Interrupted => ErrorClass::SuppressedIo,
            Self::Io(_) if interrupt_requested => ErrorClass::SuppressedIo,
            Self::Io(_) => ErrorClass::CriticalIo,
            Self::InvalidArchive { .. }
            | Self::Compressor { .. }
            | Self::SingleFileExpected { .. } => ErrorClass::Format,
        }
    }

    /// Returns `true` for archiver- or compressor-level format errors.
    #[must_use]
    pub const fn is_format_error(&self) -> bool {
        matches!(self.classify(false), ErrorClass::Format)
    }

    /// Maps an error raised while decoding `codec` data.
    ///
    /// Corrupt input surfaces from the codec crates as `InvalidData`,
    /// `InvalidInput` or `UnexpectedEof` I/O errors; those become
    /// [`ArchiveError::Compressor`]. Anything else stays an I/O error.
    pub(crate) fn from_decoder(codec: &'static str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::InvalidData
            | io::ErrorKind::InvalidInput
            | io::ErrorKind::UnexpectedEof => Self::Compressor {
                codec,
                reason: err.to_string(),
            },
            _ => Self::Io(err),
        }
    }
}

/// Semantic failure event produced by a finished operation.
///
/// The core does not localize text; front ends look up `message_key` and
/// may show `message` as detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Failure kind.
    pub class: ErrorClass,
    /// Unlocalized message key.
    pub message_key: &'static str,
    /// Human-readable detail from the underlying error.
    pub message: String,
}

impl Failure {
    /// Builds a failure event from an error and the interrupt state.
    #[must_use]
    pub fn from_error(err: &ArchiveError, interrupt_requested: bool) -> Self {
        let class = err.classify(interrupt_requested);
        Self {
            class,
            message_key: class.message_key(),
            message: err.to_string(),
        }
    }

    /// Returns `true` if this is a critical failure the user must see.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.class == ErrorClass::CriticalIo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ArchiveError::UnknownFormat {
            token: "rar".into(),
        };
        assert_eq!(err.to_string(), "unknown archive format: rar");

        let err = ArchiveError::InvalidCompressionLevel { level: 10 };
        assert!(err.to_string().contains("10"));
    }

    #[test]
    fn test_configuration_errors_ignore_interrupt_state() {
        let errors = [
            ArchiveError::UnknownFormat { token: "x".into() },
            ArchiveError::InvalidCompressionLevel { level: -2 },
            ArchiveError::EmptyFileList,
            ArchiveError::UnknownMode { token: "y".into() },
            ArchiveError::AlreadyRun,
        ];
        for err in &errors {
            assert_eq!(err.classify(false), ErrorClass::Configuration);
            assert_eq!(err.classify(true), ErrorClass::Configuration);
        }
    }

    #[test]
    fn test_io_error_classification() {
        let err: ArchiveError =
            io::Error::new(io::ErrorKind::PermissionDenied, "permission denied").into();
        assert!(matches!(err, ArchiveError::Io(_)));
        assert_eq!(err.classify(false), ErrorClass::CriticalIo);
        assert_eq!(err.classify(true), ErrorClass::SuppressedIo);
    }

    #[test]
    fn test_interrupted_is_always_suppressed() {
        assert_eq!(
            ArchiveError::Interrupted.classify(false),
            ErrorClass::SuppressedIo
        );
        assert_eq!(
            ArchiveError::Interrupted.classify(true),
            ErrorClass::SuppressedIo
        );
    }

    #[test]
    fn test_format_errors_never_suppressed() {
        let errors = [
            ArchiveError::InvalidArchive {
                format: ArchiveFormat::Zip,
                reason: "bad header".into(),
            },
            ArchiveError::Compressor {
                codec: "gzip",
                reason: "invalid gzip header".into(),
            },
            ArchiveError::SingleFileExpected {
                format: ArchiveFormat::Gzip,
                count: 2,
            },
        ];
        for err in &errors {
            assert!(err.is_format_error());
            assert_eq!(err.classify(true), ErrorClass::Format);
        }
    }

    #[test]
    fn test_from_decoder_kinds() {
        let err = ArchiveError::from_decoder(
            "bzip2",
            io::Error::new(io::ErrorKind::InvalidData, "bad magic"),
        );
        assert!(matches!(err, ArchiveError::Compressor { codec: "bzip2", .. }));

        let err = ArchiveError::from_decoder(
            "bzip2",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ArchiveError::Io(_)));
    }

    #[test]
    fn test_failure_event() {
        let err = ArchiveError::Io(io::Error::other("disk full"));
        let failure = Failure::from_error(&err, false);
        assert!(failure.is_critical());
        assert_eq!(failure.message_key, "error.missing_access_rights");
        assert!(failure.message.contains("disk full"));

        let failure = Failure::from_error(&err, true);
        assert!(!failure.is_critical());
        assert!(!failure.class.is_surfaced());
    }
}
