//! Cancellable unit of work binding one descriptor, one mode and one
//! algorithm instance.
//!
//! An [`Operation`] is meant to run on its own thread. It shares no mutable
//! state with other operations; cancellation goes through an
//! [`InterruptHandle`] that may be cloned into any other thread.
//!
//! # Examples
//!
//! ```no_run
//! use archivist_core::{ArchiveDescriptor, ArchiveFormat, Mode, Operation};
//!
//! # fn main() -> archivist_core::Result<()> {
//! let descriptor = ArchiveDescriptor::builder(ArchiveFormat::TarGz, "backup")
//!     .file("documents")
//!     .output_dir("/tmp")
//!     .build();
//!
//! let mut operation = Operation::new(descriptor, Mode::Compress)?;
//! let handle = operation.interrupt_handle();
//! ctrlc_like_hook(move || handle.interrupt());
//!
//! if operation.run() {
//!     println!("done in {:.2}s", operation.elapsed_seconds().unwrap_or_default());
//! } else if let Some(failure) = operation.failure() {
//!     eprintln!("{}: {}", failure.message_key, failure.message);
//! }
//! # Ok(())
//! # }
//! # fn ctrlc_like_hook(_f: impl Fn() + Send + 'static) {}
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use std::time::Instant;

use crate::ArchiveDescriptor;
use crate::ArchiveError;
use crate::ArchiveFormat;
use crate::CompressionLevel;
use crate::ErrorClass;
use crate::Failure;
use crate::InterruptFlag;
use crate::OperationConfig;
use crate::ProgressCallback;
use crate::Result;
use crate::algorithm::ArchivingAlgorithm;

/// Direction of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Create an archive from the descriptor's files.
    Compress,
    /// Extract the descriptor's archive into its output directory.
    Decompress,
}

impl Mode {
    /// Resolves `compress`, `decompress` or `extract`, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::UnknownMode`] for any other token.
    pub fn from_token(token: &str) -> Result<Self> {
        let token = token.trim();
        if token.eq_ignore_ascii_case("compress") {
            Ok(Self::Compress)
        } else if token.eq_ignore_ascii_case("decompress") || token.eq_ignore_ascii_case("extract")
        {
            Ok(Self::Decompress)
        } else {
            Err(ArchiveError::UnknownMode {
                token: token.to_string(),
            })
        }
    }

    /// Lowercase mode name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compress => "compress",
            Self::Decompress => "decompress",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_token(s)
    }
}

/// Lifecycle of an [`Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    /// Built, not yet run.
    Constructed,
    /// `run()` is executing.
    Running,
    /// Finished; `success` tells whether compress/extract returned normally.
    Completed {
        /// Whether the run succeeded.
        success: bool,
    },
    /// Stopped after an interrupt request.
    Interrupted,
}

/// Cloneable handle requesting cancellation of one operation.
///
/// Interrupting marks the operation's suppression flag, so I/O failures
/// caused by the cancellation are classified as expected, and forwards the
/// request to the algorithm instance.
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    suppress: InterruptFlag,
    algorithm: InterruptFlag,
}

impl InterruptHandle {
    /// Requests cancellation. Idempotent, non-blocking.
    pub fn interrupt(&self) {
        self.suppress.interrupt();
        self.algorithm.interrupt();
    }

    /// Returns `true` once cancellation has been requested.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.suppress.is_interrupted()
    }
}

/// One cancellable compress or extract run.
pub struct Operation {
    descriptor: ArchiveDescriptor,
    mode: Mode,
    algorithm: Box<dyn ArchivingAlgorithm>,
    suppress: InterruptFlag,
    state: OperationState,
    elapsed: Option<Duration>,
    failure: Option<Failure>,
}

impl Operation {
    /// Creates an operation with the default [`OperationConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::EmptyFileList`] for a compress operation
    /// without input files.
    pub fn new(descriptor: ArchiveDescriptor, mode: Mode) -> Result<Self> {
        Self::with_config(descriptor, mode, OperationConfig::default())
    }

    /// Creates an operation with an explicit configuration.
    ///
    /// A fresh algorithm instance is resolved for the descriptor's format.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::EmptyFileList`] for a compress operation
    /// without input files.
    pub fn with_config(
        descriptor: ArchiveDescriptor,
        mode: Mode,
        config: OperationConfig,
    ) -> Result<Self> {
        if mode == Mode::Compress && descriptor.files().is_empty() {
            return Err(ArchiveError::EmptyFileList);
        }
        let algorithm = descriptor.format().algorithm(config);
        Ok(Self {
            descriptor,
            mode,
            algorithm,
            suppress: InterruptFlag::new(),
            state: OperationState::Constructed,
            elapsed: None,
            failure: None,
        })
    }

    /// Creates an operation from raw front-end tokens.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown format or mode token,
    /// an out-of-range level, or an empty compress file list.
    pub fn from_tokens(
        format: &str,
        mode: &str,
        archive_name: &str,
        level: i32,
        files: Vec<PathBuf>,
        output_dir: PathBuf,
        config: OperationConfig,
    ) -> Result<Self> {
        let format = ArchiveFormat::from_token(format)?;
        let mode = Mode::from_token(mode)?;
        let level = CompressionLevel::new(level)?;
        let descriptor = ArchiveDescriptor::new(format, archive_name, level, files, output_dir);
        Self::with_config(descriptor, mode, config)
    }

    /// Installs the progress callback for the run.
    pub fn set_progress_callback(&mut self, callback: Box<dyn ProgressCallback>) {
        self.algorithm.set_progress_callback(callback);
    }

    /// Runs the operation once and returns whether it succeeded.
    ///
    /// Never panics on archive or I/O failures: they are classified,
    /// logged and kept in [`failure`](Self::failure).
    pub fn run(&mut self) -> bool {
        if self.state != OperationState::Constructed {
            self.record_failure(&ArchiveError::AlreadyRun);
            return false;
        }

        self.state = OperationState::Running;
        log::info!(
            "{} {} archive {}",
            self.mode,
            self.descriptor.format().display_name(),
            self.descriptor.archive_path().display()
        );

        let start = Instant::now();
        let result = match self.mode {
            Mode::Compress => self.algorithm.compress_descriptor(&self.descriptor),
            Mode::Decompress => self.algorithm.extract_descriptor(&self.descriptor),
        };
        let elapsed = start.elapsed();
        self.elapsed = Some(elapsed);

        match result {
            Ok(()) => {
                log::info!("{} finished in {:.3}s", self.mode, elapsed.as_secs_f64());
                self.state = OperationState::Completed { success: true };
                true
            }
            Err(err) => {
                let class = self.record_failure(&err);
                self.state = if class == ErrorClass::SuppressedIo {
                    OperationState::Interrupted
                } else {
                    OperationState::Completed { success: false }
                };
                false
            }
        }
    }

    fn record_failure(&mut self, err: &ArchiveError) -> ErrorClass {
        let failure = Failure::from_error(err, self.suppress.is_interrupted());
        match failure.class {
            ErrorClass::CriticalIo => {
                log::error!("{} failed: {err}", self.mode);
                log::warn!(
                    "check access rights for {}",
                    self.descriptor.output_dir().display()
                );
            }
            ErrorClass::Format | ErrorClass::Configuration => {
                log::error!("{} failed: {err}", self.mode);
            }
            ErrorClass::SuppressedIo => {
                log::debug!("{} stopped after interrupt: {err}", self.mode);
            }
        }
        let class = failure.class;
        self.failure = Some(failure);
        class
    }

    /// Requests cancellation of a running or future run.
    pub fn interrupt(&self) {
        self.interrupt_handle().interrupt();
    }

    /// Returns a handle that can interrupt this operation from any thread.
    #[must_use]
    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle {
            suppress: self.suppress.clone(),
            algorithm: self.algorithm.interrupt_flag(),
        }
    }

    /// Wall-clock duration of the run in seconds, once it has finished.
    #[must_use]
    pub fn elapsed_seconds(&self) -> Option<f64> {
        self.elapsed.map(|d| d.as_secs_f64())
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> OperationState {
        self.state
    }

    /// Failure event of the last run, if it failed.
    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    /// The descriptor this operation runs.
    #[must_use]
    pub const fn descriptor(&self) -> &ArchiveDescriptor {
        &self.descriptor
    }

    /// Mode of this operation.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("descriptor", &self.descriptor)
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("elapsed", &self.elapsed)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}
