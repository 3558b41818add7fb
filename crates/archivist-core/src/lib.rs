//! Cancellable archive compression and extraction engine.
//!
//! `archivist-core` compresses file sets into ZIP, JAR, gzip and
//! tar (gzip/bzip2/LZMA) archives and extracts them again. Each run is an
//! [`Operation`]: one descriptor, one mode, one fresh algorithm instance,
//! with throttled progress reporting and cooperative cancellation.
//!
//! # Examples
//!
//! ```no_run
//! use archivist_core::{ArchiveDescriptor, ArchiveFormat, Mode, Operation};
//!
//! # fn main() -> archivist_core::Result<()> {
//! let descriptor = ArchiveDescriptor::builder(ArchiveFormat::Zip, "out")
//!     .level(9)?
//!     .files(["a.txt", "b.txt"])
//!     .output_dir("/tmp")
//!     .build();
//!
//! let mut operation = Operation::new(descriptor, Mode::Compress)?;
//! assert!(operation.run());
//! # Ok(())
//! # }
//! ```
//!
//! # Failure classes
//!
//! A failed run never panics. Its [`Failure`] carries one of four
//! [`ErrorClass`]es: configuration, suppressed I/O (after an interrupt),
//! critical I/O, or format.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod algorithm;
pub mod cancel;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod format;
pub mod level;
pub mod operation;
pub mod progress;

pub use algorithm::ArchivingAlgorithm;
pub use cancel::InterruptFlag;
pub use config::OperationConfig;
pub use descriptor::ArchiveDescriptor;
pub use descriptor::ArchiveDescriptorBuilder;
pub use error::ArchiveError;
pub use error::ErrorClass;
pub use error::Failure;
pub use error::Result;
pub use format::ArchiveFormat;
pub use level::CompressionLevel;
pub use operation::InterruptHandle;
pub use operation::Mode;
pub use operation::Operation;
pub use operation::OperationState;
pub use progress::NoopProgress;
pub use progress::ProgressCallback;
pub use progress::ProgressMeter;
pub use progress::ProgressTracker;
