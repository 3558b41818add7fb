//! Cooperative cancellation.
//!
//! An [`InterruptFlag`] is a shared boolean set from any thread and polled
//! by the running compress/extract loop once per file and once per I/O
//! chunk. Setting it never stops a run synchronously; the run notices at
//! the next poll, so the latency is bounded by one chunk's processing time.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use crate::ArchiveError;
use crate::Result;

/// Shared, cloneable interrupt flag.
///
/// Clones observe the same flag. Independent flags are created with
/// [`InterruptFlag::new`].
///
/// # Examples
///
/// ```
/// use archivist_core::InterruptFlag;
///
/// let flag = InterruptFlag::new();
/// let remote = flag.clone();
///
/// std::thread::spawn(move || remote.interrupt()).join().unwrap();
/// assert!(flag.is_interrupted());
/// assert!(flag.check().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    /// Creates a new, unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent and non-blocking.
    pub fn interrupt(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns `true` once cancellation has been requested.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Polls the flag.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Interrupted`] if cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_interrupted() {
            Err(ArchiveError::Interrupted)
        } else {
            Ok(())
        }
    }
}
