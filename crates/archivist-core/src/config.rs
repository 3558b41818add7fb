//! Configuration for archive operations.

/// Default number of bytes processed per I/O chunk (64 KB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Explicit per-operation configuration.
///
/// Passed to an [`Operation`](crate::Operation) at construction and handed
/// down to its algorithm instance. There is no process-wide state.
///
/// # Examples
///
/// ```
/// use archivist_core::OperationConfig;
///
/// // Use defaults
/// let config = OperationConfig::default();
///
/// // Customize for specific needs
/// let custom = OperationConfig::default()
///     .with_chunk_size(16 * 1024)
///     .with_atomic_output(true);
/// assert_eq!(custom.chunk_size, 16 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationConfig {
    /// Bytes copied per chunk.
    ///
    /// The interrupt flag is polled and progress recomputed once per chunk,
    /// so this bounds cancellation latency.
    ///
    /// Default: 64 KB.
    pub chunk_size: usize,

    /// Write new archives to a temporary file and rename on success.
    ///
    /// When `false`, a failed or interrupted compress leaves a partially
    /// written archive behind. Extraction is never atomic.
    ///
    /// Default: `false`.
    pub atomic_output: bool,

    /// Store Unix permission bits in archives and restore them on
    /// extraction where the format carries them.
    ///
    /// Default: `true`.
    pub preserve_permissions: bool,
}

impl Default for OperationConfig {
    /// Default values:
    /// - `chunk_size`: 64 KB
    /// - `atomic_output`: `false`
    /// - `preserve_permissions`: `true`
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            atomic_output: false,
            preserve_permissions: true,
        }
    }
}

impl OperationConfig {
    /// Creates a new `OperationConfig` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chunk size; zero is raised to one byte.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Enables or disables temp-file-then-rename output.
    #[must_use]
    pub fn with_atomic_output(mut self, atomic_output: bool) -> Self {
        self.atomic_output = atomic_output;
        self
    }

    /// Enables or disables permission preservation.
    #[must_use]
    pub fn with_preserve_permissions(mut self, preserve: bool) -> Self {
        self.preserve_permissions = preserve;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OperationConfig::default();
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(!config.atomic_output);
        assert!(config.preserve_permissions);
    }

    #[test]
    fn test_builder_methods() {
        let config = OperationConfig::new()
            .with_chunk_size(0)
            .with_atomic_output(true)
            .with_preserve_permissions(false);
        assert_eq!(config.chunk_size, 1);
        assert!(config.atomic_output);
        assert!(!config.preserve_permissions);
    }
}
