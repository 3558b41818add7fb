//! Progress metering.
//!
//! [`ProgressMeter`] turns a cumulative byte count into a whole percentage
//! of a precomputed total. [`ProgressTracker`] pairs a meter with a
//! [`ProgressCallback`] and only notifies when the percentage grows, which
//! bounds notifications to at most 100 per run regardless of chunk size.
//!
//! Percentages are floored. Reports are held at 99 until the run is
//! [finished](ProgressMeter::finish), so 100 is reported only after the
//! algorithm has completed successfully.

use std::path::Path;

/// Highest percentage [`ProgressMeter::report`] hands out before
/// [`ProgressMeter::finish`].
const PENDING_CEILING: u8 = 99;

/// Callback trait for progress reporting during archive operations.
///
/// The trait requires `Send` so an operation carrying a callback can run on
/// a worker thread.
///
/// # Examples
///
/// ```
/// use archivist_core::ProgressCallback;
///
/// struct PrintProgress;
///
/// impl ProgressCallback for PrintProgress {
///     fn on_progress(&mut self, percent: u8) {
///         println!("{percent}%");
///     }
/// }
/// ```
pub trait ProgressCallback: Send {
    /// Called when the whole-percentage value increases.
    fn on_progress(&mut self, percent: u8);

    /// Called when an entry starts being written or extracted.
    fn on_entry(&mut self, _path: &Path) {}
}

/// No-op implementation of `ProgressCallback`.
#[derive(Debug, Default)]
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_progress(&mut self, _percent: u8) {}
}

/// Whole-percentage progress computed from cumulative bytes.
///
/// # Examples
///
/// ```
/// use archivist_core::ProgressMeter;
///
/// let mut meter = ProgressMeter::new(200);
/// assert_eq!(meter.update_progress(50), 25);
/// assert_eq!(meter.update_progress(199), 99);
/// assert_eq!(meter.update_progress(200), 100);
///
/// // An empty workload never divides by zero.
/// let mut empty = ProgressMeter::new(0);
/// assert_eq!(empty.update_progress(10), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressMeter {
    total_bytes: u64,
    bytes_read: u64,
    last_reported: u8,
}

impl ProgressMeter {
    /// Creates a meter expecting `total_bytes`.
    #[must_use]
    pub const fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            bytes_read: 0,
            last_reported: 0,
        }
    }

    /// Total bytes expected.
    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Cumulative bytes recorded so far.
    #[must_use]
    pub const fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Last percentage handed out by [`report`](Self::report).
    #[must_use]
    pub const fn last_reported(&self) -> u8 {
        self.last_reported
    }

    /// Records `bytes_read_so_far` and returns the floored percentage,
    /// clamped to `0..=100`. Returns 0 when the total is zero.
    pub fn update_progress(&mut self, bytes_read_so_far: u64) -> u8 {
        self.bytes_read = bytes_read_so_far;
        self.percent()
    }

    /// Current floored percentage.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total_bytes == 0 {
            return 0;
        }
        let percent = u128::from(self.bytes_read) * 100 / u128::from(self.total_bytes);
        percent.min(100) as u8
    }

    /// Records progress and returns the new percentage only if it exceeds
    /// the last reported one. Reports stay below 100 until
    /// [`finish`](Self::finish).
    ///
    /// # Examples
    ///
    /// ```
    /// use archivist_core::ProgressMeter;
    ///
    /// let mut meter = ProgressMeter::new(100);
    /// assert_eq!(meter.report(50), Some(50));
    /// assert_eq!(meter.report(100), Some(99));
    /// assert_eq!(meter.finish(), Some(100));
    /// ```
    pub fn report(&mut self, bytes_read_so_far: u64) -> Option<u8> {
        let percent = self.update_progress(bytes_read_so_far).min(PENDING_CEILING);
        self.raise(percent)
    }

    /// Marks the whole workload as processed and reports 100, unless the
    /// total is zero or 100 was already reported.
    pub fn finish(&mut self) -> Option<u8> {
        let percent = self.update_progress(self.total_bytes);
        self.raise(percent)
    }

    fn raise(&mut self, percent: u8) -> Option<u8> {
        (percent > self.last_reported).then(|| {
            self.last_reported = percent;
            percent
        })
    }
}

/// Threshold-gated progress reporting for one run.
pub struct ProgressTracker {
    meter: ProgressMeter,
    callback: Box<dyn ProgressCallback>,
}

impl ProgressTracker {
    /// Creates a tracker with an empty meter.
    #[must_use]
    pub fn new(callback: Box<dyn ProgressCallback>) -> Self {
        Self {
            meter: ProgressMeter::default(),
            callback,
        }
    }

    /// Resets the meter for a new workload of `total_bytes`.
    pub fn reset(&mut self, total_bytes: u64) {
        self.meter = ProgressMeter::new(total_bytes);
    }

    /// Replaces the callback, keeping the meter.
    pub fn set_callback(&mut self, callback: Box<dyn ProgressCallback>) {
        self.callback = callback;
    }

    /// Read-only view of the meter.
    #[must_use]
    pub const fn meter(&self) -> &ProgressMeter {
        &self.meter
    }

    /// Adds `bytes` processed and notifies if the percentage grew.
    pub fn advance(&mut self, bytes: u64) {
        let so_far = self.meter.bytes_read().saturating_add(bytes);
        let reported = self.meter.report(so_far);
        self.notify(reported);
    }

    /// Marks the whole workload as processed, reporting 100.
    ///
    /// Algorithms call this only after a successful run.
    pub fn complete(&mut self) {
        let reported = self.meter.finish();
        self.notify(reported);
    }

    fn notify(&mut self, reported: Option<u8>) {
        if let Some(percent) = reported {
            log::debug!("progress: {percent}%");
            self.callback.on_progress(percent);
        }
    }

    /// Forwards an entry notification.
    pub fn entry(&mut self, path: &Path) {
        log::trace!("processing {}", path.display());
        self.callback.on_entry(path);
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("meter", &self.meter)
            .finish_non_exhaustive()
    }
}
