//! Progress bar implementation for CLI operations.

use archivist_core::ProgressCallback;
use console::Term;
use indicatif::ProgressBar;
use indicatif::ProgressState;
use indicatif::ProgressStyle;
use std::fmt::Write;
use std::path::Path;

/// CLI progress bar wrapper implementing `ProgressCallback`.
///
/// The core reports whole percentages, so the bar length is fixed at 100.
/// The current entry name is shown as the bar message. Cleans up on drop.
pub struct CliProgress {
    bar: ProgressBar,
    prefix: &'static str,
}

impl CliProgress {
    /// Creates a new CLI progress bar.
    ///
    /// `prefix` is the verb shown before the entry name (e.g. "Compressing").
    #[must_use]
    pub fn new(prefix: &'static str) -> Self {
        let bar = ProgressBar::new(100);

        // Template: "Compressing docs/a.txt [████████░░░░] 42% (12s)"
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos:>3}% ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .with_key("eta", |state: &ProgressState, w: &mut dyn Write| {
                    write!(w, "{}", humanize_duration(state.eta())).unwrap_or(());
                })
                .progress_chars("█▓░"),
        );

        bar.set_message(prefix);

        Self { bar, prefix }
    }

    /// Checks if we should show progress (TTY detection).
    #[must_use]
    pub fn should_show() -> bool {
        Term::stdout().is_term()
    }

    #[cfg(test)]
    fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for CliProgress {
    fn on_progress(&mut self, percent: u8) {
        self.bar.set_position(u64::from(percent));
    }

    fn on_entry(&mut self, path: &Path) {
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        self.bar.set_message(format!("{} {name}", self.prefix));
    }
}

/// Converts duration to human-readable format.
fn humanize_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}
