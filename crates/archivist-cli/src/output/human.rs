//! Human-readable output formatter with colors and styling.

use super::formatter::FormatInfo;
use super::formatter::OperationSummary;
use super::formatter::OutputFormatter;
use anyhow::Result;
use console::Term;
use console::style;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
    err_term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
            err_term: Term::stderr(),
        }
    }

    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    fn headline(operation: &str) -> &'static str {
        match operation {
            "compress" => "Archive created",
            _ => "Extraction complete",
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_operation_result(&self, summary: &OperationSummary) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        let headline = Self::headline(summary.operation);
        if self.use_colors {
            let _ = self.term.write_line(&format!(
                "{} {headline}: {}",
                style("✓").green().bold(),
                summary.archive.display()
            ));
        } else {
            let _ = self
                .term
                .write_line(&format!("{headline}: {}", summary.archive.display()));
        }

        let _ = self
            .term
            .write_line(&format!("  Format:      {}", summary.format));
        let _ = self.term.write_line(&format!(
            "  Output dir:  {}",
            summary.output_dir.display()
        ));
        if let Some(size) = summary.archive_size {
            let _ = self
                .term
                .write_line(&format!("  Size:        {}", Self::format_size(size)));
        }

        if self.verbose {
            let _ = self
                .term
                .write_line(&format!("  Inputs:      {}", summary.inputs));
            let _ = self.term.write_line(&format!(
                "  Duration:    {:.3}s",
                summary.elapsed_seconds
            ));
        }

        Ok(())
    }

    fn format_formats(&self, formats: &[FormatInfo]) -> Result<()> {
        for info in formats {
            let patterns = info
                .extensions
                .iter()
                .map(|ext| format!("*{ext}"))
                .collect::<Vec<_>>()
                .join(", ");
            let name = if self.use_colors {
                style(info.name).bold().to_string()
            } else {
                info.name.to_string()
            };
            let _ = self.term.write_line(&format!(
                "{name:<8} {} ({patterns})",
                info.display_name
            ));
        }
        Ok(())
    }

    fn format_error(&self, operation: &str, error: &anyhow::Error) {
        // Errors are shown even in quiet mode
        if self.use_colors {
            let _ = self.err_term.write_line(&format!(
                "{} {operation} failed: {error:?}",
                style("ERROR:").red().bold()
            ));
        } else {
            let _ = self
                .err_term
                .write_line(&format!("ERROR: {operation} failed: {error:?}"));
        }
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            let _ = self
                .err_term
                .write_line(&format!("{} {message}", style("⚠").yellow().bold()));
        } else {
            let _ = self.err_term.write_line(&format!("WARNING: {message}"));
        }
    }
}
