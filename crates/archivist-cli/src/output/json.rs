//! JSON output formatter for machine-readable results.

use super::formatter::FormatInfo;
use super::formatter::JsonOutput;
use super::formatter::OperationSummary;
use super::formatter::OutputFormatter;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::io::{self};

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_operation_result(&self, summary: &OperationSummary) -> Result<()> {
        let output = JsonOutput::success(summary.operation, summary);
        Self::output(&output)
    }

    fn format_formats(&self, formats: &[FormatInfo]) -> Result<()> {
        let output = JsonOutput::success("formats", formats);
        Self::output(&output)
    }

    fn format_error(&self, operation: &str, error: &anyhow::Error) {
        let output = JsonOutput::error(operation, format!("{error:#}"));
        let _ = Self::output(&output);
    }

    fn format_warning(&self, message: &str) {
        #[derive(Serialize)]
        struct WarningData<'a> {
            message: &'a str,
        }

        let output = JsonOutput::success("warning", WarningData { message });
        let _ = Self::output(&output);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_summary_serialization() {
        let summary = OperationSummary {
            operation: "compress",
            format: "ZIP".to_string(),
            archive: PathBuf::from("/tmp/out.zip"),
            output_dir: PathBuf::from("/tmp"),
            inputs: 2,
            archive_size: None,
            elapsed_seconds: 0.5,
        };
        let json = serde_json::to_string(&JsonOutput::success("compress", &summary)).unwrap();
        assert!(json.contains("\"status\":\"success\""));
        assert!(json.contains("\"archive\":\"/tmp/out.zip\""));
        assert!(!json.contains("archive_size"));
    }
}
