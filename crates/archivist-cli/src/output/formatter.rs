//! Output formatter trait for CLI results.

use anyhow::Result;
use archivist_core::ArchiveFormat;
use serde::Serialize;
use std::path::PathBuf;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format the result of a finished compress or extract run
    fn format_operation_result(&self, summary: &OperationSummary) -> Result<()>;

    /// Format the list of supported formats
    fn format_formats(&self, formats: &[FormatInfo]) -> Result<()>;

    /// Format error message
    fn format_error(&self, operation: &str, error: &anyhow::Error);

    /// Format warning message
    fn format_warning(&self, message: &str);
}

/// Outcome of one successful operation.
#[derive(Debug, Serialize)]
pub struct OperationSummary {
    pub operation: &'static str,
    pub format: String,
    pub archive: PathBuf,
    pub output_dir: PathBuf,
    pub inputs: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_size: Option<u64>,
    pub elapsed_seconds: f64,
}

/// Description of one supported format.
#[derive(Debug, Serialize)]
pub struct FormatInfo {
    pub name: &'static str,
    pub display_name: &'static str,
    pub default_extension: &'static str,
    pub extensions: Vec<String>,
}

impl From<ArchiveFormat> for FormatInfo {
    fn from(format: ArchiveFormat) -> Self {
        Self {
            name: format.name(),
            display_name: format.display_name(),
            default_extension: format.default_extension(),
            extensions: format.extension_names(false),
        }
    }
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
            error: None,
        }
    }
}

impl JsonOutput<()> {
    pub fn error(operation: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Error,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_info_from_format() {
        let info = FormatInfo::from(ArchiveFormat::TarBz2);
        assert_eq!(info.name, "TarBz2");
        assert_eq!(info.display_name, "TAR+BZIP2");
        assert_eq!(info.default_extension, ".tar.bz2");
        assert_eq!(info.extensions, [".tar.bz2", ".tar.bzip2", ".tbz2"]);
    }

    #[test]
    fn test_error_output_omits_data() {
        let json = serde_json::to_string(&JsonOutput::error("extract", "boom")).unwrap();
        assert!(json.contains("\"status\":\"error\""));
        assert!(json.contains("\"error\":\"boom\""));
        assert!(!json.contains("\"data\""));
    }
}
