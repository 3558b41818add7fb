//! Formats command implementation.

use crate::output::FormatInfo;
use crate::output::OutputFormatter;
use anyhow::Result;
use archivist_core::ArchiveFormat;

pub fn execute(formatter: &dyn OutputFormatter) -> Result<()> {
    let formats = ArchiveFormat::ALL
        .into_iter()
        .map(FormatInfo::from)
        .collect::<Vec<_>>();
    formatter.format_formats(&formats)
}
