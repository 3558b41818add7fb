//! Extract command implementation.

use super::operation_config;
use super::resolve_format;
use super::run_operation;
use crate::cli::ExtractArgs;
use crate::error::convert_error;
use crate::output::OperationSummary;
use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use archivist_core::ArchiveDescriptor;
use archivist_core::ArchiveFormat;
use archivist_core::Mode;
use archivist_core::Operation;
use std::env;
use std::path;

pub fn execute(args: &ExtractArgs, formatter: &dyn OutputFormatter, quiet: bool) -> Result<()> {
    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("failed to get current directory")?,
    };

    // The archive is resolved against the output directory, so pin it first.
    let archive = path::absolute(&args.archive)
        .with_context(|| format!("failed to resolve '{}'", args.archive.display()))?;
    let file_name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("archive path has no file name")?;
    let format = resolve_format(args.format.as_deref(), &file_name)?;
    ensure_extension(format, &file_name)?;

    let descriptor = ArchiveDescriptor::builder(format, &archive.to_string_lossy())
        .output_dir(output_dir)
        .build();
    let config = operation_config(args.chunk_size, false, args.no_permissions);
    let mut operation =
        Operation::with_config(descriptor, Mode::Decompress, config).map_err(convert_error)?;

    run_operation(&mut operation, "Extracting", !quiet, formatter)?;

    let descriptor = operation.descriptor();
    let summary = OperationSummary {
        operation: "extract",
        format: format.display_name().to_string(),
        archive: descriptor.archive_path(),
        output_dir: descriptor.output_dir().to_path_buf(),
        inputs: 1,
        archive_size: None,
        elapsed_seconds: operation.elapsed_seconds().unwrap_or_default(),
    };
    formatter.format_operation_result(&summary)
}

/// Archives are located by a name carrying one of the format's extensions;
/// any other name would be resolved to a different file.
fn ensure_extension(format: ArchiveFormat, file_name: &str) -> Result<()> {
    if format.matches_extension(file_name) {
        return Ok(());
    }
    bail!(
        "Archive name '{file_name}' does not end with a {} extension\n\
         HINT: Rename the archive to end with one of: {}",
        format.display_name(),
        format.extension_names(false).join(", ")
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_extension() {
        assert!(ensure_extension(ArchiveFormat::Gzip, "pkg.gz").is_ok());
        assert!(ensure_extension(ArchiveFormat::TarGz, "pkg.tgz").is_ok());

        let err = ensure_extension(ArchiveFormat::Gzip, "pkg.bin").unwrap_err();
        let msg = format!("{err:?}");
        assert!(msg.contains("pkg.bin"));
        assert!(msg.contains(".gz, .gzip"));
        assert!(msg.contains("HINT"));
    }
}
