//! Compress command implementation.

use super::operation_config;
use super::resolve_format;
use super::run_operation;
use crate::cli::CompressArgs;
use crate::error::convert_error;
use crate::output::OperationSummary;
use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use archivist_core::ArchiveDescriptor;
use archivist_core::Mode;
use archivist_core::Operation;
use std::fs;
use std::path::Path;

pub fn execute(args: &CompressArgs, formatter: &dyn OutputFormatter, quiet: bool) -> Result<()> {
    let name = args
        .output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("output path has no file name")?;
    let output_dir = match args.output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };

    let format = resolve_format(args.format.as_deref(), &name)?;
    let descriptor = ArchiveDescriptor::builder(format, &name)
        .level(args.level)
        .map_err(convert_error)?
        .files(args.sources.iter().cloned())
        .output_dir(output_dir)
        .build();

    let config = operation_config(args.chunk_size, args.atomic, args.no_permissions);
    let mut operation =
        Operation::with_config(descriptor, Mode::Compress, config).map_err(convert_error)?;

    run_operation(&mut operation, "Compressing", !quiet, formatter)?;

    let descriptor = operation.descriptor();
    let archive = descriptor.archive_path();
    let summary = OperationSummary {
        operation: "compress",
        format: format.display_name().to_string(),
        archive_size: fs::metadata(&archive).ok().map(|m| m.len()),
        archive,
        output_dir: descriptor.output_dir().to_path_buf(),
        inputs: descriptor.files().len(),
        elapsed_seconds: operation.elapsed_seconds().unwrap_or_default(),
    };
    formatter.format_operation_result(&summary)
}
