//! Example: Compressing and extracting archives with archivist-core
//!
//! Run with: `cargo run --example round_trip`

use archivist_core::ArchiveDescriptor;
use archivist_core::ArchiveFormat;
use archivist_core::Mode;
use archivist_core::Operation;
use archivist_core::OperationConfig;
use archivist_core::ProgressCallback;

struct PrintProgress;

impl ProgressCallback for PrintProgress {
    fn on_progress(&mut self, percent: u8) {
        if percent % 25 == 0 {
            println!("  {percent}%");
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let workdir = std::env::temp_dir().join("archivist-example");
    std::fs::create_dir_all(&workdir)?;
    let source = workdir.join("example_file.txt");
    std::fs::write(&source, "Hello, archivist!\n".repeat(10_000))?;

    // Example 1: Compress with the builder and a progress callback
    println!("Example 1: Compress to TAR+GZIP");
    let descriptor = ArchiveDescriptor::builder(ArchiveFormat::TarGz, "example")
        .level(9)?
        .file(&source)
        .output_dir(&workdir)
        .build();
    let mut operation = Operation::with_config(
        descriptor,
        Mode::Compress,
        OperationConfig::default().with_atomic_output(true),
    )?;
    operation.set_progress_callback(Box::new(PrintProgress));
    if !operation.run() {
        return Err(format!("compress failed: {:?}", operation.failure()).into());
    }
    let archive = operation.descriptor().archive_path();
    println!("  Created {}", archive.display());

    // Example 2: Extract from front-end tokens
    println!("\nExample 2: Extract");
    let restored = workdir.join("restored");
    let mut operation = Operation::from_tokens(
        "TAR+GZIP",
        "decompress",
        &archive.to_string_lossy(),
        -1,
        Vec::new(),
        restored.clone(),
        OperationConfig::default(),
    )?;
    if operation.run() {
        println!("  Extracted into {}", restored.display());
    }

    std::fs::remove_dir_all(&workdir)?;
    println!("\nExamples completed successfully!");
    Ok(())
}
