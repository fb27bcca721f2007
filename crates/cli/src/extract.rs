//! The two extraction strategies and the driver chaining them.
//!
//! Progress and verdicts for the user go to stdout with the glyph-prefixed
//! lines `main` wraps in banners; diagnostics go through `log`.

use std::fs::{self, File};
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use vba_core::{ContainerFormat, Error, Result, VbaProject};
use vba_ole::VbaProjectParser;
use vba_ooxml::OoxmlParser;
use zip::ZipArchive;

/// Result of one extraction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// The attempt completed and wrote this many module files.
    Extracted { modules: usize },
    /// The container is valid but carries no VBA project.
    NoMacros,
    /// The attempt hit a fault (already reported on stdout).
    Failed,
}

impl ExtractOutcome {
    /// Whether the attempt completed without fault.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Extracted { .. })
    }
}

/// Run the primary extraction, then the fallback exactly once if the
/// primary did not succeed. Returns whether either attempt succeeded.
pub fn run(input: &Path, destination: &Path) -> bool {
    if extract_vba_modules(input, destination).is_success() {
        return true;
    }

    println!("\nTrying fallback method...");
    extract_raw_project(input, destination).is_success()
}

/// Primary extraction: parse the VBA project and write one source file
/// per module that carries source text.
pub fn extract_vba_modules(input: &Path, destination: &Path) -> ExtractOutcome {
    println!("Processing: {}", input.display());

    if let Err(e) = fs::create_dir_all(destination) {
        println!("❌ Error processing file: {}", e);
        return ExtractOutcome::Failed;
    }

    let project = match parse_project(input) {
        Ok(project) => project,
        Err(Error::NoVbaProject(reason)) => {
            log::debug!("no VBA project: {}", reason);
            println!("❌ No VBA macros found in this file.");
            return ExtractOutcome::NoMacros;
        }
        Err(e) => {
            println!("❌ Error processing file: {}", e);
            return ExtractOutcome::Failed;
        }
    };

    println!("✅ VBA macros detected!");

    let mut extracted = 0;
    for module in &project.modules {
        if !module.has_source() {
            log::debug!("skipping module '{}' with empty source", module.name);
            continue;
        }

        let file_name = module.file_name();
        if let Err(e) = fs::write(destination.join(&file_name), module.source.as_bytes()) {
            println!("❌ Error processing file: {}", e);
            return ExtractOutcome::Failed;
        }

        println!(
            "  📄 Extracted: {} ({} characters)",
            file_name,
            module.source.chars().count()
        );
        extracted += 1;
    }

    println!(
        "\n✅ Total: {} module(s) extracted to: {}",
        extracted,
        destination.display()
    );
    ExtractOutcome::Extracted { modules: extracted }
}

/// Fallback extraction: copy the raw VBA project blob out of an OOXML
/// package without decoding it.
///
/// Only works on zip containers; the first entry whose name contains
/// `vbaProject.bin` wins and any further matches are ignored.
pub fn extract_raw_project(input: &Path, destination: &Path) -> ExtractOutcome {
    println!("Trying fallback method (zip) for: {}", input.display());

    if let Err(e) = fs::create_dir_all(destination) {
        println!("❌ Fallback method error: {}", e);
        return ExtractOutcome::Failed;
    }

    let file = match File::open(input) {
        Ok(file) => file,
        Err(e) => {
            println!("❌ Fallback method error: {}", e);
            return ExtractOutcome::Failed;
        }
    };

    let mut archive = match ZipArchive::new(BufReader::new(file)) {
        Ok(archive) => archive,
        Err(e) => {
            log::debug!("not a zip archive: {}", e);
            println!("❌ File is not an Office Open XML package (.xlsm/.xlam)");
            return ExtractOutcome::Failed;
        }
    };

    let parser = OoxmlParser::new();
    let entries = match parser.find_vba_entries(&mut archive) {
        Ok(entries) => entries,
        Err(e) => {
            println!("❌ Fallback method error: {}", e);
            return ExtractOutcome::Failed;
        }
    };

    let Some(entry) = entries.into_iter().next() else {
        println!("❌ No VBA project found in the archive.");
        return ExtractOutcome::Failed;
    };

    let bytes = match parser.read_part_bytes(&mut archive, &entry) {
        Ok(bytes) => bytes,
        Err(e) => {
            println!("❌ Fallback method error: {}", e);
            return ExtractOutcome::Failed;
        }
    };

    let output_path = destination.join("vbaProject.bin");
    if let Err(e) = fs::write(&output_path, &bytes) {
        println!("❌ Fallback method error: {}", e);
        return ExtractOutcome::Failed;
    }

    println!("✅ Extracted: vbaProject.bin");
    println!("   Decode it with: vba-extract {}", output_path.display());
    ExtractOutcome::Extracted { modules: 1 }
}

/// Resolve the output directory: the explicit argument when given,
/// otherwise `vba_extracted_<file-stem>` under the working directory.
pub fn resolve_destination(input: &Path, destination: Option<&Path>) -> PathBuf {
    match destination {
        Some(dir) => dir.to_path_buf(),
        None => {
            let stem = input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("output");
            PathBuf::from(format!("vba_extracted_{}", stem))
        }
    }
}

/// Detect the container format and parse the VBA project out of it.
fn parse_project(input: &Path) -> Result<VbaProject> {
    let format = detect_format(input)?;

    // Re-open for parsing; detection consumed the header bytes.
    let file = File::open(input)?;
    let reader = BufReader::new(file);

    match format {
        ContainerFormat::OpenXml => {
            log::debug!("parsing as OOXML package");
            let blob = OoxmlParser::new().read_vba_project(reader)?;
            VbaProjectParser::new().parse(Cursor::new(blob))
        }
        ContainerFormat::OleCompound => {
            log::debug!("parsing as OLE compound file");
            VbaProjectParser::new().parse(reader)
        }
    }
}

/// Classify the input by magic bytes, falling back to the file extension.
fn detect_format(input: &Path) -> Result<ContainerFormat> {
    let mut magic = Vec::new();
    File::open(input)?.take(8).read_to_end(&mut magic)?;

    ContainerFormat::from_magic(&magic)
        .or_else(|| {
            input
                .extension()
                .and_then(|e| e.to_str())
                .and_then(ContainerFormat::from_extension)
        })
        .ok_or_else(|| Error::UnsupportedFormat(input.display().to_string()))
}
