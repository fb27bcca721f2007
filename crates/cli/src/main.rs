//! CLI tool for extracting VBA macro source from Excel files.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use vba_cli::extract::{resolve_destination, run};

/// Extract embedded VBA macro source from Excel workbooks.
#[derive(Parser, Debug)]
#[command(name = "vba-extract")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input Excel file (.xlsm, .xlam, .xls) or raw vbaProject.bin
    input: Option<PathBuf>,

    /// Destination directory (default: vba_extracted_<file-stem>)
    destination: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let banner = "=".repeat(60);
    println!("{}", banner);
    println!("VBA CODE EXTRACTOR FOR EXCEL FILES");
    println!("{}", banner);
    println!();

    let Some(input) = args.input else {
        println!("Usage: vba-extract <excel-file> [destination-directory]");
        println!();
        println!("Example:");
        println!("  vba-extract workbook.xlsm");
        println!("  vba-extract workbook.xlsm ./vba_extracted");
        println!();
        println!("IMPORTANT: Place the Excel file in this folder before running!");
        return Ok(());
    };

    if !input.exists() {
        let cwd = std::env::current_dir().context("Failed to resolve working directory")?;
        println!("❌ File not found: {}", input.display());
        println!("   Make sure the file is in: {}", cwd.display());
        return Ok(());
    }

    let destination = resolve_destination(&input, args.destination.as_deref());

    println!("Input file: {}", input.display());
    println!("Output directory: {}", destination.display());
    println!();

    if run(&input, &destination) {
        println!("\n{}", banner);
        println!("✅ EXTRACTION COMPLETED SUCCESSFULLY!");
        println!("{}", banner);
    } else {
        println!("\n{}", banner);
        println!("❌ Could not extract the VBA code");
        println!("{}", banner);
    }

    Ok(())
}
