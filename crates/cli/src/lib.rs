//! Extraction driver and console reporting behind the `vba-extract` binary.

pub mod extract;

pub use extract::{
    extract_raw_project, extract_vba_modules, resolve_destination, run, ExtractOutcome,
};
