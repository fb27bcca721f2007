//! OOXML (ZIP) container backend for VBA macro extraction.
//!
//! Office Open XML packages (.xlsm, .xlam) embed their VBA project as an
//! opaque binary part. This crate locates that part and hands its raw
//! bytes to the OLE backend for decoding.

pub mod parser;

pub use parser::{OoxmlParser, VBA_PROJECT_FRAGMENT, VBA_PROJECT_PART};
