//! Error types for VBA macro extraction.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during VBA macro extraction.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// The container is well-formed but holds no VBA project.
    #[error("No VBA project found: {0}")]
    NoVbaProject(String),

    /// Failed to parse the VBA project structure (dir or module streams).
    #[error("VBA project parsing error: {0}")]
    ProjectParseError(String),

    /// Failed to expand an MS-OVBA compressed container.
    #[error("VBA decompression error: {0}")]
    DecompressionError(String),

    /// ZIP archive error (for .xlsm/.xlam packages).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for package content types).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// OLE/CFB container error (for .xls and vbaProject.bin).
    #[error("OLE/CFB error: {0}")]
    CfbError(String),
}
