//! Parser for the decompressed `VBA/dir` stream ([MS-OVBA] 2.3.4.2).
//!
//! The stream is a flat sequence of id/length-prefixed records. Only the
//! records needed to enumerate modules are interpreted: the project
//! codepage and name, and per module its name, stream name, and source
//! text offset. Everything else is skipped by length.

use crate::codepage::{decode_mbcs, decode_utf16le, DEFAULT_CODEPAGE};
use vba_core::{Error, Result};

/// Record ids interpreted from the dir stream.
mod record_ids {
    pub const PROJECT_CODEPAGE: u16 = 0x0003;
    pub const PROJECT_NAME: u16 = 0x0004;
    pub const MODULE_NAME: u16 = 0x0019;
    pub const MODULE_NAME_UNICODE: u16 = 0x0047;
    pub const MODULE_STREAM_NAME: u16 = 0x001A;
    pub const MODULE_STREAM_NAME_UNICODE: u16 = 0x0032;
    pub const MODULE_TEXT_OFFSET: u16 = 0x0031;
    pub const MODULE_TERMINATOR: u16 = 0x002B;
}

/// One module's bookkeeping from the dir stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    /// Module name shown in the VBA editor.
    pub name: String,

    /// Compound-file stream holding the module, when recorded.
    pub stream_name: Option<String>,

    /// Byte offset of the compressed source within the module stream.
    pub text_offset: Option<usize>,
}

impl ModuleRecord {
    fn new(name: String) -> Self {
        Self {
            name,
            stream_name: None,
            text_offset: None,
        }
    }

    /// Stream to read the module from; defaults to the module name when
    /// the dir stream never recorded one.
    pub fn stream_name(&self) -> &str {
        self.stream_name.as_deref().unwrap_or(&self.name)
    }
}

/// Parsed contents of a decompressed dir stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirStream {
    /// Project name from the PROJECTNAME record, if present.
    pub project_name: Option<String>,

    /// Codepage for MBCS strings and module source text.
    pub codepage: u16,

    /// Module records in stream order.
    pub modules: Vec<ModuleRecord>,
}

impl DirStream {
    /// Parse a decompressed dir stream.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut pos = 0usize;
        let mut codepage = DEFAULT_CODEPAGE;
        let mut project_name = None;
        let mut modules: Vec<ModuleRecord> = Vec::new();
        let mut current: Option<ModuleRecord> = None;

        while pos < data.len() {
            if pos + 6 > data.len() {
                return Err(Error::ProjectParseError(
                    "dir stream truncated inside a record header".to_string(),
                ));
            }
            let id = u16::from_le_bytes([data[pos], data[pos + 1]]);
            let len = u32::from_le_bytes([
                data[pos + 2],
                data[pos + 3],
                data[pos + 4],
                data[pos + 5],
            ]) as usize;
            pos += 6;

            if pos + len > data.len() {
                return Err(Error::ProjectParseError(format!(
                    "dir record 0x{:04X} claims {} bytes with only {} remaining",
                    id,
                    len,
                    data.len() - pos
                )));
            }
            let record = &data[pos..pos + len];
            pos += len;

            match id {
                record_ids::PROJECT_CODEPAGE => {
                    if record.len() >= 2 {
                        codepage = u16::from_le_bytes([record[0], record[1]]);
                    }
                }
                record_ids::PROJECT_NAME => {
                    project_name = Some(decode_mbcs(record, codepage));
                }
                record_ids::MODULE_NAME => {
                    if let Some(module) = current.take() {
                        modules.push(module);
                    }
                    current = Some(ModuleRecord::new(decode_mbcs(record, codepage)));
                }
                record_ids::MODULE_NAME_UNICODE => {
                    if let Some(module) = current.as_mut() {
                        if !record.is_empty() {
                            module.name = decode_utf16le(record);
                        }
                    }
                }
                record_ids::MODULE_STREAM_NAME => {
                    if let Some(module) = current.as_mut() {
                        let trimmed = trim_reserved_suffix(record);
                        module.stream_name = Some(decode_mbcs(trimmed, codepage));
                    }
                }
                record_ids::MODULE_STREAM_NAME_UNICODE => {
                    if let Some(module) = current.as_mut() {
                        if !record.is_empty() {
                            module.stream_name = Some(decode_utf16le(record));
                        }
                    }
                }
                record_ids::MODULE_TEXT_OFFSET => {
                    if let Some(module) = current.as_mut() {
                        if record.len() >= 4 {
                            let offset = u32::from_le_bytes([
                                record[0], record[1], record[2], record[3],
                            ]);
                            module.text_offset = Some(offset as usize);
                        }
                    }
                }
                record_ids::MODULE_TERMINATOR => {
                    if let Some(module) = current.take() {
                        modules.push(module);
                    }
                }
                _ => {}
            }
        }

        // Tolerate a final module without its terminator record.
        if let Some(module) = current.take() {
            modules.push(module);
        }

        log::debug!(
            "dir stream: project={:?}, codepage={}, {} module(s)",
            project_name,
            codepage,
            modules.len()
        );

        Ok(Self {
            project_name,
            codepage,
            modules,
        })
    }
}

/// Some writers append a reserved 0x0000 u16 to the MBCS stream name
/// record; drop it before decoding.
fn trim_reserved_suffix(bytes: &[u8]) -> &[u8] {
    if bytes.len() >= 2 && bytes[bytes.len() - 2..] == [0x00, 0x00] {
        &bytes[..bytes.len() - 2]
    } else {
        bytes
    }
}
