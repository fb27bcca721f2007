//! VBA project parser for OLE/CFB compound files.
//!
//! Handles both layouts seen in the wild: a project at the container root
//! (the `vbaProject.bin` part of an OOXML package) and a project nested
//! inside a document storage (`_VBA_PROJECT_CUR` in legacy .xls workbooks,
//! `Macros` in legacy Word documents). The project root is wherever a
//! `VBA/dir` stream lives.

use cfb::CompoundFile;
use std::io::{Read, Seek};
use vba_core::{Error, Result, VbaModule, VbaProject};

use crate::codepage::decode_mbcs;
use crate::compression::decompress;
use crate::dir::DirStream;

/// Parser for VBA projects stored in OLE/CFB compound files.
pub struct VbaProjectParser;

impl VbaProjectParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self
    }

    /// Check whether a compound file holds a VBA project at any depth.
    pub fn detect<R: Read + Seek>(&self, reader: R) -> Result<bool> {
        let cfb = CompoundFile::open(reader)
            .map_err(|e| Error::CfbError(format!("Failed to open CFB container: {}", e)))?;
        Ok(find_project_root(&cfb).is_some())
    }

    /// Parse the VBA project out of a compound file.
    ///
    /// Returns [`Error::NoVbaProject`] when the container is a valid
    /// compound file that simply carries no project.
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<VbaProject> {
        let mut cfb = CompoundFile::open(reader)
            .map_err(|e| Error::CfbError(format!("Failed to open CFB container: {}", e)))?;

        let root = find_project_root(&cfb).ok_or_else(|| {
            Error::NoVbaProject("compound file has no VBA/dir stream".to_string())
        })?;
        log::debug!("VBA project root storage: '{}'", root);

        let dir_bytes = read_stream(&mut cfb, &format!("{}VBA/dir", root))?;
        let dir = DirStream::parse(&decompress(&dir_bytes)?)?;

        let mut project = VbaProject::new(dir.codepage);
        project.name = dir.project_name.clone();

        for record in &dir.modules {
            let stream_path = format!("{}VBA/{}", root, record.stream_name());
            let stream = read_stream(&mut cfb, &stream_path)?;
            let source =
                module_source(&stream, record.text_offset, dir.codepage).map_err(|e| {
                    Error::ProjectParseError(format!(
                        "module '{}': {}",
                        record.name, e
                    ))
                })?;
            project.add_module(VbaModule::new(
                record.name.clone(),
                record.stream_name(),
                source,
            ));
        }

        log::debug!(
            "parsed VBA project {:?} with {} module(s)",
            project.name,
            project.module_count()
        );
        Ok(project)
    }
}

impl Default for VbaProjectParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Locate the storage prefix holding the `VBA/dir` stream.
///
/// Returns the prefix with a trailing slash (`"/"` for a root-level
/// project, `"/_VBA_PROJECT_CUR/"` for a legacy workbook), or `None`
/// when the container has no VBA project.
fn find_project_root<R: Read + Seek>(cfb: &CompoundFile<R>) -> Option<String> {
    for entry in cfb.walk() {
        if !entry.is_stream() {
            continue;
        }
        let path = entry.path().to_string_lossy().into_owned();
        if let Some(prefix) = path.strip_suffix("VBA/dir") {
            if prefix.ends_with('/') {
                return Some(prefix.to_string());
            }
        }
    }
    None
}

/// Read a whole stream out of the compound file.
fn read_stream<R: Read + Seek>(cfb: &mut CompoundFile<R>, path: &str) -> Result<Vec<u8>> {
    let mut stream = cfb
        .open_stream(path)
        .map_err(|e| Error::CfbError(format!("Failed to open stream '{}': {}", path, e)))?;
    let mut data = Vec::new();
    stream
        .read_to_end(&mut data)
        .map_err(|e| Error::CfbError(format!("Failed to read stream '{}': {}", path, e)))?;
    Ok(data)
}

/// Decompress and decode the source portion of a module stream.
fn module_source(stream: &[u8], text_offset: Option<usize>, codepage: u16) -> Result<String> {
    let offset = match text_offset {
        Some(offset) if offset <= stream.len() => offset,
        Some(offset) => {
            return Err(Error::ProjectParseError(format!(
                "text offset {} exceeds stream length {}",
                offset,
                stream.len()
            )));
        }
        None => find_source_offset(stream).ok_or_else(|| {
            Error::ProjectParseError(
                "stream holds no recognizable compressed source".to_string(),
            )
        })?,
    };

    if offset == stream.len() {
        return Ok(String::new());
    }

    let source = decompress(&stream[offset..])?;
    Ok(decode_mbcs(&source, codepage))
}

/// A module without a MODULETEXTOFFSET record leaves the source position
/// unknown; scan for the first position that decompresses as a container.
fn find_source_offset(stream: &[u8]) -> Option<usize> {
    for idx in 0..stream.len() {
        if stream[idx] != 0x01 || idx + 3 > stream.len() {
            continue;
        }
        let header = u16::from_le_bytes([stream[idx + 1], stream[idx + 2]]);
        if (header >> 12) & 0x07 != 0b011 {
            continue;
        }
        if decompress(&stream[idx..]).is_ok() {
            return Some(idx);
        }
    }
    None
}
