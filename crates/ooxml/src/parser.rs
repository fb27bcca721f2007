//! VBA project part location and raw reads for OOXML packages.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Read, Seek};
use vba_core::{Error, Result};
use zip::ZipArchive;

/// Canonical path of the VBA project part in Excel packages.
pub const VBA_PROJECT_PART: &str = "xl/vbaProject.bin";

/// Path fragment identifying a VBA project part anywhere in a package.
pub const VBA_PROJECT_FRAGMENT: &str = "vbaProject.bin";

/// Content type declared for VBA project parts in `[Content_Types].xml`.
const VBA_CONTENT_TYPE: &str = "application/vnd.ms-office.vbaProject";

/// Locator and reader for VBA project parts in OOXML (ZIP) packages.
pub struct OoxmlParser;

impl OoxmlParser {
    /// Create a new OOXML parser.
    pub fn new() -> Self {
        Self
    }

    /// Open a package and read the raw bytes of its VBA project part.
    ///
    /// Returns [`Error::NoVbaProject`] when the package is a valid zip
    /// archive without any VBA project part.
    pub fn read_vba_project<R: Read + Seek>(&self, reader: R) -> Result<Vec<u8>> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let part = self.find_vba_part(&mut archive)?.ok_or_else(|| {
            Error::NoVbaProject("package carries no VBA project part".to_string())
        })?;
        log::debug!("VBA project part: '{}'", part);

        self.read_part_bytes(&mut archive, &part)
    }

    /// Locate the VBA project part in an open archive.
    ///
    /// The `[Content_Types].xml` declaration wins when present; otherwise
    /// entry names are scanned for the well-known part fragment.
    pub fn find_vba_part<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
    ) -> Result<Option<String>> {
        if let Some(part) = self.part_from_content_types(archive)? {
            return Ok(Some(part));
        }
        Ok(self.find_vba_entries(archive)?.into_iter().next())
    }

    /// Entry names containing the VBA part fragment, in archive order.
    pub fn find_vba_entries<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
    ) -> Result<Vec<String>> {
        let mut matches = Vec::new();
        for index in 0..archive.len() {
            let entry = archive.by_index(index).map_err(|e| {
                Error::ZipError(format!("Failed to read archive entry {}: {}", index, e))
            })?;
            if entry.name().contains(VBA_PROJECT_FRAGMENT) {
                matches.push(entry.name().to_string());
            }
        }
        Ok(matches)
    }

    /// Read the raw bytes of a package part.
    pub fn read_part_bytes<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<Vec<u8>> {
        let mut file = archive.by_name(path).map_err(|e| {
            Error::ZipError(format!("File not found in archive '{}': {}", path, e))
        })?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(data)
    }

    /// Look up the part declared with the VBA content type.
    fn part_from_content_types<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
    ) -> Result<Option<String>> {
        let content = match self.read_text_part(archive, "[Content_Types].xml") {
            Ok(content) => content,
            Err(e) => {
                // Packages missing the content types part still get the
                // entry-name scan.
                log::debug!("content types unavailable: {}", e);
                return Ok(None);
            }
        };

        let mut reader = Reader::from_str(&content);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.name().as_ref() == b"Override" =>
                {
                    let mut part_name = String::new();
                    let mut content_type = String::new();

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"PartName" => {
                                part_name = String::from_utf8_lossy(&attr.value).to_string();
                            }
                            b"ContentType" => {
                                content_type =
                                    String::from_utf8_lossy(&attr.value).to_string();
                            }
                            _ => {}
                        }
                    }

                    if content_type == VBA_CONTENT_TYPE && !part_name.is_empty() {
                        // Part names are package-absolute ("/xl/vbaProject.bin").
                        return Ok(Some(part_name.trim_start_matches('/').to_string()));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing content types: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        Ok(None)
    }

    /// Read a text part from the archive.
    fn read_text_part<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive.by_name(path).map_err(|e| {
            Error::ZipError(format!("File not found in archive '{}': {}", path, e))
        })?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for OoxmlParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const TYPES_WITH_VBA: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.ms-excel.sheet.macroEnabled.main+xml"/>
  <Override PartName="/xl/vbaProject.bin" ContentType="application/vnd.ms-office.vbaProject"/>
</Types>"#;

    const TYPES_WITHOUT_VBA: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
</Types>"#;

    fn build_package(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_part_found_via_content_types() {
        let package = build_package(&[
            ("[Content_Types].xml", TYPES_WITH_VBA.as_bytes()),
            ("xl/workbook.xml", b"<workbook/>"),
            ("xl/vbaProject.bin", b"\xD0\xCF\x11\xE0fake"),
        ]);

        let parser = OoxmlParser::new();
        let mut archive = ZipArchive::new(Cursor::new(package)).unwrap();
        let part = parser.find_vba_part(&mut archive).unwrap();
        assert_eq!(part.as_deref(), Some(VBA_PROJECT_PART));
    }

    #[test]
    fn test_content_types_declaration_wins_over_scan() {
        // Nonstandard part name that the fragment scan would never find.
        let types = TYPES_WITH_VBA.replace("/xl/vbaProject.bin", "/macros/project.bin");
        let package = build_package(&[
            ("[Content_Types].xml", types.as_bytes()),
            ("macros/project.bin", b"blob"),
            ("xl/vbaProject.bin", b"decoy"),
        ]);

        let parser = OoxmlParser::new();
        let mut archive = ZipArchive::new(Cursor::new(package)).unwrap();
        let part = parser.find_vba_part(&mut archive).unwrap();
        assert_eq!(part.as_deref(), Some("macros/project.bin"));
    }

    #[test]
    fn test_part_found_via_name_scan_without_content_types() {
        let package = build_package(&[
            ("word/document.xml", b"<document/>"),
            ("word/vbaProject.bin", b"blob"),
        ]);

        let parser = OoxmlParser::new();
        let mut archive = ZipArchive::new(Cursor::new(package)).unwrap();
        let part = parser.find_vba_part(&mut archive).unwrap();
        assert_eq!(part.as_deref(), Some("word/vbaProject.bin"));
    }

    #[test]
    fn test_package_without_vba_part() {
        let package = build_package(&[
            ("[Content_Types].xml", TYPES_WITHOUT_VBA.as_bytes()),
            ("xl/workbook.xml", b"<workbook/>"),
        ]);

        let parser = OoxmlParser::new();
        let mut archive = ZipArchive::new(Cursor::new(package.clone())).unwrap();
        assert_eq!(parser.find_vba_part(&mut archive).unwrap(), None);

        let err = parser.read_vba_project(Cursor::new(package)).unwrap_err();
        assert!(matches!(err, Error::NoVbaProject(_)));
    }

    #[test]
    fn test_read_vba_project_returns_exact_bytes() {
        let blob: Vec<u8> = (0..=255u8).cycle().take(2048).collect();
        let package = build_package(&[
            ("[Content_Types].xml", TYPES_WITH_VBA.as_bytes()),
            ("xl/vbaProject.bin", &blob),
        ]);

        let bytes = OoxmlParser::new()
            .read_vba_project(Cursor::new(package))
            .unwrap();
        assert_eq!(bytes, blob);
    }

    #[test]
    fn test_find_vba_entries_keeps_archive_order() {
        let package = build_package(&[
            ("xl/vbaProject.bin", b"first"),
            ("xl/media/image1.png", b"png"),
            ("word/vbaProject.bin", b"second"),
        ]);

        let parser = OoxmlParser::new();
        let mut archive = ZipArchive::new(Cursor::new(package)).unwrap();
        let entries = parser.find_vba_entries(&mut archive).unwrap();
        assert_eq!(entries, ["xl/vbaProject.bin", "word/vbaProject.bin"]);
    }

    #[test]
    fn test_rejects_non_zip_input() {
        let err = OoxmlParser::new()
            .read_vba_project(Cursor::new(b"not a zip archive".to_vec()))
            .unwrap_err();
        assert!(matches!(err, Error::ZipError(_)));
    }
}
