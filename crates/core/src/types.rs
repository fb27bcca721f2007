//! Domain types for representing extracted VBA macro content.

use crate::sanitize::module_file_name;

/// A parsed VBA project with its extracted modules.
#[derive(Debug, Clone)]
pub struct VbaProject {
    /// Project name from the dir stream, if recorded.
    pub name: Option<String>,

    /// Windows codepage the project's MBCS strings were decoded with.
    pub codepage: u16,

    /// Modules in dir-stream order.
    pub modules: Vec<VbaModule>,
}

impl VbaProject {
    /// Create an empty project with the given codepage.
    pub fn new(codepage: u16) -> Self {
        Self {
            name: None,
            codepage,
            modules: Vec::new(),
        }
    }

    /// Add a module to the project.
    pub fn add_module(&mut self, module: VbaModule) {
        self.modules.push(module);
    }

    /// Number of modules in the project.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }
}

/// The container format of the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    /// Office Open XML package (ZIP archive, e.g. .xlsm/.xlam).
    OpenXml,
    /// Legacy OLE/CFB compound file (e.g. .xls, raw vbaProject.bin).
    OleCompound,
}

impl ContainerFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "xlsm" | "xlam" | "xlsx" | "xlsb" => Some(Self::OpenXml),
            "xls" | "xla" | "bin" => Some(Self::OleCompound),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // OOXML packages are ZIP files (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::OpenXml);
        }

        // Compound files start with D0 CF 11 E0 A1 B1 1A E1
        if bytes.len() >= 8
            && bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
        {
            return Some(Self::OleCompound);
        }

        None
    }
}

/// The kind of a VBA module, inferred from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    /// Standard code module (.bas).
    Standard,
    /// Class module (.cls).
    Class,
    /// UserForm module (.frm).
    Form,
}

impl ModuleKind {
    /// Classify a module by its naming convention.
    ///
    /// First-match rule: names starting with `Class` are class modules,
    /// names starting with `Form` or `UserForm` are form modules, and
    /// everything else is a standard module.
    pub fn from_module_name(name: &str) -> Self {
        if name.starts_with("Class") {
            Self::Class
        } else if name.starts_with("Form") || name.starts_with("UserForm") {
            Self::Form
        } else {
            Self::Standard
        }
    }

    /// Output file extension for this module kind (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Standard => "bas",
            Self::Class => "cls",
            Self::Form => "frm",
        }
    }
}

/// A single extracted VBA module.
#[derive(Debug, Clone)]
pub struct VbaModule {
    /// Module name from the dir stream.
    pub name: String,

    /// Name of the compound-file stream the source was read from.
    pub stream_name: String,

    /// Module kind inferred from the name.
    pub kind: ModuleKind,

    /// Decompressed, decoded source text.
    pub source: String,
}

impl VbaModule {
    /// Create a module, classifying its kind from the name.
    pub fn new(
        name: impl Into<String>,
        stream_name: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let kind = ModuleKind::from_module_name(&name);
        Self {
            name,
            stream_name: stream_name.into(),
            kind,
            source: source.into(),
        }
    }

    /// Whether the module carries any source text at all.
    pub fn has_source(&self) -> bool {
        !self.source.is_empty()
    }

    /// Sanitized output file name for this module.
    pub fn file_name(&self) -> String {
        module_file_name(&self.name, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ContainerFormat::from_extension("xlsm"),
            Some(ContainerFormat::OpenXml)
        );
        assert_eq!(
            ContainerFormat::from_extension("XLAM"),
            Some(ContainerFormat::OpenXml)
        );
        assert_eq!(
            ContainerFormat::from_extension("xls"),
            Some(ContainerFormat::OleCompound)
        );
        assert_eq!(
            ContainerFormat::from_extension("bin"),
            Some(ContainerFormat::OleCompound)
        );
        assert_eq!(ContainerFormat::from_extension("txt"), None);
    }

    #[test]
    fn test_format_from_magic() {
        let zip = [0x50, 0x4B, 0x03, 0x04, 0x14, 0x00];
        assert_eq!(
            ContainerFormat::from_magic(&zip),
            Some(ContainerFormat::OpenXml)
        );

        let ole = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
        assert_eq!(
            ContainerFormat::from_magic(&ole),
            Some(ContainerFormat::OleCompound)
        );

        assert_eq!(ContainerFormat::from_magic(&[0x00, 0x01, 0x02, 0x03]), None);
        assert_eq!(ContainerFormat::from_magic(&[0xD0, 0xCF]), None);
    }

    #[test]
    fn test_module_kind_from_name() {
        assert_eq!(ModuleKind::from_module_name("Module1"), ModuleKind::Standard);
        assert_eq!(ModuleKind::from_module_name("Class1"), ModuleKind::Class);
        assert_eq!(
            ModuleKind::from_module_name("ClassHelper"),
            ModuleKind::Class
        );
        assert_eq!(ModuleKind::from_module_name("Form1"), ModuleKind::Form);
        assert_eq!(ModuleKind::from_module_name("UserForm1"), ModuleKind::Form);
        assert_eq!(
            ModuleKind::from_module_name("ThisWorkbook"),
            ModuleKind::Standard
        );
        // Case-sensitive prefix match
        assert_eq!(ModuleKind::from_module_name("class1"), ModuleKind::Standard);
    }

    #[test]
    fn test_module_kind_extension() {
        assert_eq!(ModuleKind::Standard.extension(), "bas");
        assert_eq!(ModuleKind::Class.extension(), "cls");
        assert_eq!(ModuleKind::Form.extension(), "frm");
    }

    #[test]
    fn test_module_classifies_kind_on_construction() {
        let module = VbaModule::new("UserForm2", "UserForm2", "Sub A()\nEnd Sub");
        assert_eq!(module.kind, ModuleKind::Form);
        assert_eq!(module.file_name(), "UserForm2.frm");
    }

    #[test]
    fn test_module_has_source() {
        assert!(VbaModule::new("Module1", "Module1", "Sub A()\nEnd Sub").has_source());
        // Whitespace still counts as source; only truly empty modules lack it.
        assert!(VbaModule::new("Module1", "Module1", "  \r\n\t").has_source());
        assert!(!VbaModule::new("Module1", "Module1", "").has_source());
    }

    #[test]
    fn test_project_accumulates_modules() {
        let mut project = VbaProject::new(1252);
        assert_eq!(project.module_count(), 0);
        project.add_module(VbaModule::new("Module1", "Module1", "Sub A()\nEnd Sub"));
        project.add_module(VbaModule::new("Class1", "Class1", ""));
        assert_eq!(project.module_count(), 2);
        assert_eq!(project.modules[1].kind, ModuleKind::Class);
    }
}
