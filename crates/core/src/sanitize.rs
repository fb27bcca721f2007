//! Module name sanitization for output file naming.
//!
//! Module names come straight out of parsed container streams, so they are
//! treated as untrusted: path separators are replaced before a name is used
//! as a file name, keeping every output inside the destination directory.

use crate::types::ModuleKind;

/// Replace path separators in a module name with an inert underscore.
pub fn sanitize_module_name(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

/// Build the output file name for a module: sanitized name plus the
/// extension for its kind.
pub fn module_file_name(name: &str, kind: ModuleKind) -> String {
    format!("{}.{}", sanitize_module_name(name), kind.extension())
}
