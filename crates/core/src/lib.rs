//! Core domain types, error handling, and module naming for VBA macro
//! extraction from Office container files.

pub mod error;
pub mod sanitize;
pub mod types;

pub use error::{Error, Result};
pub use sanitize::{module_file_name, sanitize_module_name};
pub use types::{ContainerFormat, ModuleKind, VbaModule, VbaProject};
