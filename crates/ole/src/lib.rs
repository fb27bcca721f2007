//! OLE/CFB VBA project parser backend for VBA macro extraction.
//!
//! Reads VBA projects out of Microsoft Compound File Binary containers,
//! which covers both legacy workbooks (.xls, project nested under
//! `_VBA_PROJECT_CUR`) and the raw `vbaProject.bin` part embedded in
//! Office Open XML packages.

pub mod codepage;
pub mod compression;
pub mod dir;
pub mod parser;

pub use compression::{compress, decompress};
pub use dir::DirStream;
pub use parser::VbaProjectParser;
