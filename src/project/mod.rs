mod file;
mod kind;
mod resolve;
mod scanner;

pub use file::{FileId, ProjectIndex, ResolvedDep, SourceFile};
pub use kind::{CProject, ProjectKind};
pub use scanner::{ScanResult, scan_source};

pub(crate) use resolve::{is_relative_marked, is_system};

#[cfg(test)]
pub(crate) use file::test_support;
