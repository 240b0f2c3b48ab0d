//! Build roles and per-executable object sets.
//!
//! The head annotation (`//! exe name`, `//! lib name`, `//! pch`) is parsed
//! once into [`TargetRole`]; nothing downstream looks at the raw text again.

use crate::error::BuildError;
use crate::project::{
    FileId, ProjectIndex, ProjectKind, SourceFile, is_relative_marked, is_system,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetRole {
    Regular,
    ExecutableEntry { name: Option<String> },
    LibraryHead { name: Option<String> },
    LibraryPart { name: Option<String> },
    PrecompiledHeader,
}

impl TargetRole {
    pub fn classify(file: &SourceFile, kind: &dyn ProjectKind) -> Self {
        let tokens: Vec<&str> = file.head.as_deref().unwrap_or("").split_whitespace().collect();
        let name = tokens.get(1).map(|s| s.to_string());

        match tokens.first().copied() {
            Some("exe") => TargetRole::ExecutableEntry { name },
            Some("lib") if kind.is_header(&file.path) => TargetRole::LibraryHead { name },
            Some("lib") => TargetRole::LibraryPart { name },
            Some("pch") => TargetRole::PrecompiledHeader,
            _ if file.has_entry_point && kind.is_compiled(&file.path) => {
                TargetRole::ExecutableEntry { name: None }
            }
            _ => TargetRole::Regular,
        }
    }

    pub fn is_executable(&self) -> bool {
        matches!(self, TargetRole::ExecutableEntry { .. })
    }

    pub fn explicit_name(&self) -> Option<&str> {
        match self {
            TargetRole::ExecutableEntry { name }
            | TargetRole::LibraryHead { name }
            | TargetRole::LibraryPart { name } => name.as_deref(),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TargetRole::Regular => "regular",
            TargetRole::ExecutableEntry { .. } => "exe",
            TargetRole::LibraryHead { .. } => "lib-head",
            TargetRole::LibraryPart { .. } => "lib-part",
            TargetRole::PrecompiledHeader => "pch",
        }
    }
}

/// Roles of every file in an index, plus the queries built on them.
pub struct Targets<'a> {
    index: &'a ProjectIndex,
    kind: &'a dyn ProjectKind,
    roles: Vec<TargetRole>,
}

impl<'a> Targets<'a> {
    pub fn new(index: &'a ProjectIndex, kind: &'a dyn ProjectKind) -> Self {
        let roles = index
            .iter()
            .map(|(_, f)| TargetRole::classify(f, kind))
            .collect();
        Self { index, kind, roles }
    }

    pub fn role(&self, id: FileId) -> &TargetRole {
        &self.roles[id.0]
    }

    pub fn is_compiled(&self, id: FileId) -> bool {
        self.kind.is_compiled(&self.index.get(id).path)
    }

    pub fn compiled_units(&self) -> Vec<FileId> {
        self.index
            .iter()
            .map(|(id, _)| id)
            .filter(|&id| self.is_compiled(id))
            .collect()
    }

    pub fn executables(&self) -> Vec<FileId> {
        self.index
            .iter()
            .map(|(id, _)| id)
            .filter(|&id| self.role(id).is_executable())
            .collect()
    }

    /// Files annotated as libraries, heads and parts alike.
    pub fn libraries(&self) -> Vec<FileId> {
        self.index
            .iter()
            .map(|(id, _)| id)
            .filter(|&id| {
                matches!(
                    self.role(id),
                    TargetRole::LibraryHead { .. } | TargetRole::LibraryPart { .. }
                )
            })
            .collect()
    }

    /// The single precompiled header, if any. Two or more is an error.
    pub fn precompiled_header(&self) -> Result<Option<FileId>, BuildError> {
        let pch: Vec<FileId> = self
            .index
            .iter()
            .map(|(id, _)| id)
            .filter(|&id| *self.role(id) == TargetRole::PrecompiledHeader)
            .collect();

        match pch.as_slice() {
            [] => Ok(None),
            [one] => Ok(Some(*one)),
            many => Err(BuildError::MultiplePch(
                many.iter().map(|&id| self.index.get(id).path.clone()).collect(),
            )),
        }
    }

    /// Annotated name, or the base name of the file's directory.
    pub fn target_name(&self, id: FileId) -> String {
        if let Some(name) = self.role(id).explicit_name() {
            return name.to_string();
        }
        let file = self.index.get(id);
        file.dir()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "a.out".to_string())
    }

    pub fn find_executable(&self, name: &str) -> Result<FileId, BuildError> {
        let matches: Vec<FileId> = self
            .executables()
            .into_iter()
            .filter(|&id| self.target_name(id) == name)
            .collect();

        match matches.as_slice() {
            [] => Err(BuildError::TargetNotFound(name.to_string())),
            [one] => Ok(*one),
            many => Err(BuildError::TargetAmbiguous {
                name: name.to_string(),
                candidates: many.iter().map(|&id| self.index.get(id).path.clone()).collect(),
            }),
        }
    }

    /// Fails when two executables would link to the same output name.
    pub fn ensure_unique_names(&self) -> Result<(), BuildError> {
        let mut by_name: BTreeMap<String, Vec<FileId>> = BTreeMap::new();
        for id in self.executables() {
            by_name.entry(self.target_name(id)).or_default().push(id);
        }
        match by_name.into_iter().find(|(_, ids)| ids.len() > 1) {
            Some((name, ids)) => Err(BuildError::TargetAmbiguous {
                name,
                candidates: ids.iter().map(|&id| self.index.get(id).path.clone()).collect(),
            }),
            None => Ok(()),
        }
    }

    /// Compiled units linked into the executable whose entry is `entry`.
    ///
    /// Directory-locality approximation: every `Regular` compiled file that
    /// sits in the entry's directory or in a directory of one of its resolved
    /// dependencies, plus the entry itself. Sorted by path.
    pub fn object_closure(&self, entry: FileId) -> Vec<FileId> {
        let file = self.index.get(entry);
        let dirs: BTreeSet<&Path> = std::iter::once(file.dir())
            .chain(file.deps().iter().map(|d| self.index.get(d.file).dir()))
            .collect();

        let mut closure: BTreeSet<FileId> = self
            .index
            .iter()
            .filter(|(id, f)| {
                *self.role(*id) == TargetRole::Regular
                    && self.is_compiled(*id)
                    && dirs.contains(f.dir())
            })
            .map(|(id, _)| id)
            .collect();

        if self.is_compiled(entry) {
            closure.insert(entry);
        }

        // FileId order is path order
        closure.into_iter().collect()
    }

    /// Library names implied by the system includes reachable from `files`.
    pub fn link_libraries(&self, files: &[FileId]) -> Vec<String> {
        let mut system: BTreeSet<&str> = BTreeSet::new();
        for &id in files {
            system.extend(
                self.index
                    .deep_raw_deps(id)
                    .into_iter()
                    .filter(|d| is_system(d)),
            );
        }
        let system: Vec<&str> = system.into_iter().collect();
        self.kind.link_libraries(&system)
    }

    /// Extra include directories a compiler needs for `id`: for every
    /// dependency found by suffix match, the directory the raw include is
    /// relative to. The file's own directory is implied and left out.
    pub fn include_dirs(&self, id: FileId) -> Vec<PathBuf> {
        let file = self.index.get(id);
        let mut dirs = BTreeSet::new();

        for dep in file.deps() {
            let raw = Path::new(&dep.raw);
            if is_relative_marked(&dep.raw) || raw.is_absolute() {
                continue;
            }
            let dep_path = &self.index.get(dep.file).path;
            let depth = raw.components().count();
            if let Some(dir) = dep_path.ancestors().nth(depth)
                && dir != file.dir()
            {
                dirs.insert(dir.to_path_buf());
            }
        }

        dirs.into_iter().collect()
    }
}

pub fn render_include_flags(dirs: &[PathBuf]) -> String {
    dirs.iter()
        .map(|d| format!("-I {}", d.display()))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_lib_flags(libs: &[String]) -> String {
    libs.iter()
        .map(|l| format!("-l{}", l))
        .collect::<Vec<_>>()
        .join(" ")
}
