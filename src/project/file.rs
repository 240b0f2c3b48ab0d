use super::kind::ProjectKind;
use super::scanner::{ScanResult, scan_source};
use crate::error::BuildError;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// Dense handle of a file inside one [`ProjectIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub usize);

/// One resolved `#include`: the raw string as written and the file it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDep {
    pub raw: String,
    pub file: FileId,
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub head: Option<String>,
    pub raw_deps: Vec<String>,
    pub has_entry_point: bool,
    pub(crate) deps: Vec<ResolvedDep>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, modified: SystemTime, scan: ScanResult) -> Self {
        Self {
            path: path.into(),
            modified,
            head: scan.head,
            raw_deps: scan.raw_deps,
            has_entry_point: scan.has_entry_point,
            deps: Vec::new(),
        }
    }

    /// Reads and scans one file. Any I/O failure is a fatal scan error.
    pub fn read(path: &Path, kind: &dyn ProjectKind) -> Result<Self, BuildError> {
        let scan_err = |source| BuildError::Scan {
            path: path.to_path_buf(),
            source,
        };
        let bytes = fs::read(path).map_err(scan_err)?;
        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(scan_err)?;

        Ok(Self::new(
            path,
            modified,
            scan_source(&bytes, kind.is_compiled(path)),
        ))
    }

    /// Resolved dependencies, deduplicated by destination, never `self`.
    pub fn deps(&self) -> &[ResolvedDep] {
        &self.deps
    }

    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }
}

/// Every tracked file below one project root.
#[derive(Debug)]
pub struct ProjectIndex {
    root: PathBuf,
    files: Vec<SourceFile>,
    by_path: HashMap<PathBuf, FileId>,
}

impl ProjectIndex {
    /// Scans the whole tree, then resolves dependencies. Hidden directories
    /// (`.git`, `.cache`, ...) are skipped.
    pub fn scan(root: &Path, kind: &dyn ProjectKind) -> Result<Self, BuildError> {
        let mut files = Vec::new();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

        for entry in walker {
            let entry = entry.map_err(|e| BuildError::Scan {
                path: e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf),
                source: e.into(),
            })?;

            if entry.file_type().is_file() && kind.is_tracked(entry.path()) {
                files.push(SourceFile::read(entry.path(), kind)?);
            }
        }

        Ok(Self::from_files(root, files))
    }

    /// Builds an index from already scanned files and resolves their
    /// dependencies. Resolution needs the complete file set, so it only ever
    /// happens here.
    pub fn from_files(root: &Path, mut files: Vec<SourceFile>) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|a, b| a.path == b.path);

        let by_path = files
            .iter()
            .enumerate()
            .map(|(i, f)| (f.path.clone(), FileId(i)))
            .collect();

        let mut index = Self {
            root: root.to_path_buf(),
            files,
            by_path,
        };
        index.resolve_dependencies();
        index
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, id: FileId) -> &SourceFile {
        &self.files[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: FileId) -> &mut SourceFile {
        &mut self.files[id.0]
    }

    /// All files in path order.
    pub fn iter(&self) -> impl Iterator<Item = (FileId, &SourceFile)> {
        self.files.iter().enumerate().map(|(i, f)| (FileId(i), f))
    }

    pub fn find_exact(&self, path: &Path) -> Option<FileId> {
        self.by_path.get(path).copied()
    }

    /// First file (in path order) whose path ends with `suffix`, compared
    /// component by component so `util.h` never matches `myutil.h`.
    pub fn find_by_suffix(&self, suffix: &str) -> Option<FileId> {
        let suffix = Path::new(suffix);
        self.iter()
            .find(|(_, f)| f.path.ends_with(suffix))
            .map(|(id, _)| id)
    }

    /// Raw dependency strings of `id` and everything it transitively
    /// includes. Each file contributes once, so include cycles terminate.
    pub fn deep_raw_deps(&self, id: FileId) -> Vec<&str> {
        let mut visited = HashSet::new();
        let mut out = Vec::new();
        self.collect_raw_deps(id, &mut visited, &mut out);
        out
    }

    fn collect_raw_deps<'a>(
        &'a self,
        id: FileId,
        visited: &mut HashSet<FileId>,
        out: &mut Vec<&'a str>,
    ) {
        if !visited.insert(id) {
            return;
        }
        let file = self.get(id);
        out.extend(file.raw_deps.iter().map(String::as_str));
        for dep in file.deps() {
            self.collect_raw_deps(dep.file, visited, out);
        }
    }

    /// Files whose resolved dependencies include `id`.
    pub fn dependents(&self, id: FileId) -> Vec<FileId> {
        self.iter()
            .filter(|(_, f)| f.deps.iter().any(|d| d.file == id))
            .map(|(i, _)| i)
            .collect()
    }
}
