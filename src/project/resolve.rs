//! Turns raw `#include` strings into file references.

use super::file::{FileId, ProjectIndex, ResolvedDep};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

impl ProjectIndex {
    /// Fills every file's dependency map. Unresolved includes are simply
    /// absent; system includes are never resolved here.
    pub(crate) fn resolve_dependencies(&mut self) {
        let resolved: Vec<Vec<ResolvedDep>> = self
            .iter()
            .map(|(id, file)| {
                let mut seen = HashSet::new();
                file.raw_deps
                    .iter()
                    .filter_map(|raw| {
                        let target = self.resolve_raw(file.dir(), raw)?;
                        (target != id && seen.insert(target)).then(|| ResolvedDep {
                            raw: raw.clone(),
                            file: target,
                        })
                    })
                    .collect()
            })
            .collect();

        for (i, deps) in resolved.into_iter().enumerate() {
            self.get_mut(FileId(i)).deps = deps;
        }
    }

    /// Resolves one raw include as seen from a file in `from_dir`.
    pub fn resolve_raw(&self, from_dir: &Path, raw: &str) -> Option<FileId> {
        if is_system(raw) {
            return None;
        }

        let as_path = Path::new(raw);
        if as_path.is_absolute() {
            self.find_exact(as_path)
        } else if is_relative_marked(raw) {
            self.find_exact(&normalize(&from_dir.join(as_path)))
        } else {
            self.find_by_suffix(raw)
        }
    }
}

pub(crate) fn is_system(raw: &str) -> bool {
    raw.starts_with('<')
}

/// `./x.h`, `../x.h` and the like: resolved against the including file.
pub(crate) fn is_relative_marked(raw: &str) -> bool {
    raw.starts_with('.')
}

/// Lexically removes `.` and `..` components.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::file::test_support::index_of;

    fn id(index: &ProjectIndex, path: &str) -> FileId {
        index.find_exact(Path::new(path)).unwrap()
    }

    fn dep_paths(index: &ProjectIndex, path: &str) -> Vec<PathBuf> {
        index
            .get(id(index, path))
            .deps()
            .iter()
            .map(|d| index.get(d.file).path.clone())
            .collect()
    }

    #[test]
    fn test_suffix_resolution() {
        let index = index_of(
            "/work",
            &[
                ("/work/app/util.cpp", "#include \"lib/util.h\"\n"),
                ("/work/project/lib/util.h", ""),
            ],
        );
        assert_eq!(
            dep_paths(&index, "/work/app/util.cpp"),
            vec![PathBuf::from("/work/project/lib/util.h")]
        );
    }

    #[test]
    fn test_relative_and_absolute_resolution() {
        let index = index_of(
            "/p",
            &[
                (
                    "/p/src/a.cpp",
                    "#include \"../inc/a.h\"\n#include \"/p/inc/b.h\"\n#include \"./missing.h\"\n",
                ),
                ("/p/inc/a.h", ""),
                ("/p/inc/b.h", ""),
            ],
        );
        assert_eq!(
            dep_paths(&index, "/p/src/a.cpp"),
            vec![PathBuf::from("/p/inc/a.h"), PathBuf::from("/p/inc/b.h")]
        );
    }

    #[test]
    fn test_system_includes_stay_raw() {
        let index = index_of(
            "/p",
            &[("/p/a.cpp", "#include <vector>\n"), ("/p/vector", "")],
        );
        let a = index.get(id(&index, "/p/a.cpp"));
        assert!(a.deps().is_empty());
        assert_eq!(a.raw_deps, vec!["<vector>".to_string()]);
    }

    #[test]
    fn test_dedup_and_self_reference() {
        let index = index_of(
            "/p",
            &[
                (
                    "/p/a.h",
                    "#include \"a.h\"\n#include \"b.h\"\n#include \"./b.h\"\n",
                ),
                ("/p/b.h", ""),
            ],
        );
        let a = index.get(id(&index, "/p/a.h"));
        assert_eq!(a.deps().len(), 1);
        assert_eq!(a.deps()[0].raw, "b.h");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d.h")), PathBuf::from("/a/c/d.h"));
    }
}
