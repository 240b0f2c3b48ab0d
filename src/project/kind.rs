use std::path::Path;

/// Per-language knowledge the build core needs: which files are tracked, which
/// are compiled, and which system includes imply link libraries.
pub trait ProjectKind: Send + Sync {
    /// Short name used in messages
    fn name(&self) -> &'static str;

    fn is_header(&self, path: &Path) -> bool;

    fn is_compiled(&self, path: &Path) -> bool;

    fn is_tracked(&self, path: &Path) -> bool {
        self.is_header(path) || self.is_compiled(path)
    }

    /// Maps system includes (`<...>` form, brackets kept) to library names.
    fn link_libraries(&self, system_deps: &[&str]) -> Vec<String>;
}

const HEADER_EXTS: &[&str] = &["h", "hpp", "hxx", "hh"];
const SOURCE_EXTS: &[&str] = &["c", "cpp", "cxx", "cc"];

const MATH_HEADERS: &[&str] = &["<math>", "<cmath>", "<math.h>"];
const CXX_STD_HEADERS: &[&str] = &[
    "<iostream>",
    "<string>",
    "<concepts>",
    "<utility>",
    "<map>",
    "<vector>",
    "<type_traits>",
    "<memory>",
    "<sstream>",
];

/// C and C++ trees.
#[derive(Debug, Default, Clone, Copy)]
pub struct CProject;

fn has_ext(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| exts.contains(&e))
}

impl ProjectKind for CProject {
    fn name(&self) -> &'static str {
        "c/c++"
    }

    fn is_header(&self, path: &Path) -> bool {
        has_ext(path, HEADER_EXTS)
    }

    fn is_compiled(&self, path: &Path) -> bool {
        has_ext(path, SOURCE_EXTS)
    }

    fn link_libraries(&self, system_deps: &[&str]) -> Vec<String> {
        let mut libs = Vec::new();

        if system_deps.iter().any(|d| MATH_HEADERS.contains(d)) {
            libs.push("m".to_string());
        }

        if system_deps
            .iter()
            .any(|d| d.starts_with("<CL/") || d.starts_with("<OpenCL/"))
        {
            libs.push("OpenCL".to_string());
        }

        if system_deps.iter().any(|d| CXX_STD_HEADERS.contains(d)) {
            libs.push("stdc++".to_string());
        }

        libs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensions() {
        let kind = CProject;
        assert!(kind.is_header(Path::new("/p/a.hpp")));
        assert!(kind.is_compiled(Path::new("/p/a.cc")));
        assert!(!kind.is_tracked(Path::new("/p/README.md")));
        assert!(!kind.is_tracked(Path::new("/p/Makefile")));
    }

    #[test]
    fn test_link_libraries() {
        let kind = CProject;
        assert_eq!(
            kind.link_libraries(&["<cmath>", "<vector>", "<CL/cl2.hpp>"]),
            vec!["m", "OpenCL", "stdc++"]
        );
        assert!(kind.link_libraries(&["<stdio.h>"]).is_empty());
    }
}
