//! Dependency tree visualization.
//!
//! This module provides the `bake deps` command which displays the resolved
//! include graph in a hierarchical, ASCII tree format.
//!
//! ## Example Output
//!
//! ```text
//! app/main.cpp
//! ├── app/window.h
//! │   └── common/util.h
//! ├── common/util.h (*)
//! └── <vector>
//! ```
//!
//! `(*)` marks a file already expanded above, `(cycle)` an include that leads
//! back into its own ancestry.

use crate::build::Builder;
use crate::project::{FileId, ProjectIndex};
use anyhow::{Result, bail};
use colored::*;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Plain-text tree of everything `id` includes. Unresolved local includes
/// are listed with a `?` so gaps in resolution are visible.
pub fn render_tree(index: &ProjectIndex, id: FileId) -> String {
    let mut out = display_path(index, id);
    out.push('\n');
    let mut expanded = HashSet::from([id]);
    let mut ancestry = vec![id];
    render_children(index, id, "", &mut expanded, &mut ancestry, &mut out);
    out
}

fn render_children(
    index: &ProjectIndex,
    id: FileId,
    indent: &str,
    expanded: &mut HashSet<FileId>,
    ancestry: &mut Vec<FileId>,
    out: &mut String,
) {
    let file = index.get(id);
    let mut children: Vec<(String, Option<FileId>)> = Vec::new();
    for raw in &file.raw_deps {
        let resolved = file.deps().iter().find(|d| &d.raw == raw).map(|d| d.file);
        match resolved {
            Some(dep) if children.iter().any(|(_, c)| *c == Some(dep)) => {}
            Some(dep) => children.push((display_path(index, dep), Some(dep))),
            None if raw.starts_with('<') => children.push((raw.clone(), None)),
            None => children.push((format!("{raw} ?"), None)),
        }
    }

    let count = children.len();
    for (i, (label, dep)) in children.into_iter().enumerate() {
        let is_last = i == count - 1;
        let prefix = if is_last { "└──" } else { "├──" };
        let Some(dep) = dep else {
            out.push_str(&format!("{indent}{prefix} {label}\n"));
            continue;
        };

        if ancestry.contains(&dep) {
            out.push_str(&format!("{indent}{prefix} {label} (cycle)\n"));
        } else if !expanded.insert(dep) {
            out.push_str(&format!("{indent}{prefix} {label} (*)\n"));
        } else {
            out.push_str(&format!("{indent}{prefix} {label}\n"));
            let child_indent = format!("{indent}{}", if is_last { "    " } else { "│   " });
            ancestry.push(dep);
            render_children(index, dep, &child_indent, expanded, ancestry, out);
            ancestry.pop();
        }
    }
}

fn display_path(index: &ProjectIndex, id: FileId) -> String {
    let path = &index.get(id).path;
    path.strip_prefix(index.root())
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Accepts a path (relative to the working directory or absolute) or any
/// trailing part of a tracked file's path.
fn lookup(index: &ProjectIndex, file: &str) -> Option<FileId> {
    fs::canonicalize(Path::new(file))
        .ok()
        .and_then(|p| index.find_exact(&p))
        .or_else(|| index.find_by_suffix(file))
}

/// Prints the tree of one file plus the files that include it, or the trees
/// of every executable and library head when no file is given.
pub fn print_deps(builder: &Builder, file: Option<&str>) -> Result<()> {
    let index = builder.index();

    if let Some(file) = file {
        let Some(id) = lookup(index, file) else {
            bail!("{} is not a tracked source file in {}", file, index.root().display());
        };
        print!("{}", render_tree(index, id));

        let users = index.dependents(id);
        if !users.is_empty() {
            println!("\n{} Included by:", "↑".cyan());
            for user in users {
                println!("   {}", display_path(index, user));
            }
        }
        return Ok(());
    }

    let targets = builder.targets();
    let roots: Vec<FileId> = targets
        .executables()
        .into_iter()
        .chain(targets.libraries())
        .collect();
    if roots.is_empty() {
        println!("└── (no targets)");
        return Ok(());
    }

    for id in roots {
        println!(
            "{} {}",
            targets.target_name(id).bold().cyan(),
            format!("[{}]", targets.role(id).label()).dimmed()
        );
        print!("{}", render_tree(index, id));
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::test_support::index_of;

    #[test]
    fn test_render_shared_and_system_deps() {
        let index = index_of(
            "/p",
            &[
                (
                    "/p/main.cpp",
                    "#include \"win.h\"\n#include \"util.h\"\n#include <vector>\n",
                ),
                ("/p/win.h", "#include \"util.h\"\n"),
                ("/p/util.h", ""),
            ],
        );
        let main = index.find_exact(Path::new("/p/main.cpp")).unwrap();
        let expected = "\
main.cpp
├── win.h
│   └── util.h
├── util.h (*)
└── <vector>
";
        assert_eq!(render_tree(&index, main), expected);
    }

    #[test]
    fn test_render_terminates_on_cycles() {
        let index = index_of(
            "/p",
            &[
                ("/p/a.h", "#include \"b.h\"\n"),
                ("/p/b.h", "#include \"a.h\"\n"),
            ],
        );
        let a = index.find_exact(Path::new("/p/a.h")).unwrap();
        assert_eq!(render_tree(&index, a), "a.h\n└── b.h\n    └── a.h (cycle)\n");
    }

    #[test]
    fn test_render_marks_unresolved() {
        let index = index_of("/p", &[("/p/main.c", "#include \"gone.h\"\n")]);
        let main = index.find_exact(Path::new("/p/main.c")).unwrap();
        assert_eq!(render_tree(&index, main), "main.c\n└── gone.h ?\n");
    }

    #[test]
    fn test_lookup_by_suffix() {
        let index = index_of("/p", &[("/p/lib/util.h", ""), ("/p/main.c", "")]);
        assert_eq!(lookup(&index, "lib/util.h"), index.find_exact(Path::new("/p/lib/util.h")));
        assert_eq!(lookup(&index, "nothing.h"), None);
    }
}
