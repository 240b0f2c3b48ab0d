//! Build artifact cleanup.
//!
//! The object cache is shared between projects, so artifacts are matched by
//! decoding their names back to source paths and keeping only those under
//! this project's root. Linked executables are removed by target name.

use super::core::Builder;
use super::layout::decode_artifact_name;
use anyhow::{Context, Result};
use colored::*;
use std::fs;

/// Removes this project's cached objects, precompiled header, executables
/// and `compile_commands.json`. Returns how many files were deleted.
pub fn clean(builder: &Builder) -> Result<usize> {
    let root = builder.index().root();
    let layout = builder.layout();
    let mut removed = 0;

    if layout.cache_dir.exists() {
        let entries = fs::read_dir(&layout.cache_dir).with_context(|| {
            format!("Failed to read cache directory {}", layout.cache_dir.display())
        })?;

        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(source) = decode_artifact_name(&name)
                && source.starts_with(root)
            {
                fs::remove_file(entry.path())
                    .with_context(|| format!("Failed to remove {}", entry.path().display()))?;
                removed += 1;
            }
        }
    }

    let targets = builder.targets();
    for id in targets.executables() {
        let exe = layout.executable_path(&targets.target_name(id));
        if exe.exists() {
            fs::remove_file(&exe).with_context(|| format!("Failed to remove {}", exe.display()))?;
            println!("   {} Removed {}", "🗑️".red(), exe.display());
            removed += 1;
        }
    }

    let compdb = root.join(super::compdb::COMPDB_FILE);
    if compdb.exists() {
        fs::remove_file(&compdb).context("Failed to remove compile_commands.json")?;
        removed += 1;
    }

    if removed > 0 {
        println!("{} Clean complete ({} file(s)).", "✓".green(), removed);
    } else {
        println!("{} Nothing to clean", "!".yellow());
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildSettings;
    use crate::project::CProject;

    #[test]
    fn test_clean_only_touches_own_artifacts() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let base = fs::canonicalize(dir.path())?;
        let root = base.join("proj");
        fs::create_dir_all(&root)?;
        fs::write(root.join("main.cpp"), "//! exe app\nint main() {}\n")?;

        let settings = BuildSettings::new(
            "cc {include} -c {source} -o {output}",
            "cc {objects} -o {output} {libs}",
            base.join("bin"),
            base.join("cache"),
        );
        let builder = Builder::new(&root, settings, Box::new(CProject))?;
        let layout = builder.layout().clone();
        fs::create_dir_all(&layout.cache_dir)?;
        fs::create_dir_all(&layout.dst_dir)?;

        let own = layout.object_path(&root.join("main.cpp"));
        let foreign = layout.object_path(&base.join("elsewhere/main.cpp"));
        fs::write(&own, "o")?;
        fs::write(&foreign, "o")?;
        fs::write(layout.executable_path("app"), "x")?;

        assert_eq!(clean(&builder)?, 2);
        assert!(!own.exists());
        assert!(foreign.exists());
        assert!(!layout.executable_path("app").exists());
        Ok(())
    }
}
