use crate::config::{BakeConfig, BuildSettings, CONFIG_FILE};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

// --- Helper: Locate the project by walking up to bake.toml ---
pub fn find_project_root(start: &Path) -> Result<PathBuf> {
    let start = fs::canonicalize(start)
        .with_context(|| format!("Failed to resolve directory {}", start.display()))?;
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE).is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "{} not found in {} or any parent directory.\n\n\
                💡 Tip: Run 'bake init' to create one.",
                CONFIG_FILE,
                start.display()
            )
        })
}

// --- Helper: Load Config and its timestamp ---
pub fn load_config(root: &Path) -> Result<(BakeConfig, SystemTime)> {
    let path = root.join(CONFIG_FILE);
    let text = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {} - check file permissions", path.display()))?;
    let config: BakeConfig = toml::from_str(&text)
        .with_context(|| format!("Failed to parse {} - check for syntax errors", CONFIG_FILE))?;
    let modified = fs::metadata(&path)
        .and_then(|m| m.modified())
        .with_context(|| format!("Failed to stat {}", path.display()))?;
    Ok((config, modified))
}

/// `BAKE_FORCE` / `BAKE_DRYRUN` count as set when non-empty.
fn env_flag(name: &str) -> bool {
    std::env::var_os(name).is_some_and(|v| !v.is_empty())
}

fn default_cache_dir(root: &Path) -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join("bake"))
        .unwrap_or_else(|| root.join(".cache").join("bake"))
}

// --- Helper: Turn bake.toml plus CLI flags into BuildSettings ---
pub fn settings_from_config(
    root: &Path,
    config: &BakeConfig,
    config_modified: SystemTime,
    force: bool,
    dry_run: bool,
    verbose: bool,
) -> Result<BuildSettings> {
    let build = &config.build;
    let compiler = build
        .compiler
        .clone()
        .with_context(|| format!("[build] compiler is missing from {}", CONFIG_FILE))?;
    let linker = build
        .linker
        .clone()
        .with_context(|| format!("[build] linker is missing from {}", CONFIG_FILE))?;

    let cache_dir = match &build.cache {
        Some(dir) => root.join(dir),
        None => default_cache_dir(root),
    };

    let mut settings = BuildSettings::new(compiler, linker, root.join(&build.dst), cache_dir);
    settings.emit_pch = build.emit_pch.clone();
    settings.include_pch = build.include_pch.clone();
    settings.force = force || env_flag("BAKE_FORCE");
    settings.dry_run = dry_run || env_flag("BAKE_DRYRUN");
    settings.verbose = verbose;
    settings.config_modified = Some(config_modified);
    settings.compile_commands = build.compile_commands;
    Ok(settings)
}
