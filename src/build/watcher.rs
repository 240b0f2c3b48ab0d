use super::core::Builder;
use super::layout::ArtifactLayout;
use crate::config::CONFIG_FILE;
use crate::project::ProjectKind;
use anyhow::Result;
use colored::*;
use notify::{Config, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

/// Rebuilds `target` (or everything) whenever a tracked source or the
/// configuration changes. `make_builder` is called again for every rebuild
/// so that new files and edited settings are picked up.
pub fn watch<F>(root: &Path, target: Option<&str>, make_builder: F) -> Result<()>
where
    F: Fn() -> Result<Builder>,
{
    println!("{} Watching for changes in {}...", "👀".cyan(), root.display());

    let (tx, rx) = channel();
    let config_notify = Config::default().with_poll_interval(Duration::from_secs(1));
    let mut watcher = notify::RecommendedWatcher::new(tx, config_notify)?;
    watcher.watch(root, RecursiveMode::Recursive)?;

    // First run
    let mut last = rebuild(&make_builder, target);

    while let Ok(event) = rx.recv() {
        let mut relevant = is_relevant(&event, last.as_ref());
        // Debounce simple
        std::thread::sleep(Duration::from_millis(100));
        while let Ok(more) = rx.try_recv() {
            relevant |= is_relevant(&more, last.as_ref());
        }
        if relevant {
            print!("\x1B[2J\x1B[1;1H");
            println!("{} File changed. Rebuilding...", "🔄".yellow());
            last = rebuild(&make_builder, target).or(last);
        }
    }
    Ok(())
}

/// Builds once and hands back the builder, whose outputs and project kind
/// decide which later events matter.
fn rebuild<F>(make_builder: &F, target: Option<&str>) -> Option<Builder>
where
    F: Fn() -> Result<Builder>,
{
    let builder = match make_builder() {
        Ok(builder) => builder,
        Err(e) => {
            println!("{} Error: {:#}", "x".red(), e);
            return None;
        }
    };

    let start = Instant::now();
    let result = match target {
        Some(name) => builder.build_target(name),
        None => builder.build(),
    };
    match result {
        Ok(outcome) if outcome.up_to_date() => println!("{} Up to date", "⚡".green()),
        Ok(_) => println!(
            "{} Build finished in {:.2}s",
            "✓".green(),
            start.elapsed().as_secs_f64()
        ),
        Err(e) => println!("{} Error: {}", "x".red(), e),
    }
    Some(builder)
}

fn is_relevant(event: &notify::Result<notify::Event>, last: Option<&Builder>) -> bool {
    let Ok(event) = event else {
        return false;
    };
    if event.kind.is_access() {
        return false;
    }
    let Some(builder) = last else {
        // nothing built yet, so any change may fix the project
        return true;
    };
    let outputs = executable_outputs(builder);
    event
        .paths
        .iter()
        .any(|path| is_watched_path(path, builder.layout(), &outputs, builder.kind()))
}

fn executable_outputs(builder: &Builder) -> Vec<PathBuf> {
    let targets = builder.targets();
    targets
        .executables()
        .into_iter()
        .map(|id| builder.layout().executable_path(&targets.target_name(id)))
        .collect()
}

/// Tracked sources and the config file, never our own outputs. Only the
/// linked executables are skipped in the output directory, which may well be
/// the project root itself.
pub(crate) fn is_watched_path(
    path: &Path,
    layout: &ArtifactLayout,
    outputs: &[PathBuf],
    kind: &dyn ProjectKind,
) -> bool {
    if layout.is_cache_artifact(path) || outputs.iter().any(|out| out == path) {
        return false;
    }
    if path.file_name().is_some_and(|n| n == CONFIG_FILE) {
        return true;
    }
    kind.is_tracked(path)
}
