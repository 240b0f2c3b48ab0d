//! # bake CLI Entry Point
//!
//! Parses CLI arguments using clap, locates the project (the nearest
//! directory holding `bake.toml`) and routes commands to the library.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use bake::build::{self, Builder};
use bake::config::{self, CONFIG_FILE};
use bake::project::CProject;
use bake::tree;

#[derive(Parser)]
#[command(name = "bake")]
#[command(about = "Convention-driven C/C++ builder", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Run as if started in this directory
    #[arg(short = 'C', long = "dir", global = true, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile and link everything stale, or one executable
    Build {
        /// Executable to build (defaults to all)
        target: Option<String>,
        /// Rebuild everything regardless of timestamps
        #[arg(long)]
        force: bool,
        /// Show what would be executed without running
        #[arg(long)]
        dry_run: bool,
        /// Explain why each artifact is rebuilt
        #[arg(short, long)]
        verbose: bool,
    },
    /// List executables and libraries with their status
    Targets,
    /// Show the resolved include tree
    Deps {
        /// Source file (path or trailing part of it); defaults to all targets
        file: Option<String>,
    },
    /// Remove this project's objects and executables
    Clean,
    /// Rebuild on file changes
    Watch {
        /// Executable to rebuild (defaults to all)
        target: Option<String>,
    },
    /// Write a starter bake.toml
    Init,
    /// Generate shell completion scripts
    Completion { shell: Shell },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Build {
            target,
            force,
            dry_run,
            verbose,
        }) => {
            let builder = open_project(&cli.dir, *force, *dry_run, *verbose)?;
            if !run_build(&builder, target.as_deref()) {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Commands::Targets) => {
            let builder = open_project(&cli.dir, false, false, false)?;
            print_targets(&builder);
            Ok(())
        }
        Some(Commands::Deps { file }) => {
            let builder = open_project(&cli.dir, false, false, false)?;
            tree::print_deps(&builder, file.as_deref())
        }
        Some(Commands::Clean) => {
            let builder = open_project(&cli.dir, false, false, false)?;
            build::clean(&builder).map(|_| ())
        }
        Some(Commands::Watch { target }) => {
            let root = build::find_project_root(&cli.dir)?;
            build::watch(&root, target.as_deref(), || {
                open_project(&root, false, false, false)
            })
        }
        Some(Commands::Init) => init_project(&cli.dir),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, bin_name, &mut std::io::stdout());
            Ok(())
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

/// Finds the project above `dir`, loads its config and scans the tree.
fn open_project(dir: &Path, force: bool, dry_run: bool, verbose: bool) -> Result<Builder> {
    let root = build::find_project_root(dir)?;
    let (config, modified) = build::load_config(&root)?;
    let settings =
        build::settings_from_config(&root, &config, modified, force, dry_run, verbose)?;
    let builder = Builder::new(&root, settings, Box::new(CProject))
        .with_context(|| format!("Failed to scan {}", root.display()))?;
    Ok(builder)
}

fn run_build(builder: &Builder, target: Option<&str>) -> bool {
    let settings = builder.settings();
    if settings.dry_run {
        println!("{} Dry run: nothing will be executed", "!".yellow());
    }
    if settings.force {
        println!("{} Forcing a full rebuild", "⚙".cyan());
    }
    if settings.verbose {
        println!(
            "   {} {} project, {} tracked file(s) under {}",
            "🔧".cyan(),
            builder.kind().name(),
            builder.index().len(),
            builder.index().root().display()
        );
    }

    let start = Instant::now();
    let result = match target {
        Some(name) => builder.build_target(name),
        None => builder.build(),
    };

    match result {
        Ok(outcome) if outcome.up_to_date() => {
            println!("{} Up to date", "⚡".green());
            true
        }
        Ok(outcome) => {
            println!(
                "{} Build finished in {:.2}s ({} compiled, {} linked)",
                "✓".green(),
                start.elapsed().as_secs_f64(),
                outcome.compiled,
                outcome.linked
            );
            true
        }
        Err(e) => {
            eprintln!("{} Build failed: {}", "x".red(), e);
            false
        }
    }
}

fn print_targets(builder: &Builder) {
    let summaries = builder.summaries();
    if summaries.is_empty() {
        println!("{} No targets found", "!".yellow());
        return;
    }

    let root = builder.index().root();
    let width = summaries.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for summary in &summaries {
        let entry = summary.entry.strip_prefix(root).unwrap_or(&summary.entry);
        let status = match (&summary.output, &summary.stale) {
            (None, _) => "-".dimmed().to_string(),
            (Some(_), None) => "up to date".green().to_string(),
            (Some(_), Some(reason)) => format!("stale: {}", reason).yellow().to_string(),
        };
        println!(
            "  {}  {:<8}  {}  {}",
            format!("{:<width$}", summary.name).bold(),
            summary.role,
            entry.display().to_string().dimmed(),
            status
        );
    }
}

fn init_project(dir: &Path) -> Result<()> {
    let path = dir.join(CONFIG_FILE);
    if path.exists() {
        println!(
            "{} Error: Project already initialized ({} exists).",
            "x".red(),
            CONFIG_FILE
        );
        return Ok(());
    }

    let text = toml::to_string_pretty(&config::starter_config())
        .context("Failed to serialize starter config")?;
    fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    println!(
        "{} Created {}. Run {} to build.",
        "✓".green(),
        CONFIG_FILE,
        "bake build".bold().white()
    );
    Ok(())
}
