use super::command::{CommandLine, Executor, ProcessExecutor, echo};
use super::compdb::{self, CompileEntry};
use super::layout::ArtifactLayout;
use super::scheduler::run_par;
use super::session::BuildSession;
use super::staleness::{StaleReason, StalenessCheck};
use super::target::{Targets, render_include_flags, render_lib_flags};
use super::template::fill_template;
use crate::config::BuildSettings;
use crate::error::BuildError;
use crate::project::{FileId, ProjectIndex, ProjectKind};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

/// What one invocation did (or, in dry-run mode, would have done).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub pch_built: bool,
    pub compiled: usize,
    pub linked: usize,
}

impl BuildOutcome {
    /// Nothing needed rebuilding.
    pub fn up_to_date(&self) -> bool {
        !self.pch_built && self.compiled == 0 && self.linked == 0
    }
}

/// Status line of one executable, for listings.
#[derive(Debug, Clone)]
pub struct TargetSummary {
    pub name: String,
    pub role: &'static str,
    pub entry: PathBuf,
    pub output: Option<PathBuf>,
    pub objects: usize,
    pub stale: Option<StaleReason>,
}

/// Drives scan → resolve → precompiled header → compile → link for one
/// project root.
pub struct Builder {
    index: ProjectIndex,
    kind: Box<dyn ProjectKind>,
    settings: BuildSettings,
    layout: ArtifactLayout,
    executor: Box<dyn Executor>,
}

/// Per-invocation state shared by every action of one build.
struct Pass<'a> {
    targets: Targets<'a>,
    session: &'a BuildSession,
    check: StalenessCheck<'a>,
    pch: Option<(FileId, PathBuf)>,
}

impl Builder {
    /// Scans the tree under `root`. Unreadable sources abort here.
    pub fn new(
        root: &Path,
        settings: BuildSettings,
        kind: Box<dyn ProjectKind>,
    ) -> Result<Self, BuildError> {
        let root = fs::canonicalize(root).map_err(|e| BuildError::io(root, e))?;
        let index = ProjectIndex::scan(&root, kind.as_ref())?;
        Ok(Self::from_index(index, settings, kind))
    }

    pub fn from_index(
        index: ProjectIndex,
        settings: BuildSettings,
        kind: Box<dyn ProjectKind>,
    ) -> Self {
        let layout = ArtifactLayout::new(&settings.cache_dir, &settings.dst_dir);
        Self {
            index,
            kind,
            settings,
            layout,
            executor: Box::new(ProcessExecutor),
        }
    }

    pub fn with_executor(mut self, executor: Box<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn index(&self) -> &ProjectIndex {
        &self.index
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    pub fn kind(&self) -> &dyn ProjectKind {
        self.kind.as_ref()
    }

    pub fn targets(&self) -> Targets<'_> {
        Targets::new(&self.index, self.kind.as_ref())
    }

    /// Rebuilds everything stale.
    pub fn build(&self) -> Result<BuildOutcome, BuildError> {
        let session = BuildSession::new();
        let pass = self.begin(&session)?;
        pass.targets.ensure_unique_names()?;
        let mut outcome = BuildOutcome {
            pch_built: self.build_pch(&pass)?,
            ..Default::default()
        };

        let units: Vec<FileId> = pass
            .targets
            .compiled_units()
            .into_iter()
            .filter(|&id| self.needs_compile(&pass, id))
            .collect();
        outcome.compiled = self.compile_all(&pass, &units)?;

        if self.settings.compile_commands && !self.settings.dry_run {
            self.write_compile_commands(&pass)?;
        }

        // link only after the whole compile phase has finished
        let exes: Vec<FileId> = pass
            .targets
            .executables()
            .into_iter()
            .filter(|&id| self.needs_link(&pass, id))
            .collect();
        if !exes.is_empty() {
            println!("{} Linking {} target(s)...", "🔗".cyan(), exes.len());
        }
        run_par(exes.len(), |i| self.link(&pass, exes[i]))?;
        outcome.linked = exes.len();

        Ok(outcome)
    }

    /// Rebuilds only what the executable named `name` needs.
    pub fn build_target(&self, name: &str) -> Result<BuildOutcome, BuildError> {
        let session = BuildSession::new();
        let pass = self.begin(&session)?;
        let exe = pass.targets.find_executable(name)?;

        let mut outcome = BuildOutcome {
            pch_built: self.build_pch(&pass)?,
            ..Default::default()
        };

        let units: Vec<FileId> = pass
            .targets
            .object_closure(exe)
            .into_iter()
            .filter(|&id| self.needs_compile(&pass, id))
            .collect();
        outcome.compiled = self.compile_all(&pass, &units)?;

        if self.needs_link(&pass, exe) {
            println!("{} Linking {}...", "🔗".cyan(), name.bold());
            self.link(&pass, exe)?;
            outcome.linked = 1;
        }

        Ok(outcome)
    }

    /// One entry per executable, with its current status.
    pub fn summaries(&self) -> Vec<TargetSummary> {
        let session = BuildSession::new();
        let check = StalenessCheck::new(&self.index, &session, self.settings.config_modified);
        let targets = self.targets();

        let mut out = Vec::new();
        for id in targets.executables() {
            let name = targets.target_name(id);
            let exe = self.layout.executable_path(&name);
            let objects = self.object_paths(&targets, id);
            out.push(TargetSummary {
                stale: check.check_executable(&exe, &objects),
                role: targets.role(id).label(),
                entry: self.index.get(id).path.clone(),
                output: Some(exe),
                objects: objects.len(),
                name,
            });
        }
        for id in targets.libraries() {
            out.push(TargetSummary {
                name: targets.target_name(id),
                role: targets.role(id).label(),
                entry: self.index.get(id).path.clone(),
                output: None,
                objects: 0,
                stale: None,
            });
        }
        out
    }

    /// Validates configuration before anything is spawned and sets up the
    /// state of one pass.
    fn begin<'a>(&'a self, session: &'a BuildSession) -> Result<Pass<'a>, BuildError> {
        let targets = self.targets();
        self.validate_templates()?;

        let pch = match targets.precompiled_header()? {
            Some(id) if self.settings.pch_enabled() => {
                Some((id, self.layout.pch_path(&self.index.get(id).path)))
            }
            _ => None,
        };

        if !self.settings.dry_run {
            for dir in [&self.layout.cache_dir, &self.layout.dst_dir] {
                fs::create_dir_all(dir).map_err(|e| BuildError::io(dir, e))?;
            }
        }

        Ok(Pass {
            targets,
            session,
            check: StalenessCheck::new(&self.index, session, self.settings.config_modified),
            pch,
        })
    }

    fn validate_templates(&self) -> Result<(), BuildError> {
        let s = &self.settings;
        fill_template(
            &s.compiler,
            &[("include", ""), ("source", ""), ("output", "")],
            "compiler",
        )?;
        fill_template(
            &s.linker,
            &[("objects", ""), ("output", ""), ("libs", "")],
            "linker",
        )?;

        match (&s.emit_pch, &s.include_pch) {
            (Some(emit), Some(include)) => {
                fill_template(
                    emit,
                    &[("include", ""), ("header", ""), ("output", "")],
                    "emit_pch",
                )?;
                fill_template(include, &[("pch", "")], "include_pch")?;
            }
            (Some(_), None) => {
                return Err(BuildError::Config(
                    "emit_pch is set but include_pch is missing".to_string(),
                ));
            }
            (None, Some(_)) => {
                return Err(BuildError::Config(
                    "include_pch is set but emit_pch is missing".to_string(),
                ));
            }
            (None, None) => {}
        }
        Ok(())
    }

    fn build_pch(&self, pass: &Pass<'_>) -> Result<bool, BuildError> {
        let Some((id, pch_path)) = &pass.pch else {
            return Ok(false);
        };

        if !self.settings.force {
            match pass.check.check(pch_path, *id) {
                None => return Ok(false),
                Some(reason) => self.explain(&self.index.get(*id).path, &reason),
            }
        }

        let header = self.index.get(*id).path.to_string_lossy().to_string();
        let include = render_include_flags(&pass.targets.include_dirs(*id));
        let output = pch_path.to_string_lossy().to_string();
        let emit = self.settings.emit_pch.as_deref().unwrap_or_default();
        let filled = fill_template(
            emit,
            &[
                ("include", include.as_str()),
                ("header", header.as_str()),
                ("output", output.as_str()),
            ],
            "emit_pch",
        )?;

        println!("{} Precompiling header...", "📦".blue());
        self.run(&CommandLine::parse(&filled, "emit_pch")?)?;
        pass.session.mark_rebuilt(pch_path);
        Ok(true)
    }

    fn needs_compile(&self, pass: &Pass<'_>, id: FileId) -> bool {
        if self.settings.force {
            return true;
        }
        let object = self.layout.object_path(&self.index.get(id).path);
        let pch = pass.pch.as_ref().map(|(_, p)| p.as_path());
        match pass.check.check_object(&object, id, pch) {
            Some(reason) => {
                self.explain(&self.index.get(id).path, &reason);
                true
            }
            None => false,
        }
    }

    fn needs_link(&self, pass: &Pass<'_>, exe: FileId) -> bool {
        if self.settings.force {
            return true;
        }
        let output = self.layout.executable_path(&pass.targets.target_name(exe));
        let objects = self.object_paths(&pass.targets, exe);
        match pass.check.check_executable(&output, &objects) {
            Some(reason) => {
                self.explain(&output, &reason);
                true
            }
            None => false,
        }
    }

    fn compile_all(&self, pass: &Pass<'_>, units: &[FileId]) -> Result<usize, BuildError> {
        if units.is_empty() {
            return Ok(0);
        }
        println!("{} Compiling {} file(s)...", "⚙".blue(), units.len());
        run_par(units.len(), |i| self.compile(pass, units[i]))?;
        Ok(units.len())
    }

    fn compile_command(&self, pass: &Pass<'_>, id: FileId) -> Result<CommandLine, BuildError> {
        let path = &self.index.get(id).path;
        let source = path.to_string_lossy().to_string();
        let object = self.layout.object_path(path).to_string_lossy().to_string();
        let include = render_include_flags(&pass.targets.include_dirs(id));

        let mut filled = fill_template(
            &self.settings.compiler,
            &[
                ("include", include.as_str()),
                ("source", source.as_str()),
                ("output", object.as_str()),
            ],
            "compiler",
        )?;

        if let (Some((_, pch_path)), Some(include_pch)) = (&pass.pch, &self.settings.include_pch) {
            let pch = pch_path.to_string_lossy().to_string();
            let opts = fill_template(include_pch, &[("pch", pch.as_str())], "include_pch")?;
            filled.push(' ');
            filled.push_str(&opts);
        }

        CommandLine::parse(&filled, "compiler")
    }

    fn compile(&self, pass: &Pass<'_>, id: FileId) -> Result<(), BuildError> {
        let command = self.compile_command(pass, id)?;
        self.run(&command)?;
        pass.session
            .mark_rebuilt(&self.layout.object_path(&self.index.get(id).path));
        Ok(())
    }

    fn link(&self, pass: &Pass<'_>, exe: FileId) -> Result<(), BuildError> {
        let closure = pass.targets.object_closure(exe);
        let objects: Vec<String> = closure
            .iter()
            .map(|&id| {
                self.layout
                    .object_path(&self.index.get(id).path)
                    .to_string_lossy()
                    .to_string()
            })
            .collect();
        let objects = objects.join(" ");
        let libs = render_lib_flags(&pass.targets.link_libraries(&closure));
        let output = self.layout.executable_path(&pass.targets.target_name(exe));
        let output_str = output.to_string_lossy().to_string();

        let filled = fill_template(
            &self.settings.linker,
            &[
                ("objects", objects.as_str()),
                ("output", output_str.as_str()),
                ("libs", libs.as_str()),
            ],
            "linker",
        )?;

        self.run(&CommandLine::parse(&filled, "linker")?)?;
        pass.session.mark_rebuilt(&output);
        Ok(())
    }

    fn object_paths(&self, targets: &Targets<'_>, exe: FileId) -> Vec<PathBuf> {
        targets
            .object_closure(exe)
            .into_iter()
            .map(|id| self.layout.object_path(&self.index.get(id).path))
            .collect()
    }

    fn write_compile_commands(&self, pass: &Pass<'_>) -> Result<(), BuildError> {
        let root = self.index.root();
        let entries = pass
            .targets
            .compiled_units()
            .into_iter()
            .map(|id| {
                let command = self.compile_command(pass, id)?;
                Ok(CompileEntry::new(root, &self.index.get(id).path, &command))
            })
            .collect::<Result<Vec<_>, BuildError>>()?;
        compdb::write(root, &entries)
    }

    fn run(&self, command: &CommandLine) -> Result<(), BuildError> {
        echo(
            command,
            self.index.root(),
            &self.layout.cache_dir,
            self.settings.dry_run,
        );
        if self.settings.dry_run {
            return Ok(());
        }
        self.executor.execute(command)
    }

    fn explain(&self, subject: &Path, reason: &StaleReason) {
        if self.settings.verbose {
            let shown = subject.strip_prefix(self.index.root()).unwrap_or(subject);
            println!(
                "   {} {} ({})",
                "→".dimmed(),
                shown.display(),
                reason.to_string().dimmed()
            );
        }
    }
}
